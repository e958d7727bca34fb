//! Request identity extraction.
//!
//! Session issuance lives upstream; by the time a request reaches this
//! service the gateway has already authenticated it and stamped the caller's
//! identity into `X-User-Id` / `X-Family-Id` headers. Both are required on
//! every versioned route.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use folklore_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const FAMILY_ID_HEADER: &str = "x-family-id";

/// Identity of the submitting family member.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub family_id: Uuid,
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, AppError> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::InvalidInput(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| AppError::InvalidInput(format!("Invalid {} header", name)))?;

    value
        .parse::<Uuid>()
        .map_err(|_| AppError::InvalidInput(format!("{} must be a UUID", name)))
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_uuid(parts, USER_ID_HEADER)?;
        let family_id = header_uuid(parts, FAMILY_ID_HEADER)?;
        Ok(RequestContext { user_id, family_id })
    }
}
