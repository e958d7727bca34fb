//! Database repositories for the data access layer
//!
//! Each repository owns a single aggregate (responses, diary uploads with
//! their pages, stories) and exposes the conditional status transitions the
//! pipeline relies on. No repository exposes an unguarded status write.

pub mod diary;
pub mod responses;
pub mod stories;

pub use diary::DiaryRepository;
pub use responses::ResponseRepository;
pub use stories::StoryRepository;
