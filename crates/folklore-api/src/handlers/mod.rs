pub mod diary;
pub mod health;
pub mod responses;
