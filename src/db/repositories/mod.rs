pub mod diary;
pub mod user;
