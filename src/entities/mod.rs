pub mod prelude;

pub mod diary_entries;
pub mod users;
