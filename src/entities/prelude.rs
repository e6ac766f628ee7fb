pub use super::diary_entries::Entity as DiaryEntries;
pub use super::users::Entity as Users;
