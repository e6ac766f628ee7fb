use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Normalized address (trimmed, lowercased before storage).
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::diary_entries::Entity")]
    DiaryEntries,
}

impl Related<super::diary_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiaryEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
