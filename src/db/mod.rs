use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::diary_entries;

pub mod migrator;
pub mod repositories;
pub mod seed;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        let in_memory = path_str == ":memory:";

        if !in_memory {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // A pooled in-memory SQLite gives every connection its own empty
        // schema, so the pool must stay at a single connection.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn diary_repo(&self) -> repositories::diary::DiaryRepository {
        repositories::diary::DiaryRepository::new(self.conn.clone())
    }

    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        self.user_repo().create(email, password_hash).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn remove_user(&self, id: i32) -> Result<bool> {
        self.user_repo().remove_with_entries(id).await
    }

    pub async fn create_diary_entry(
        &self,
        user_id: i32,
        content: &str,
        analyzed_content: Option<String>,
        positive_count: i32,
        negative_count: i32,
    ) -> Result<diary_entries::Model> {
        self.diary_repo()
            .create(
                user_id,
                content,
                analyzed_content,
                positive_count,
                negative_count,
            )
            .await
    }

    pub async fn get_diary_entry(&self, id: i32) -> Result<Option<diary_entries::Model>> {
        self.diary_repo().get_by_id(id).await
    }

    pub async fn list_diary_entries(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<diary_entries::Model>, u64, u64)> {
        self.diary_repo()
            .list_for_user(user_id, page, per_page)
            .await
    }

    pub async fn update_diary_entry(
        &self,
        model: diary_entries::Model,
        content: &str,
        analyzed_content: Option<String>,
        positive_count: i32,
        negative_count: i32,
    ) -> Result<diary_entries::Model> {
        self.diary_repo()
            .update(
                model,
                content,
                analyzed_content,
                positive_count,
                negative_count,
            )
            .await
    }

    pub async fn remove_diary_entry(&self, id: i32) -> Result<bool> {
        self.diary_repo().remove(id).await
    }

    pub async fn diary_sentiment_counts(&self, user_id: i32) -> Result<Vec<(i32, i32)>> {
        self.diary_repo().sentiment_counts_for_user(user_id).await
    }
}
