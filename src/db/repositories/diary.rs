use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::diary_entries;

pub struct DiaryRepository {
    conn: DatabaseConnection,
}

impl DiaryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        content: &str,
        analyzed_content: Option<String>,
        positive_count: i32,
        negative_count: i32,
    ) -> Result<diary_entries::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = diary_entries::ActiveModel {
            user_id: Set(user_id),
            content: Set(content.to_string()),
            analyzed_content: Set(analyzed_content),
            positive_count: Set(positive_count),
            negative_count: Set(negative_count),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert diary entry")?;

        Ok(model)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<diary_entries::Model>> {
        diary_entries::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query diary entry by ID")
    }

    /// List a user's entries newest-first, one page at a time.
    /// Returns the page of entries plus total item and page counts.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<diary_entries::Model>, u64, u64)> {
        let paginator = diary_entries::Entity::find()
            .filter(diary_entries::Column::UserId.eq(user_id))
            .order_by_desc(diary_entries::Column::CreatedAt)
            .paginate(&self.conn, per_page);

        let totals = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count diary entries")?;

        let entries = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch diary entry page")?;

        Ok((entries, totals.number_of_items, totals.number_of_pages))
    }

    pub async fn update(
        &self,
        model: diary_entries::Model,
        content: &str,
        analyzed_content: Option<String>,
        positive_count: i32,
        negative_count: i32,
    ) -> Result<diary_entries::Model> {
        let mut active = model.into_active_model();
        active.content = Set(content.to_string());
        active.analyzed_content = Set(analyzed_content);
        active.positive_count = Set(positive_count);
        active.negative_count = Set(negative_count);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update diary entry")?;

        Ok(updated)
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = diary_entries::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete diary entry")?;

        Ok(result.rows_affected > 0)
    }

    /// Fetch just the sentiment tallies for a user's entries. The
    /// classification into positive/negative/neutral happens in one place
    /// upstream so the tie rule cannot drift.
    pub async fn sentiment_counts_for_user(&self, user_id: i32) -> Result<Vec<(i32, i32)>> {
        diary_entries::Entity::find()
            .filter(diary_entries::Column::UserId.eq(user_id))
            .select_only()
            .column(diary_entries::Column::PositiveCount)
            .column(diary_entries::Column::NegativeCount)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query sentiment counts")
    }
}
