use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::entities::diary_entries;

/// Uniform error envelope. Every error response, whatever the status,
/// serializes to exactly this shape.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body for both diary create and update.
#[derive(Debug, Deserialize)]
pub struct DiaryContentRequest {
    pub content: Option<String>,
}

/// Pagination query. Values arrive as raw strings so that junk like
/// `?page=abc` falls back to the default instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenPairDto {
    #[must_use]
    pub const fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccessTokenDto {
    pub access_token: String,
    pub token_type: &'static str,
}

impl AccessTokenDto {
    #[must_use]
    pub const fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiaryDto {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub analyzed_content: Option<String>,
    pub positive_count: i32,
    pub negative_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<diary_entries::Model> for DiaryDto {
    fn from(model: diary_entries::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            content: model.content,
            analyzed_content: model.analyzed_content,
            positive_count: model.positive_count,
            negative_count: model.negative_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiaryListDto {
    pub items: Vec<DiaryDto>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct DiaryStatsDto {
    pub total_entries: usize,
    pub positive_entries: usize,
    pub negative_entries: usize,
    pub neutral_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct VersionDto {
    pub version: &'static str,
    pub api: &'static str,
}
