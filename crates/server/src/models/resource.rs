use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::category::CategoryId;
use crate::models::user::UserId;

pub type ResourceId = i32;
const RESOURCE_TITLE_LENGTH_LIMIT: usize = 255;
const RESOURCE_URL_LENGTH_LIMIT: usize = 2048;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Resource {
    pub id: ResourceId,
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail_photo: Option<String>,
    pub created: DateTime<Utc>,
}

/// Row produced by the resource query builder. Optional columns are only
/// selected when the matching option was requested and fall back to their
/// defaults otherwise.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ResourceRow {
    pub id: ResourceId,
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail_photo: Option<String>,
    pub created: DateTime<Utc>,
    #[sqlx(default)]
    pub likes: Option<i64>,
    #[sqlx(default)]
    pub comment_count: Option<i64>,
    #[sqlx(default)]
    pub avg_rating: Option<f64>,
    #[sqlx(default)]
    pub poster: Option<String>,
    #[sqlx(default)]
    pub poster_avatar: Option<String>,
    #[sqlx(default)]
    pub category: Option<String>,
    #[sqlx(default)]
    pub viewer_liked: Option<bool>,
    #[sqlx(default)]
    pub viewer_rating: Option<i16>,
}

#[derive(Clone, Debug)]
pub struct CreateResource {
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail_photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddResourcePayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    pub thumbnail_photo: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddResourceResponse {
    pub resource: Resource,
}

#[derive(Debug, Serialize)]
pub struct DeleteResourceResponse {
    pub deleted: bool,
}

pub fn validate_resource_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidInput {
            value: title.to_string(),
            reason: "resource title cannot be empty".to_string(),
        });
    }
    if title.chars().count() > RESOURCE_TITLE_LENGTH_LIMIT {
        return Err(ValidationError::LimitExceeded {
            subject: "resource title".to_string(),
            unit: "char".to_string(),
            attempted: title.chars().count(),
            limit: RESOURCE_TITLE_LENGTH_LIMIT,
        });
    }
    Ok(())
}

pub fn validate_resource_url(url: &str) -> Result<(), ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::InvalidInput {
            value: url.to_string(),
            reason: "resource link cannot be empty".to_string(),
        });
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidInput {
            value: url.to_string(),
            reason: "resource link should start with http:// or https://".to_string(),
        });
    }
    if url.len() > RESOURCE_URL_LENGTH_LIMIT {
        return Err(ValidationError::LimitExceeded {
            subject: "resource link".to_string(),
            unit: "byte".to_string(),
            attempted: url.len(),
            limit: RESOURCE_URL_LENGTH_LIMIT,
        });
    }
    Ok(())
}

impl AddResourcePayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_resource_title(&self.title)?;
        validate_resource_url(&self.content)?;
        if let Some(thumbnail) = self.thumbnail_photo.as_deref() {
            validate_resource_url(thumbnail)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str, content: &str, thumbnail: Option<&str>) -> AddResourcePayload {
        AddResourcePayload {
            title: title.to_string(),
            description: String::new(),
            content: content.to_string(),
            thumbnail_photo: thumbnail.map(str::to_string),
            category: None,
        }
    }

    #[test]
    fn accepts_well_formed_resource() {
        payload("Rust book", "https://doc.rust-lang.org/book/", None)
            .validate()
            .unwrap();
    }

    #[test]
    fn rejects_blank_title() {
        let err = payload("   ", "https://example.com", None)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_non_http_links() {
        assert!(payload("x", "javascript:alert(1)", None).validate().is_err());
        assert!(payload("x", "https://example.com", Some("ftp://example.com/a.png"))
            .validate()
            .is_err());
    }
}
