use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::resource::ResourceId;
use crate::models::user::UserId;

pub type CommentId = i32;
const COMMENT_BODY_LENGTH_LIMIT: usize = 4096;

#[derive(Clone, Debug)]
pub struct CreateComment {
    pub resource_id: ResourceId,
    pub user_id: UserId,
    pub body: String,
}

/// Comment joined with its author, as shown under a feed card.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: CommentId,
    pub resource_id: ResourceId,
    pub user_id: UserId,
    pub body: String,
    pub created: DateTime<Utc>,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentPayload {
    pub resource_id: ResourceId,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentResponse {
    pub new_comment_id: CommentId,
}

pub fn validate_comment_body(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::InvalidInput {
            value: body.to_string(),
            reason: "comment cannot be empty".to_string(),
        });
    }
    if body.len() > COMMENT_BODY_LENGTH_LIMIT {
        return Err(ValidationError::LimitExceeded {
            subject: "comment".to_string(),
            unit: "byte".to_string(),
            attempted: body.len(),
            limit: COMMENT_BODY_LENGTH_LIMIT,
        });
    }
    Ok(())
}
