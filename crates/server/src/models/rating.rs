use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::resource::ResourceId;

pub type Rating = i16;
pub const MIN_RATING: Rating = 1;
pub const MAX_RATING: Rating = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    pub resource_id: ResourceId,
    pub rating: Rating,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RatingState {
    pub rating: Rating,
    pub avg_rating: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GetRatingResponse {
    pub rating: Option<Rating>,
}

pub fn validate_rating(rating: Rating) -> Result<(), ValidationError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::InvalidInput {
            value: rating.to_string(),
            reason: format!("rating should be between {MIN_RATING} and {MAX_RATING}"),
        });
    }
    Ok(())
}
