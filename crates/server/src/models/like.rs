use serde::{Deserialize, Serialize};

use crate::models::resource::ResourceId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikePayload {
    pub resource_id: ResourceId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct IsLikedResponse {
    pub liked: bool,
}
