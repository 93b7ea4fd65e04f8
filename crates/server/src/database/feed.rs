use std::collections::HashMap;

use tracing::{info, instrument};

use crate::database::commands::{
    create_category, create_comment, create_resource, delete_like, delete_resource, insert_like,
    upsert_rating,
};
use crate::database::connection::DbConnection;
use crate::database::queries::{count_likes, get_category_with_name, resource_exists};
use crate::database::resource_query::ResourceQuery;
use crate::database::utils::{is_foreign_key_violation, is_unique_violation};
use crate::error::{RequestError, ValidationError};
use crate::models::category::Category;
use crate::models::comment::{validate_comment_body, CommentId, CommentView, CreateComment};
use crate::models::like::LikeState;
use crate::models::rating::{validate_rating, Rating, RatingState};
use crate::models::resource::{AddResourcePayload, CreateResource, Resource, ResourceId, ResourceRow};
use crate::models::user::UserId;

/// A page of resources together with the comments shown under each card.
#[derive(Clone, Debug, Default)]
pub struct FeedPage {
    pub resources: Vec<ResourceRow>,
    pub comments: HashMap<ResourceId, Vec<CommentView>>,
}

impl FeedPage {
    pub fn comments_of(&self, resource_id: ResourceId) -> &[CommentView] {
        self.comments
            .get(&resource_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn not_found_on_missing_resource(e: sqlx::Error) -> RequestError {
    if is_foreign_key_violation(&e) {
        ValidationError::NotFound.into()
    } else {
        e.into()
    }
}

impl DbConnection {
    pub async fn get_feed(&self, query: &ResourceQuery) -> Result<FeedPage, RequestError> {
        let resources = self.get_resources(query).await?;
        let ids: Vec<ResourceId> = resources.iter().map(|r| r.id).collect();
        let comments = self.list_comments_for(&ids).await?;
        Ok(FeedPage {
            resources,
            comments,
        })
    }

    /// Single feed card as seen by `viewer`.
    pub async fn get_resource_card(
        &self,
        resource_id: ResourceId,
        viewer: Option<UserId>,
    ) -> Result<ResourceRow, RequestError> {
        let query = ResourceQuery {
            likes: true,
            comments: true,
            avg_ratings: true,
            users: true,
            viewer,
            resource_id: Some(resource_id),
            limit: Some(1),
            ..Default::default()
        };
        self.get_resources(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ValidationError::NotFound.into())
    }

    /// Looks a category up by name (case-insensitive) and creates it when missing.
    #[instrument(skip(self))]
    pub async fn get_or_add_category(&self, name: &str) -> Result<Category, RequestError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidInput {
                value: name.to_string(),
                reason: "category name cannot be empty".to_string(),
            }
            .into());
        }
        if let Some(category) = self.get_category_with_name(name).await? {
            return Ok(category);
        }
        match create_category(self.pool(), name).await {
            Ok(category) => {
                info!("created category {:?}", category.name);
                Ok(category)
            }
            Err(e) if is_unique_violation(&e) => {
                Ok(get_category_with_name(self.pool(), name).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn add_resource(
        &self,
        user_id: UserId,
        payload: &AddResourcePayload,
    ) -> Result<Resource, RequestError> {
        payload.validate()?;
        let category_id = match payload.category.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(self.get_or_add_category(name).await?.id),
            _ => None,
        };
        let resource = CreateResource {
            user_id,
            category_id,
            title: payload.title.trim().to_string(),
            description: payload.description.trim().to_string(),
            content: payload.content.trim().to_string(),
            thumbnail_photo: payload
                .thumbnail_photo
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        };
        Ok(create_resource(self.pool(), &resource).await?)
    }

    /// Only the poster may delete a resource.
    pub async fn remove_resource(
        &self,
        resource_id: ResourceId,
        user_id: UserId,
    ) -> Result<(), RequestError> {
        if delete_resource(self.pool(), resource_id, user_id).await? {
            return Ok(());
        }
        if resource_exists(self.pool(), resource_id).await? {
            Err(RequestError::Forbidden)
        } else {
            Err(ValidationError::NotFound.into())
        }
    }

    pub async fn add_comment(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        body: &str,
    ) -> Result<CommentId, RequestError> {
        validate_comment_body(body)?;
        let comment = CreateComment {
            resource_id,
            user_id,
            body: body.trim().to_string(),
        };
        create_comment(self.pool(), &comment)
            .await
            .map_err(not_found_on_missing_resource)
    }

    /// Likes the resource, or takes the like back when already liked.
    #[instrument(skip(self))]
    pub async fn toggle_like(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
    ) -> Result<LikeState, RequestError> {
        let mut transaction = self.pool().begin().await?;
        let liked = if delete_like(&mut *transaction, resource_id, user_id).await? {
            false
        } else {
            insert_like(&mut *transaction, resource_id, user_id)
                .await
                .map_err(not_found_on_missing_resource)?;
            true
        };
        let likes = count_likes(&mut *transaction, resource_id).await?;
        transaction.commit().await?;
        Ok(LikeState { liked, likes })
    }

    #[instrument(skip(self))]
    pub async fn rate_resource(
        &self,
        user_id: UserId,
        resource_id: ResourceId,
        rating: Rating,
    ) -> Result<RatingState, RequestError> {
        validate_rating(rating)?;
        upsert_rating(self.pool(), resource_id, user_id, rating)
            .await
            .map_err(not_found_on_missing_resource)
    }

    pub async fn resource_exists(&self, resource_id: ResourceId) -> Result<bool, RequestError> {
        Ok(resource_exists(self.pool(), resource_id).await?)
    }
}
