use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use chrono::Utc;

use crate::auth::token::Claims;
use crate::error::{RequestError, ValidationError};
use crate::models::category::Category;
use crate::models::comment::{NewCommentPayload, NewCommentResponse};
use crate::models::like::{IsLikedResponse, LikePayload, LikeState};
use crate::models::listing::FeedQuery;
use crate::models::rating::{GetRatingResponse, RatingPayload, RatingState};
use crate::models::resource::{
    AddResourcePayload, AddResourceResponse, DeleteResourceResponse, ResourceId, ResourceRow,
};
use crate::models::user::UserId;
use crate::server::extract::{ApiPath, ApiQuery, Payload};
use crate::server::state::AppState;
use crate::views::comments::comments_html;
use crate::views::feed_card::{feed_card_html, feed_cards_html};

fn viewer_of(claims: &Option<Claims>) -> Option<UserId> {
    claims.as_ref().map(|claims| claims.user_id)
}

pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    claims: Option<Claims>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Json<Vec<ResourceRow>>, RequestError> {
    let query = query.into_resource_query(viewer_of(&claims))?;
    Ok(Json(state.db_connection.get_resources(&query).await?))
}

/// Feed cards for infinite scrolling and filter changes.
pub async fn feed_fragment(
    State(state): State<Arc<AppState>>,
    claims: Option<Claims>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Html<String>, RequestError> {
    let query = query.into_resource_query(viewer_of(&claims))?;
    let page = state.db_connection.get_feed(&query).await?;
    Ok(Html(feed_cards_html(
        &page.resources,
        |resource| page.comments_of(resource.id),
        Utc::now(),
    )))
}

pub async fn card_fragment(
    State(state): State<Arc<AppState>>,
    claims: Option<Claims>,
    ApiPath(resource_id): ApiPath<ResourceId>,
) -> Result<Html<String>, RequestError> {
    let resource = state
        .db_connection
        .get_resource_card(resource_id, viewer_of(&claims))
        .await?;
    let comments = state.db_connection.list_comments(resource_id).await?;
    Ok(Html(feed_card_html(&resource, &comments, Utc::now())))
}

pub async fn add_resource(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Payload(payload, _): Payload<AddResourcePayload>,
) -> Result<(StatusCode, Json<AddResourceResponse>), RequestError> {
    let resource = state
        .db_connection
        .add_resource(claims.user_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(AddResourceResponse { resource })))
}

pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    ApiPath(resource_id): ApiPath<ResourceId>,
) -> Result<Json<DeleteResourceResponse>, RequestError> {
    state
        .db_connection
        .remove_resource(resource_id, claims.user_id)
        .await?;
    Ok(Json(DeleteResourceResponse { deleted: true }))
}

pub async fn comments_fragment(
    State(state): State<Arc<AppState>>,
    ApiPath(resource_id): ApiPath<ResourceId>,
) -> Result<Html<String>, RequestError> {
    if !state.db_connection.resource_exists(resource_id).await? {
        return Err(ValidationError::NotFound.into());
    }
    let comments = state.db_connection.list_comments(resource_id).await?;
    Ok(Html(comments_html(&comments, Utc::now())))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Payload(payload, _): Payload<NewCommentPayload>,
) -> Result<(StatusCode, Json<NewCommentResponse>), RequestError> {
    let new_comment_id = state
        .db_connection
        .add_comment(claims.user_id, payload.resource_id, &payload.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(NewCommentResponse { new_comment_id }),
    ))
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Payload(payload, _): Payload<LikePayload>,
) -> Result<Json<LikeState>, RequestError> {
    Ok(Json(
        state
            .db_connection
            .toggle_like(claims.user_id, payload.resource_id)
            .await?,
    ))
}

pub async fn is_liked(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    ApiPath(resource_id): ApiPath<ResourceId>,
) -> Result<Json<IsLikedResponse>, RequestError> {
    let liked = state
        .db_connection
        .is_liked(resource_id, claims.user_id)
        .await?;
    Ok(Json(IsLikedResponse { liked }))
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Payload(payload, _): Payload<RatingPayload>,
) -> Result<Json<RatingState>, RequestError> {
    Ok(Json(
        state
            .db_connection
            .rate_resource(claims.user_id, payload.resource_id, payload.rating)
            .await?,
    ))
}

pub async fn get_rating(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    ApiPath(resource_id): ApiPath<ResourceId>,
) -> Result<Json<GetRatingResponse>, RequestError> {
    let rating = state
        .db_connection
        .get_rating(resource_id, claims.user_id)
        .await?;
    Ok(Json(GetRatingResponse { rating }))
}

pub async fn categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, RequestError> {
    Ok(Json(state.db_connection.get_categories().await?))
}
