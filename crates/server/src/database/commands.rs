use chrono::{DateTime, Utc};
use sqlx::{Error as SqlxError, PgExecutor};
use tracing::{info, instrument};

use crate::models::category::Category;
use crate::models::comment::{CommentId, CreateComment};
use crate::models::rating::{Rating, RatingState};
use crate::models::resource::{CreateResource, Resource, ResourceId};
use crate::models::session::SessionId;
use crate::models::user::{CreateUser, UpdateUser, UpdateUserWithCreds, User, UserId};

#[instrument(skip_all)]
pub async fn create_user<'a, E: PgExecutor<'a>>(
    executor: E,
    user: &CreateUser,
) -> Result<User, SqlxError> {
    let result: User = sqlx::query_as(
        "
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3) RETURNING *;
        ",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .fetch_one(executor)
    .await?;
    info!("created user with id: {}", result.id);
    Ok(result)
}

#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn update_user<'a, E: PgExecutor<'a>>(
    executor: E,
    user: &UpdateUser,
) -> Result<User, SqlxError> {
    sqlx::query_as(
        "
            UPDATE users
            SET name = $1, avatar = $2
            WHERE id = $3 RETURNING *;
        ",
    )
    .bind(&user.name)
    .bind(user.avatar.as_ref())
    .bind(user.user_id)
    .fetch_one(executor)
    .await
}

#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn update_user_with_creds<'a, E: PgExecutor<'a>>(
    executor: E,
    user: &UpdateUserWithCreds,
) -> Result<User, SqlxError> {
    sqlx::query_as(
        "
            UPDATE users
            SET email = $1, password = $2, name = $3, avatar = $4
            WHERE id = $5 RETURNING *;
        ",
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(user.avatar.as_ref())
    .bind(user.user_id)
    .fetch_one(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn delete_user<'a, E: PgExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<bool, SqlxError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1;")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[instrument(skip_all, fields(user_id = resource.user_id))]
pub async fn create_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    resource: &CreateResource,
) -> Result<Resource, SqlxError> {
    let result: Resource = sqlx::query_as(
        "
            INSERT INTO resources (user_id, category_id, title, description, content, thumbnail_photo)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *;
        ",
    )
    .bind(resource.user_id)
    .bind(resource.category_id)
    .bind(&resource.title)
    .bind(&resource.description)
    .bind(&resource.content)
    .bind(resource.thumbnail_photo.as_ref())
    .fetch_one(executor)
    .await?;
    info!("created resource with id: {}", result.id);
    Ok(result)
}

/// Only deletes when `user_id` posted the resource.
#[instrument(skip(executor))]
pub async fn delete_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
    user_id: UserId,
) -> Result<bool, SqlxError> {
    let result = sqlx::query("DELETE FROM resources WHERE id = $1 AND user_id = $2;")
        .bind(resource_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[instrument(skip(executor))]
pub async fn create_category<'a, E: PgExecutor<'a>>(
    executor: E,
    name: &str,
) -> Result<Category, SqlxError> {
    sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING *;")
        .bind(name)
        .fetch_one(executor)
        .await
}

#[instrument(skip_all, fields(resource_id = comment.resource_id, user_id = comment.user_id))]
pub async fn create_comment<'a, E: PgExecutor<'a>>(
    executor: E,
    comment: &CreateComment,
) -> Result<CommentId, SqlxError> {
    sqlx::query_scalar(
        "
            INSERT INTO comments (resource_id, user_id, body)
            VALUES ($1, $2, $3) RETURNING id;
        ",
    )
    .bind(comment.resource_id)
    .bind(comment.user_id)
    .bind(&comment.body)
    .fetch_one(executor)
    .await
}

/// Returns `false` when the like already existed.
#[instrument(skip(executor))]
pub async fn insert_like<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
    user_id: UserId,
) -> Result<bool, SqlxError> {
    let result = sqlx::query(
        "INSERT INTO likes (resource_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING;",
    )
    .bind(resource_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns `false` when there was nothing to remove.
#[instrument(skip(executor))]
pub async fn delete_like<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
    user_id: UserId,
) -> Result<bool, SqlxError> {
    let result = sqlx::query("DELETE FROM likes WHERE resource_id = $1 AND user_id = $2;")
        .bind(resource_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[instrument(skip(executor))]
pub async fn upsert_rating<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
    user_id: UserId,
    rating: Rating,
) -> Result<RatingState, SqlxError> {
    sqlx::query_as(
        "
    WITH upserted AS (
        INSERT INTO ratings (resource_id, user_id, rating)
        VALUES ($1, $2, $3)
        ON CONFLICT (resource_id, user_id) DO UPDATE SET rating = EXCLUDED.rating
        RETURNING resource_id, user_id, rating
    )
    SELECT
        upserted.rating AS rating,
        (
            SELECT AVG(r.rating)::float8 FROM (
                SELECT rating FROM ratings WHERE resource_id = $1 AND user_id <> $2
                UNION ALL
                SELECT rating FROM upserted
            ) AS r
        ) AS avg_rating
    FROM
        upserted;
    ",
    )
    .bind(resource_id)
    .bind(user_id)
    .bind(rating)
    .fetch_one(executor)
    .await
}

#[instrument(skip(executor, token_hash))]
pub async fn create_session<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
    user_id: UserId,
    token_hash: &[u8],
    expires_at: DateTime<Utc>,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            INSERT INTO sessions (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4);
        ",
    )
    .bind(session_id)
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[instrument(skip(executor))]
pub async fn delete_session<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
) -> Result<(), SqlxError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1;")
        .bind(session_id)
        .execute(executor)
        .await?;
    Ok(())
}

#[instrument(skip(executor))]
pub async fn delete_user_sessions<'a, E: PgExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1;")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[instrument(skip(executor))]
pub async fn delete_expired_sessions<'a, E: PgExecutor<'a>>(executor: E) -> Result<u64, SqlxError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= current_timestamp;")
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
