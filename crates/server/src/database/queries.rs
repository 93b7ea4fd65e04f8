use std::collections::HashMap;

use futures::TryStreamExt;
use sqlx::{Error as SqlxError, PgExecutor};
use tracing::{debug, instrument};

use crate::database::connection::DbConnection;
use crate::database::resource_query::{QueryParam, ResourceQuery};
use crate::database::utils::map_not_found_as_none;
use crate::models::category::Category;
use crate::models::comment::CommentView;
use crate::models::rating::Rating;
use crate::models::resource::{ResourceId, ResourceRow};
use crate::models::session::{ResolveSessionResponse, SessionId};
use crate::models::user::{User, UserId};

impl DbConnection {
    pub async fn get_user_with_id(&self, user_id: UserId) -> Result<Option<User>, SqlxError> {
        map_not_found_as_none(get_user_with_id(self.pool(), user_id).await)
    }

    pub async fn get_resources(&self, query: &ResourceQuery) -> Result<Vec<ResourceRow>, SqlxError> {
        get_resources(self.pool(), query).await
    }

    pub async fn get_categories(&self) -> Result<Vec<Category>, SqlxError> {
        get_categories(self.pool()).await
    }

    pub async fn get_category_with_name(&self, name: &str) -> Result<Option<Category>, SqlxError> {
        map_not_found_as_none(get_category_with_name(self.pool(), name).await)
    }

    pub async fn list_comments(
        &self,
        resource_id: ResourceId,
    ) -> Result<Vec<CommentView>, SqlxError> {
        list_comments(self.pool(), resource_id).await
    }

    /// Comments for a page of resources, keyed by resource.
    pub async fn list_comments_for(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<HashMap<ResourceId, Vec<CommentView>>, SqlxError> {
        if resource_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut grouped: HashMap<ResourceId, Vec<CommentView>> = HashMap::new();
        for comment in list_comments_for_resources(self.pool(), resource_ids).await? {
            grouped.entry(comment.resource_id).or_default().push(comment);
        }
        Ok(grouped)
    }

    pub async fn is_liked(&self, resource_id: ResourceId, user_id: UserId) -> Result<bool, SqlxError> {
        is_liked(self.pool(), resource_id, user_id).await
    }

    pub async fn get_rating(
        &self,
        resource_id: ResourceId,
        user_id: UserId,
    ) -> Result<Option<Rating>, SqlxError> {
        map_not_found_as_none(get_rating(self.pool(), resource_id, user_id).await)
    }
}

#[instrument(skip(executor))]
pub async fn get_user_with_email<'a, E: PgExecutor<'a>>(
    executor: E,
    email: &str,
) -> Result<User, SqlxError> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1;")
        .bind(email)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_user_with_id<'a, E: PgExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<User, SqlxError> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1;")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_user_password<'a, E: PgExecutor<'a>>(
    executor: E,
    user_id: UserId,
) -> Result<String, SqlxError> {
    sqlx::query_scalar("SELECT password FROM users WHERE id = $1;")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_resources<'a, E: PgExecutor<'a>>(
    executor: E,
    query: &ResourceQuery,
) -> Result<Vec<ResourceRow>, SqlxError> {
    let built = query.build();
    debug!(sql = %built.sql, params = built.params.len(), "built resource query");
    let mut statement = sqlx::query_as::<_, ResourceRow>(&built.sql);
    for param in built.params {
        statement = match param {
            QueryParam::Id(id) => statement.bind(id),
            QueryParam::BigInt(value) => statement.bind(value),
            QueryParam::Text(text) => statement.bind(text),
        };
    }
    statement.fetch(executor).try_collect().await
}

#[instrument(skip(executor))]
pub async fn get_categories<'a, E: PgExecutor<'a>>(executor: E) -> Result<Vec<Category>, SqlxError> {
    sqlx::query_as("SELECT * FROM categories ORDER BY name;")
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_category_with_name<'a, E: PgExecutor<'a>>(
    executor: E,
    name: &str,
) -> Result<Category, SqlxError> {
    sqlx::query_as("SELECT * FROM categories WHERE lower(name) = lower($1);")
        .bind(name)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn list_comments<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<Vec<CommentView>, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        comments.id AS id, comments.resource_id AS resource_id, comments.user_id AS user_id,
        comments.body AS body, comments.created AS created,
        users.name AS name, users.avatar AS avatar
    FROM
        comments JOIN users ON comments.user_id = users.id
    WHERE
        comments.resource_id = $1
    ORDER BY
        comments.created, comments.id;
    ",
    )
    .bind(resource_id)
    .fetch_all(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn list_comments_for_resources<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_ids: &[ResourceId],
) -> Result<Vec<CommentView>, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        comments.id AS id, comments.resource_id AS resource_id, comments.user_id AS user_id,
        comments.body AS body, comments.created AS created,
        users.name AS name, users.avatar AS avatar
    FROM
        comments JOIN users ON comments.user_id = users.id
    WHERE
        comments.resource_id = ANY($1)
    ORDER BY
        comments.created, comments.id;
    ",
    )
    .bind(resource_ids)
    .fetch_all(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn count_likes<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<i64, SqlxError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE resource_id = $1;")
        .bind(resource_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn is_liked<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
    user_id: UserId,
) -> Result<bool, SqlxError> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM likes WHERE resource_id = $1 AND user_id = $2);",
    )
    .bind(resource_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_rating<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
    user_id: UserId,
) -> Result<Rating, SqlxError> {
    sqlx::query_scalar("SELECT rating FROM ratings WHERE resource_id = $1 AND user_id = $2;")
        .bind(resource_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn resource_exists<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<bool, SqlxError> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM resources WHERE id = $1);")
        .bind(resource_id)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn get_session<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
) -> Result<ResolveSessionResponse, SqlxError> {
    sqlx::query_as("SELECT user_id, token_hash, expires_at FROM sessions WHERE id = $1;")
        .bind(session_id)
        .fetch_one(executor)
        .await
}
