use sqlx::{Error as SqlxError, Postgres, Transaction};
use tracing::{info, instrument};

use crate::database::connection::DbConnection;

const DEFAULT_CATEGORIES: [&str; 6] = ["Art", "Tech", "Science", "Music", "Cooking", "Travel"];

impl DbConnection {
    pub async fn init_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        create_all_tables(&mut transaction).await?;
        seed_categories(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }

    pub async fn drop_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        drop_all_tables(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }
}

#[instrument(skip_all)]
pub async fn create_all_tables(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    let statements = [
        "
            CREATE TABLE users (
                id          int PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                name        VARCHAR(255) NOT NULL,
                email       VARCHAR(255) NOT NULL UNIQUE,
                password    VARCHAR(255) NOT NULL,
                avatar      VARCHAR(2048),
                created_at  TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
            );
        ",
        "
            CREATE TABLE categories (
                id      int PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                name    VARCHAR(255) NOT NULL UNIQUE
            );
        ",
        "
            CREATE TABLE resources (
                id               int PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                user_id          int NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category_id      int REFERENCES categories(id) ON DELETE SET NULL,
                title            VARCHAR(255) NOT NULL,
                description      TEXT NOT NULL DEFAULT '',
                content          VARCHAR(2048) NOT NULL,
                thumbnail_photo  VARCHAR(2048),
                created          TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
            );
        ",
        "
            CREATE TABLE comments (
                id           int PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                resource_id  int NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
                user_id      int NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                body         VARCHAR(4096) NOT NULL,
                created      TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
            );
        ",
        "
            CREATE TABLE likes (
                resource_id  int NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
                user_id      int NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                CONSTRAINT likes_pkey PRIMARY KEY (resource_id, user_id)
            );
        ",
        "
            CREATE TABLE ratings (
                resource_id  int NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
                user_id      int NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                rating       SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
                CONSTRAINT ratings_pkey PRIMARY KEY (resource_id, user_id)
            );
        ",
        "
            CREATE TABLE sessions (
                id          uuid PRIMARY KEY,
                user_id     int NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash  BYTEA NOT NULL,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
                expires_at  TIMESTAMPTZ NOT NULL
            );
        ",
        "CREATE INDEX resources_user_id_idx ON resources (user_id);",
        "CREATE INDEX comments_resource_id_idx ON comments (resource_id);",
        "CREATE INDEX likes_user_id_idx ON likes (user_id);",
        "CREATE INDEX ratings_user_id_idx ON ratings (user_id);",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_tables(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TABLE IF EXISTS sessions;",
        "DROP TABLE IF EXISTS ratings;",
        "DROP TABLE IF EXISTS likes;",
        "DROP TABLE IF EXISTS comments;",
        "DROP TABLE IF EXISTS resources;",
        "DROP TABLE IF EXISTS categories;",
        "DROP TABLE IF EXISTS users;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn seed_categories(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    for name in DEFAULT_CATEGORIES {
        sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING;")
            .bind(name)
            .execute(transaction.as_mut())
            .await?;
    }
    info!("seeded {} default categories", DEFAULT_CATEGORIES.len());
    Ok(())
}
