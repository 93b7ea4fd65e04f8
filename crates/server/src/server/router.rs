use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::server::state::AppState;
use crate::server::{pages, resources, users};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::landing).post(users::signup))
        .route(
            "/login",
            get(pages::login_form).put(users::login).post(users::login),
        )
        .route("/signup", get(pages::signup_form))
        .route("/logout", put(users::logout).post(users::logout_form))
        .route("/home", get(pages::home))
        .route(
            "/users/me",
            get(users::profile)
                .put(users::update_profile)
                .delete(users::delete_account),
        )
        .route("/users/me/credentials", put(users::update_credentials))
        .route("/feed", get(resources::feed_fragment))
        .route("/feed/:resource_id", get(resources::card_fragment))
        .route(
            "/resources",
            get(resources::list_resources).post(resources::add_resource),
        )
        .route(
            "/resources/:resource_id",
            axum::routing::delete(resources::delete_resource),
        )
        .route(
            "/resources/:resource_id/comments",
            get(resources::comments_fragment),
        )
        .route("/comment", post(resources::add_comment))
        .route("/like", post(resources::toggle_like))
        .route("/like/:resource_id", get(resources::is_liked))
        .route("/rating", put(resources::rate))
        .route("/rating/:resource_id", get(resources::get_rating))
        .route("/categories", get(resources::categories))
        .fallback_service(ServeDir::new(&state.config.server.public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.server.address.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("starting server on: {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
