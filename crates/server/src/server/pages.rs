use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Utc;

use crate::auth::token::Claims;
use crate::database::resource_query::{PopularitySort, ResourceQuery, ResourceSort};
use crate::error::RequestError;
use crate::models::listing::FeedQuery;
use crate::models::user::UserProfile;
use crate::server::constants::LANDING_PAGE_RESOURCES;
use crate::server::extract::ApiQuery;
use crate::server::state::AppState;
use crate::views::feed_card::feed_cards_html;
use crate::views::pages::{home_page, landing_page, login_page, signup_page};

/// Most liked resources, for visitors who are not logged in.
pub fn landing_query() -> ResourceQuery {
    ResourceQuery {
        likes: true,
        comments: true,
        avg_ratings: true,
        users: true,
        sort: ResourceSort {
            popularity: Some(PopularitySort::Most),
            ..Default::default()
        },
        limit: Some(LANDING_PAGE_RESOURCES),
        ..Default::default()
    }
}

pub async fn landing(
    State(state): State<Arc<AppState>>,
    claims: Option<Claims>,
) -> Result<Response, RequestError> {
    if claims.is_some() {
        return Ok(Redirect::to("/home").into_response());
    }
    let page = state.db_connection.get_feed(&landing_query()).await?;
    let cards = feed_cards_html(
        &page.resources,
        |resource| page.comments_of(resource.id),
        Utc::now(),
    );
    Ok(Html(landing_page(&cards)).into_response())
}

pub async fn login_form() -> Html<String> {
    Html(login_page(None))
}

pub async fn signup_form() -> Html<String> {
    Html(signup_page(None))
}

pub async fn home(
    State(state): State<Arc<AppState>>,
    claims: Option<Claims>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Response, RequestError> {
    let Some(claims) = claims else {
        return Ok(Redirect::to("/login").into_response());
    };
    let Some(user) = state.db_connection.get_user_with_id(claims.user_id).await? else {
        return Ok(Redirect::to("/login").into_response());
    };
    let query = query.into_resource_query(Some(user.id))?;
    let page = state.db_connection.get_feed(&query).await?;
    let categories = state.db_connection.get_categories().await?;
    let cards = feed_cards_html(
        &page.resources,
        |resource| page.comments_of(resource.id),
        Utc::now(),
    );
    let user = UserProfile::from(user);
    Ok(Html(home_page(&user, &categories, &cards)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_lists_most_popular_first() {
        let built = landing_query().build();
        assert!(built
            .sql
            .contains("ORDER BY COUNT(DISTINCT likes.user_id) DESC"));
        assert_eq!(
            built.params.first(),
            Some(&crate::database::resource_query::QueryParam::BigInt(
                LANDING_PAGE_RESOURCES
            ))
        );
    }

    #[tokio::test]
    async fn forms_render() {
        assert!(login_form().await.0.contains("Log in"));
        assert!(signup_form().await.0.contains("Sign up"));
    }
}
