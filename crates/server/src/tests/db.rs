use chrono::Duration;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use crate::database::connection::{DbConfig, DbConnection};
use crate::database::feed::FeedPage;
use crate::error::{RequestError, SessionError, ValidationError};
use crate::models::listing::FeedQuery;
use crate::models::resource::{AddResourcePayload, ResourceId, ResourceRow};
use crate::models::user::{SignupPayload, UpdateCredentialsPayload, UserId};

/// Tests share one database, keep them from breaking each other's state
static SERIAL_LOCK: Lazy<Mutex<()>> = Lazy::new(Mutex::default);

async fn init_and_get_db() -> DbConnection {
    let _ = tracing_subscriber::fmt::try_init();

    let config = DbConfig::development("wall_db", "wall_guest", "wallpass");
    let db = DbConnection::connect(&config).await.unwrap();
    db.drop_schema().await.unwrap();
    db.init_schema().await.unwrap();
    db
}

async fn signup(db: &DbConnection, name: &str) -> UserId {
    db.signup(&SignupPayload {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: "wonderland".to_string(),
    })
    .await
    .unwrap()
    .id
}

async fn post(db: &DbConnection, user_id: UserId, title: &str, category: &str) -> ResourceId {
    db.add_resource(
        user_id,
        &AddResourcePayload {
            title: title.to_string(),
            description: format!("all about {title}"),
            content: format!("https://example.com/{}", title.to_lowercase()),
            thumbnail_photo: None,
            category: Some(category.to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

async fn feed(db: &DbConnection, query: FeedQuery, viewer: Option<UserId>) -> FeedPage {
    let query = query.into_resource_query(viewer).unwrap();
    db.get_feed(&query).await.unwrap()
}

fn titles(resources: &[ResourceRow]) -> Vec<&str> {
    resources.iter().map(|r| r.title.as_str()).collect()
}

#[tokio::test]
#[ignore = "requires a local postgres instance"]
async fn signup_login_and_sessions() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let alice = signup(&db, "Alice").await;

    let duplicate = db
        .signup(&SignupPayload {
            name: "Other Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "wonderland".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        duplicate,
        RequestError::Validation(ValidationError::EmailTaken)
    ));

    let wrong = db.login("alice@example.com", "rabbit-hole").await.unwrap_err();
    assert!(matches!(wrong, RequestError::BadCredentials));
    let unknown = db.login("bob@example.com", "wonderland").await.unwrap_err();
    assert!(matches!(unknown, RequestError::BadCredentials));

    let user = db.login(" alice@example.com ", "wonderland").await.unwrap();
    assert_eq!(user.id, alice);
    assert_ne!(user.password, "wonderland");

    let session = db.start_session(alice, Duration::hours(1)).await.unwrap();
    assert_eq!(
        db.resolve_session(&session.session_id, &session.token)
            .await
            .unwrap(),
        alice
    );
    assert_eq!(
        db.resolve_session(&session.session_id, &[0; 32])
            .await
            .unwrap_err(),
        SessionError::TokenNotFound
    );

    let expired = db.start_session(alice, Duration::seconds(-1)).await.unwrap();
    assert!(db
        .resolve_session(&expired.session_id, &expired.token)
        .await
        .is_err());

    db.end_session(&session.session_id).await.unwrap();
    assert_eq!(
        db.resolve_session(&session.session_id, &session.token)
            .await
            .unwrap_err(),
        SessionError::TokenNotFound
    );
}

#[tokio::test]
#[ignore = "requires a local postgres instance"]
async fn password_change_ends_sessions() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let alice = signup(&db, "Alice").await;
    signup(&db, "Bob").await;
    let session = db.start_session(alice, Duration::hours(1)).await.unwrap();

    let err = db
        .update_credentials(
            alice,
            &UpdateCredentialsPayload {
                current_password: "not-my-password".to_string(),
                email: None,
                password: Some("looking-glass".to_string()),
                name: None,
                avatar: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::PasswordMismatch));

    let taken = db
        .update_credentials(
            alice,
            &UpdateCredentialsPayload {
                current_password: "wonderland".to_string(),
                email: Some("bob@example.com".to_string()),
                password: None,
                name: None,
                avatar: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        taken,
        RequestError::Validation(ValidationError::EmailTaken)
    ));

    let user = db
        .update_credentials(
            alice,
            &UpdateCredentialsPayload {
                current_password: "wonderland".to_string(),
                email: None,
                password: Some("looking-glass".to_string()),
                name: Some("Alice L.".to_string()),
                avatar: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(user.name, "Alice L.");
    assert_eq!(user.email, "alice@example.com");

    assert_eq!(
        db.resolve_session(&session.session_id, &session.token)
            .await
            .unwrap_err(),
        SessionError::TokenNotFound
    );
    assert!(db.login("alice@example.com", "wonderland").await.is_err());
    assert_eq!(
        db.login("alice@example.com", "looking-glass")
            .await
            .unwrap()
            .id,
        alice
    );
}

#[tokio::test]
#[ignore = "requires a local postgres instance"]
async fn likes_ratings_and_comments() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let alice = signup(&db, "Alice").await;
    let bob = signup(&db, "Bob").await;
    let book = post(&db, alice, "Book", "Tech").await;

    let state = db.toggle_like(bob, book).await.unwrap();
    assert!(state.liked);
    assert_eq!(state.likes, 1);
    assert!(db.is_liked(book, bob).await.unwrap());
    let state = db.toggle_like(alice, book).await.unwrap();
    assert_eq!(state.likes, 2);
    let state = db.toggle_like(bob, book).await.unwrap();
    assert!(!state.liked);
    assert_eq!(state.likes, 1);
    assert!(!db.is_liked(book, bob).await.unwrap());

    let missing = db.toggle_like(bob, 999).await.unwrap_err();
    assert!(matches!(
        missing,
        RequestError::Validation(ValidationError::NotFound)
    ));

    assert_eq!(db.get_rating(book, bob).await.unwrap(), None);
    let rated = db.rate_resource(bob, book, 5).await.unwrap();
    assert_eq!(rated.rating, 5);
    assert_eq!(rated.avg_rating, Some(5.0));
    let rated = db.rate_resource(alice, book, 2).await.unwrap();
    assert_eq!(rated.avg_rating, Some(3.5));
    let rated = db.rate_resource(bob, book, 4).await.unwrap();
    assert_eq!(rated.avg_rating, Some(3.0));
    assert_eq!(db.get_rating(book, bob).await.unwrap(), Some(4));
    assert!(matches!(
        db.rate_resource(bob, book, 6).await.unwrap_err(),
        RequestError::Validation(_)
    ));

    let first = db.add_comment(bob, book, "great read").await.unwrap();
    let second = db.add_comment(alice, book, "  thanks!  ").await.unwrap();
    assert!(second > first);
    let comments = db.list_comments(book).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].name, "Bob");
    assert_eq!(comments[1].body, "thanks!");
    assert!(matches!(
        db.add_comment(bob, book, "   ").await.unwrap_err(),
        RequestError::Validation(_)
    ));
    assert!(matches!(
        db.add_comment(bob, 999, "hello?").await.unwrap_err(),
        RequestError::Validation(ValidationError::NotFound)
    ));

    let card = db.get_resource_card(book, Some(bob)).await.unwrap();
    assert_eq!(card.likes, Some(1));
    assert_eq!(card.comment_count, Some(2));
    assert_eq!(card.avg_rating, Some(3.0));
    assert_eq!(card.poster.as_deref(), Some("Alice"));
    assert_eq!(card.viewer_liked, Some(false));
    assert_eq!(card.viewer_rating, Some(4));
}

#[tokio::test]
#[ignore = "requires a local postgres instance"]
async fn feed_filters_and_sorts() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let alice = signup(&db, "Alice").await;
    let bob = signup(&db, "Bob").await;
    let book = post(&db, alice, "Book", "Tech").await;
    let song = post(&db, bob, "Song", "Music").await;
    let bread = post(&db, bob, "Bread", "Baking").await;

    db.toggle_like(alice, song).await.unwrap();
    db.toggle_like(bob, song).await.unwrap();
    db.toggle_like(alice, bread).await.unwrap();
    db.rate_resource(alice, bread, 5).await.unwrap();
    db.rate_resource(bob, book, 3).await.unwrap();
    db.add_comment(alice, book, "nice").await.unwrap();

    let categories = db.get_categories().await.unwrap();
    assert!(categories.iter().any(|c| c.name == "Baking"));
    assert!(categories.iter().any(|c| c.name == "Art"));

    let page = feed(&db, FeedQuery::default(), None).await;
    assert_eq!(titles(&page.resources), ["Bread", "Song", "Book"]);
    assert_eq!(page.comments_of(book).len(), 1);
    assert!(page.comments_of(song).is_empty());

    let popular = FeedQuery {
        sort: Some("most_popular".to_string()),
        ..Default::default()
    };
    assert_eq!(titles(&feed(&db, popular, None).await.resources), ["Song", "Bread", "Book"]);

    let rated = FeedQuery {
        sort: Some("highest_rating".to_string()),
        ..Default::default()
    };
    assert_eq!(titles(&feed(&db, rated, None).await.resources), ["Bread", "Book", "Song"]);

    let by_category = FeedQuery {
        categories: Some("tech, mus".to_string()),
        ..Default::default()
    };
    let page = feed(&db, by_category, None).await;
    assert_eq!(titles(&page.resources), ["Song", "Book"]);
    assert_eq!(page.resources[0].category.as_deref(), Some("Music"));

    let mine = FeedQuery {
        mine: Some(true),
        ..Default::default()
    };
    assert_eq!(titles(&feed(&db, mine, Some(bob)).await.resources), ["Bread", "Song"]);

    let liked = FeedQuery {
        liked: Some(true),
        ..Default::default()
    };
    let page = feed(&db, liked, Some(alice)).await;
    assert_eq!(titles(&page.resources), ["Bread", "Song"]);
    assert!(page.resources.iter().all(|r| r.viewer_liked == Some(true)));

    let liked_and_rated = FeedQuery {
        liked: Some(true),
        rated: Some(true),
        ..Default::default()
    };
    assert_eq!(titles(&feed(&db, liked_and_rated, Some(alice)).await.resources), ["Bread"]);

    let paged = FeedQuery {
        limit: Some(2),
        page: Some(2),
        ..Default::default()
    };
    assert_eq!(titles(&feed(&db, paged, None).await.resources), ["Book"]);

    let personal = FeedQuery {
        mine: Some(true),
        ..Default::default()
    }
    .into_resource_query(None)
    .unwrap_err();
    assert!(matches!(personal, RequestError::BadCredentials));
}

#[tokio::test]
#[ignore = "requires a local postgres instance"]
async fn only_the_poster_removes_a_resource() {
    let _lock = SERIAL_LOCK.lock().await;
    let db = init_and_get_db().await;

    let alice = signup(&db, "Alice").await;
    let bob = signup(&db, "Bob").await;
    let book = post(&db, alice, "Book", "Tech").await;
    db.toggle_like(bob, book).await.unwrap();
    db.add_comment(bob, book, "mine now").await.unwrap();

    assert!(matches!(
        db.remove_resource(book, bob).await.unwrap_err(),
        RequestError::Forbidden
    ));
    db.remove_resource(book, alice).await.unwrap();
    assert!(!db.resource_exists(book).await.unwrap());
    assert!(matches!(
        db.remove_resource(book, alice).await.unwrap_err(),
        RequestError::Validation(ValidationError::NotFound)
    ));

    db.delete_account(bob).await.unwrap();
    assert!(db.get_user_with_id(bob).await.unwrap().is_none());
    assert!(matches!(
        db.delete_account(bob).await.unwrap_err(),
        RequestError::Validation(ValidationError::NotFound)
    ));
}
