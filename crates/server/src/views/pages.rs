use crate::models::category::Category;
use crate::models::user::UserProfile;
use crate::views::{avatar_src, escape};

pub fn layout(title: &str, user: Option<&UserProfile>, body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<img class="ui avatar image" src="{avatar}"> <span class="custom-user">{name}</span>
      <form class="item custom-logout" method="post" action="/logout"><button class="ui basic button" type="submit">Log out</button></form>"#,
            avatar = avatar_src(user.avatar.as_deref()),
            name = escape(&user.name),
        ),
        None => r#"<a class="item" href="/login">Log in</a> <a class="item" href="/signup">Sign up</a>"#
            .to_string(),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} | Resource Wall</title>
</head>
<body>
  <nav class="ui menu">
    <a class="header item" href="/">Resource Wall</a>
    <div class="right menu">
      {nav}
    </div>
  </nav>
  <main class="ui container">
{body}
  </main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn error_html(err: Option<&str>) -> String {
    err.map(|err| format!(r#"<div class="ui negative message custom-error">{}</div>"#, escape(err)))
        .unwrap_or_default()
}

pub fn landing_page(cards: &str) -> String {
    let body = format!(
        r#"    <h1 class="ui header">Popular resources</h1>
    <section class="ui cards custom-feed">{cards}</section>"#
    );
    layout("Welcome", None, &body)
}

pub fn login_page(err: Option<&str>) -> String {
    let body = format!(
        r#"    <h1 class="ui header">Log in</h1>
    {err}
    <form class="ui form custom-login" method="post" action="/login">
      <div class="field"><label>Email</label><input type="email" name="email" required></div>
      <div class="field"><label>Password</label><input type="password" name="password" required></div>
      <button class="ui button" type="submit">Log in</button>
    </form>"#,
        err = error_html(err),
    );
    layout("Log in", None, &body)
}

pub fn signup_page(err: Option<&str>) -> String {
    let body = format!(
        r#"    <h1 class="ui header">Sign up</h1>
    {err}
    <form class="ui form custom-signup" method="post" action="/">
      <div class="field"><label>Name</label><input type="text" name="name" required></div>
      <div class="field"><label>Email</label><input type="email" name="email" required></div>
      <div class="field"><label>Password</label><input type="password" name="password" required></div>
      <button class="ui button" type="submit">Sign up</button>
    </form>"#,
        err = error_html(err),
    );
    layout("Sign up", None, &body)
}

pub fn home_page(user: &UserProfile, categories: &[Category], cards: &str) -> String {
    let category_links: String = categories
        .iter()
        .map(|category| {
            format!(
                r#"<a class="item custom-category" href="/home?categories={query}">{name}</a>"#,
                query = escape(&urlencode(&category.name)),
                name = escape(&category.name),
            )
        })
        .collect();
    let body = format!(
        r#"    <div class="ui secondary menu custom-sorts">
      <a class="item" href="/home?sort=latest">Latest</a>
      <a class="item" href="/home?sort=most_popular">Most popular</a>
      <a class="item" href="/home?sort=highest_rating">Highest rated</a>
      <a class="item" href="/home?mine=true">My resources</a>
      <a class="item" href="/home?liked=true">Liked</a>
    </div>
    <div class="ui secondary menu custom-categories">{category_links}</div>
    <section class="ui cards custom-feed">{cards}</section>"#
    );
    layout("Home", Some(user), &body)
}

/// Percent-encodes everything outside the unreserved set.
fn urlencode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            byte => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            name: "Alice <admin>".to_string(),
            email: "alice@example.com".to_string(),
            avatar: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn login_page_shows_error() {
        let html = login_page(Some("Wrong email/password entered"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Wrong email/password entered"));
        assert!(html.contains(r#"method="post" action="/login""#));
        assert!(!login_page(None).contains("custom-error"));
    }

    #[test]
    fn home_page_escapes_user_and_links_categories() {
        let categories = vec![Category {
            id: 1,
            name: "Arts & Crafts".to_string(),
        }];
        let html = home_page(&profile(), &categories, "<article></article>");
        assert!(html.contains("Alice &lt;admin&gt;"));
        assert!(html.contains("/home?categories=Arts%20%26%20Crafts"));
        assert!(html.contains("Arts &amp; Crafts"));
        assert!(html.contains("<article></article>"));
        assert!(html.contains(r#"method="post" action="/logout""#));
    }

    #[test]
    fn signup_page_posts_to_root() {
        let html = signup_page(None);
        assert!(html.contains(r#"method="post" action="/""#));
        assert!(html.contains("Log in"));
    }

    #[test]
    fn urlencode_reserved_characters() {
        assert_eq!(urlencode("a b&c/é"), "a%20b%26c%2F%C3%A9");
    }
}
