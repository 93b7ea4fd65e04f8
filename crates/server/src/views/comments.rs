use chrono::{DateTime, Utc};

use crate::models::comment::CommentView;
use crate::views::timeago::timeago;
use crate::views::{avatar_src, escape};

/// Number of most recent comments shown before "View previous comments".
pub const VISIBLE_COMMENTS: usize = 3;

pub fn single_comment_html(comment: &CommentView, hidden: bool, now: DateTime<Utc>) -> String {
    format!(
        r#"
  <div class="comment {hidden}">
    <div class="avatar">
      <img src="{avatar}">
    </div>
    <div class="content">
      <span class="custom-comment-id">{id}</span>
      <span class="author">{name}</span>
      <div class="metadata">
        <span class="date" title="{timestamp}">{date}</span>
      </div>
      <div class="text">
        <p>{text}</p>
      </div>
    </div>
  </div>
"#,
        hidden = if hidden { "custom-comment-hidden" } else { "" },
        avatar = avatar_src(comment.avatar.as_deref()),
        id = comment.id,
        name = escape(&comment.name),
        timestamp = comment.created.to_rfc3339(),
        date = timeago(comment.created, now),
        text = escape(&comment.body),
    )
}

/// Renders comments oldest first; only the last `visible` stay shown.
pub fn recent_comments_html(comments: &[CommentView], visible: usize, now: DateTime<Utc>) -> String {
    let mut sorted: Vec<&CommentView> = comments.iter().collect();
    sorted.sort_by_key(|c| (c.created, c.id));
    let first_visible = sorted.len().saturating_sub(visible);
    sorted
        .iter()
        .enumerate()
        .fold(String::new(), |mut html, (index, comment)| {
            html.push_str(&single_comment_html(comment, index < first_visible, now));
            html
        })
}

/// Whole comment section of a feed card, hidden older comments included.
pub fn comments_html(comments: &[CommentView], now: DateTime<Utc>) -> String {
    let mut html = String::from("\n  <div class=\"content\">\n    <div class=\"ui content comments\">\n");
    if comments.len() > VISIBLE_COMMENTS {
        html.push_str("      <div class=\"custom-view-previous\">View previous comments</div>\n");
    }
    html.push_str(&recent_comments_html(comments, VISIBLE_COMMENTS, now));
    html.push_str("    </div>\n  </div>\n");
    html
}
