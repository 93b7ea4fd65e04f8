use chrono::{DateTime, Utc};

use crate::models::comment::CommentView;
use crate::models::rating::MAX_RATING;
use crate::models::resource::ResourceRow;
use crate::views::comments::comments_html;
use crate::views::timeago::timeago;
use crate::views::{avatar_src, escape};

/// `Avg.&nbsp 4.5` when rated, `Not rated yet` otherwise.
fn average_rating_html(avg_rating: Option<f64>) -> String {
    match avg_rating.filter(|avg| *avg > 0.0) {
        Some(avg) => format!(
            r#"<span class="custom-avg-rating rated">Avg.&nbsp {avg:.1}</span>"#
        ),
        None => r#"<span class="custom-avg-rating not-rated">Not rated yet</span>"#.to_string(),
    }
}

fn comment_count_label(count: usize) -> String {
    match count {
        1 => "1 comment".to_string(),
        n => format!("{n} comments"),
    }
}

/// One `<article>` card of the feed.
pub fn feed_card_html(resource: &ResourceRow, comments: &[CommentView], now: DateTime<Utc>) -> String {
    let link = escape(&resource.content);
    let thumbnail = resource
        .thumbnail_photo
        .as_deref()
        .map(|src| format!(r#"<img class="custom-resource-image" src="{}">"#, escape(src)))
        .unwrap_or_default();
    let likes = resource
        .likes
        .filter(|likes| *likes > 0)
        .map(|likes| likes.to_string())
        .unwrap_or_default();
    let heart = if resource.viewer_liked.unwrap_or(false) {
        ""
    } else {
        "outline"
    };
    let comment_count = resource
        .comment_count
        .map(|count| count as usize)
        .unwrap_or(comments.len());
    let category = resource
        .category
        .as_deref()
        .map(|name| format!(r#"<span class="ui label custom-category">{}</span>"#, escape(name)))
        .unwrap_or_default();
    let comments_section = if comments.is_empty() {
        String::new()
    } else {
        comments_html(comments, now)
    };

    format!(
        r#"
<article class="ui fluid card">
  <div class="content">
    <div class="right floated meta" title="{created_at}">{created}</div>
    <img class="ui avatar image" src="{poster_avatar}"> &nbsp <span class="custom-poster-name">{poster}</span>
    {category}
  </div>
  <div class="content custom-resource-area">
    <a class="custom-image-link" href="{link}" target="_blank" rel="noopener">
      <div class="custom-image-hover"></div>
      {thumbnail}
    </a>
    <div class="custom-resource-name">
      <a href="{link}" target="_blank" rel="noopener">{title}</a>
      <span class="custom-resource-description">{description}</span>
    </div>
    <div class="custom-rating">
      {average}
      &nbsp&nbsp<div class="ui yellow rating" data-rating="{viewer_rating}" data-max-rating="{max_rating}"></div>
    </div>
  </div>
  <div class="content">
    <span class="custom-resource-id">{id}</span>
    <span class="right floated custom-like-count">{likes}</span>
    <span class="right floated">
      <i class="heart {heart} custom-like like icon"></i>
    </span>
    <i class="comment icon"></i>
    {comment_count}
  </div>
  {comments_section}
  <div class="extra content">
    <div class="ui large transparent left icon input">
      <i class="comment outline icon"></i>
      <span class="custom-resource-id">{id}</span>
      <input class="new-comment" type="text" placeholder="Add comment...">
    </div>
  </div>
</article>
"#,
        created_at = resource.created.to_rfc3339(),
        created = timeago(resource.created, now),
        poster_avatar = avatar_src(resource.poster_avatar.as_deref()),
        poster = escape(resource.poster.as_deref().unwrap_or_default()),
        title = escape(&resource.title),
        description = escape(&resource.description),
        average = average_rating_html(resource.avg_rating),
        viewer_rating = resource.viewer_rating.unwrap_or(0),
        max_rating = MAX_RATING,
        id = resource.id,
        comment_count = comment_count_label(comment_count),
    )
}

/// Cards for a whole feed page, in the order given.
pub fn feed_cards_html<'a, F>(resources: &[ResourceRow], comments_of: F, now: DateTime<Utc>) -> String
where
    F: Fn(&ResourceRow) -> &'a [CommentView],
{
    resources
        .iter()
        .map(|resource| feed_card_html(resource, comments_of(resource), now))
        .collect()
}
