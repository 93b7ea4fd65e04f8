//! Assembles the parameterized `SELECT` behind every resource listing.
//!
//! A [`ResourceQuery`] is a set of independent switches (which aggregates to
//! select, which filters to apply, how to sort and paginate). [`ResourceQuery::build`]
//! maps it onto one SQL statement plus the ordered list of values for its
//! `$n` placeholders. User supplied values never end up in the SQL text.

use strum_macros::{Display, EnumString};

use crate::models::resource::ResourceId;
use crate::models::user::UserId;
use crate::server::constants::MAX_LISTING_ELEMENTS;

pub const DEFAULT_RESOURCE_LIMIT: i64 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryParam {
    Id(i32),
    BigInt(i64),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeSort {
    Latest,
    Oldest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingSort {
    Highest,
    Lowest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopularitySort {
    Most,
    Least,
}

/// Sort keys are applied time first, then rating, then popularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceSort {
    pub time: Option<TimeSort>,
    pub rating: Option<RatingSort>,
    pub popularity: Option<PopularitySort>,
}

/// Sort names accepted from the outside world, e.g. `?sort=latest,most_popular`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SortKey {
    Latest,
    Oldest,
    HighestRating,
    LowestRating,
    MostPopular,
    LeastPopular,
}

impl ResourceSort {
    /// Later keys of the same family override earlier ones.
    pub fn apply(&mut self, key: SortKey) {
        match key {
            SortKey::Latest => self.time = Some(TimeSort::Latest),
            SortKey::Oldest => self.time = Some(TimeSort::Oldest),
            SortKey::HighestRating => self.rating = Some(RatingSort::Highest),
            SortKey::LowestRating => self.rating = Some(RatingSort::Lowest),
            SortKey::MostPopular => self.popularity = Some(PopularitySort::Most),
            SortKey::LeastPopular => self.popularity = Some(PopularitySort::Least),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    /// Select the number of likes as `likes`.
    pub likes: bool,
    /// Select the number of comments as `comment_count`.
    pub comments: bool,
    /// Select the average rating as `avg_rating`.
    pub avg_ratings: bool,
    /// Select the poster's name and avatar.
    pub users: bool,
    /// Keep resources whose category name contains any of these.
    pub categories: Vec<String>,
    /// Keep resources posted by this user.
    pub owned_by: Option<UserId>,
    /// User whose likes, comments or ratings the `filter_by_*` flags refer to.
    pub interacted_by: Option<UserId>,
    pub filter_by_liked: bool,
    pub filter_by_commented: bool,
    pub filter_by_rated: bool,
    /// Select whether this user liked each resource and how they rated it.
    pub viewer: Option<UserId>,
    pub resource_id: Option<ResourceId>,
    pub sort: ResourceSort,
    pub limit: Option<i64>,
    /// 1-based page number.
    pub page: Option<i64>,
}

#[derive(Default)]
struct Params {
    values: Vec<QueryParam>,
}

impl Params {
    fn push(&mut self, value: QueryParam) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }
}

/// Escapes `LIKE` wildcards so category filters match literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl ResourceQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_RESOURCE_LIMIT)
            .clamp(1, MAX_LISTING_ELEMENTS as i64)
    }

    pub fn effective_offset(&self) -> i64 {
        let page = self.page.unwrap_or(1).max(1);
        (page - 1).saturating_mul(self.effective_limit())
    }

    fn has_interaction_filter(&self) -> bool {
        self.interacted_by.is_some()
            && (self.filter_by_liked || self.filter_by_commented || self.filter_by_rated)
    }

    pub fn build(&self) -> BuiltQuery {
        let mut params = Params::default();

        let join_likes = self.likes || self.sort.popularity.is_some();
        let join_comments = self.comments;
        let join_ratings = self.avg_ratings || self.sort.rating.is_some();
        let join_users = self.users || self.owned_by.is_some();
        let categories: Vec<&str> = self
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        let join_categories = !categories.is_empty();
        let aggregated = join_likes || join_comments || join_ratings;

        // SELECT
        let mut columns = vec!["resources.*".to_string()];
        if join_likes {
            columns.push("COUNT(DISTINCT likes.user_id) AS likes".to_string());
        }
        if join_comments {
            columns.push("COUNT(DISTINCT comments.id) AS comment_count".to_string());
        }
        if join_ratings {
            // every rating row repeats equally often across the other joins
            columns.push("AVG(ratings.rating)::float8 AS avg_rating".to_string());
        }
        if join_users {
            columns.push("users.name AS poster".to_string());
            columns.push("users.avatar AS poster_avatar".to_string());
        }
        if join_categories {
            columns.push("categories.name AS category".to_string());
        }
        if let Some(viewer) = self.viewer {
            let viewer = params.push(QueryParam::Id(viewer));
            columns.push(format!(
                "EXISTS (SELECT 1 FROM likes AS viewer_likes \
                 WHERE viewer_likes.resource_id = resources.id AND viewer_likes.user_id = {viewer}) \
                 AS viewer_liked"
            ));
            columns.push(format!(
                "(SELECT viewer_ratings.rating FROM ratings AS viewer_ratings \
                 WHERE viewer_ratings.resource_id = resources.id AND viewer_ratings.user_id = {viewer}) \
                 AS viewer_rating"
            ));
        }

        // FROM
        let mut sql = format!("SELECT {} FROM resources", columns.join(", "));
        if join_likes {
            sql.push_str(" LEFT JOIN likes ON likes.resource_id = resources.id");
        }
        if join_comments {
            sql.push_str(" LEFT JOIN comments ON comments.resource_id = resources.id");
        }
        if join_ratings {
            sql.push_str(" LEFT JOIN ratings ON ratings.resource_id = resources.id");
        }
        if join_users {
            sql.push_str(" JOIN users ON users.id = resources.user_id");
        }
        if join_categories {
            sql.push_str(" JOIN categories ON categories.id = resources.category_id");
        }

        // WHERE
        let mut conditions = Vec::new();
        if let Some(resource_id) = self.resource_id {
            let id = params.push(QueryParam::Id(resource_id));
            conditions.push(format!("resources.id = {id}"));
        }
        if let Some(owner) = self.owned_by {
            let owner = params.push(QueryParam::Id(owner));
            conditions.push(format!("resources.user_id = {owner}"));
        }
        if join_categories {
            let alternatives: Vec<String> = categories
                .iter()
                .map(|category| {
                    let pattern = params.push(QueryParam::Text(format!(
                        "%{}%",
                        escape_like(category)
                    )));
                    format!("categories.name ILIKE {pattern}")
                })
                .collect();
            conditions.push(format!("({})", alternatives.join(" OR ")));
        }
        if let Some(user) = self.interacted_by.filter(|_| self.has_interaction_filter()) {
            let user = params.push(QueryParam::Id(user));
            let filters = [
                (self.filter_by_liked, "likes"),
                (self.filter_by_commented, "comments"),
                (self.filter_by_rated, "ratings"),
            ];
            for (_, table) in filters.into_iter().filter(|(enabled, _)| *enabled) {
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM {table} AS by_user \
                     WHERE by_user.resource_id = resources.id AND by_user.user_id = {user})"
                ));
            }
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        // GROUP BY
        if aggregated {
            let mut keys = vec!["resources.id"];
            if join_users {
                keys.push("users.id");
            }
            if join_categories {
                keys.push("categories.id");
            }
            sql.push_str(" GROUP BY ");
            sql.push_str(&keys.join(", "));
        }

        // ORDER BY
        let mut order = Vec::new();
        match self.sort.time {
            Some(TimeSort::Latest) => order.push("resources.created DESC"),
            Some(TimeSort::Oldest) => order.push("resources.created ASC"),
            None => {}
        }
        match self.sort.rating {
            Some(RatingSort::Highest) => order.push("AVG(ratings.rating) DESC NULLS LAST"),
            Some(RatingSort::Lowest) => order.push("AVG(ratings.rating) ASC NULLS LAST"),
            None => {}
        }
        match self.sort.popularity {
            Some(PopularitySort::Most) => order.push("COUNT(DISTINCT likes.user_id) DESC"),
            Some(PopularitySort::Least) => order.push("COUNT(DISTINCT likes.user_id) ASC"),
            None => {}
        }
        order.push("resources.id DESC");
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));

        // LIMIT
        let limit = params.push(QueryParam::BigInt(self.effective_limit()));
        let offset = params.push(QueryParam::BigInt(self.effective_offset()));
        sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

        BuiltQuery {
            sql,
            params: params.values,
        }
    }
}
