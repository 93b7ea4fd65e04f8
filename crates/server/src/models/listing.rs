use std::str::FromStr;

use serde::Deserialize;

use crate::database::resource_query::{ResourceQuery, ResourceSort, SortKey};
use crate::error::{RequestError, ValidationError};
use crate::models::user::UserId;
use crate::server::constants::MAX_LISTING_ELEMENTS;

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

/// Query string accepted by the feed endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub sort: Option<String>,
    pub categories: Option<String>,
    pub mine: Option<bool>,
    pub liked: Option<bool>,
    pub commented: Option<bool>,
    pub rated: Option<bool>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

pub fn validate_limit(limit: i64) -> Result<(), RequestError> {
    if limit < 1 {
        return Err(ValidationError::InvalidInput {
            value: limit.to_string(),
            reason: "limit should be >= 1".to_string(),
        }
        .into());
    }
    if limit > MAX_LISTING_ELEMENTS as i64 {
        return Err(ValidationError::LimitExceeded {
            subject: "listing limit".to_string(),
            unit: "element".to_string(),
            attempted: limit as usize,
            limit: MAX_LISTING_ELEMENTS as usize,
        }
        .into());
    }
    Ok(())
}

pub fn validate_page(page: i64) -> Result<(), RequestError> {
    if page < 1 {
        return Err(ValidationError::InvalidInput {
            value: page.to_string(),
            reason: "page should be >= 1".to_string(),
        }
        .into());
    }
    Ok(())
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

pub fn parse_sort(value: Option<&str>) -> Result<ResourceSort, RequestError> {
    let mut sort = ResourceSort::default();
    for item in split_list(value) {
        let key = SortKey::from_str(item).map_err(|_| ValidationError::InvalidInput {
            value: item.to_string(),
            reason: "unknown sort, expected one of latest, oldest, highest_rating, \
                     lowest_rating, most_popular, least_popular"
                .to_string(),
        })?;
        sort.apply(key);
    }
    Ok(sort)
}

impl FeedQuery {
    /// Feed listing as seen by `viewer`. Every card carries likes, comment
    /// count, average rating and poster; the personal filters require a viewer.
    pub fn into_resource_query(self, viewer: Option<UserId>) -> Result<ResourceQuery, RequestError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        validate_limit(limit)?;
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        validate_page(page)?;
        let sort = parse_sort(self.sort.as_deref())?;
        let categories = split_list(self.categories.as_deref())
            .map(str::to_string)
            .collect();

        let mine = self.mine.unwrap_or(false);
        let liked = self.liked.unwrap_or(false);
        let commented = self.commented.unwrap_or(false);
        let rated = self.rated.unwrap_or(false);
        if viewer.is_none() && (mine || liked || commented || rated) {
            return Err(RequestError::BadCredentials);
        }

        Ok(ResourceQuery {
            likes: true,
            comments: true,
            avg_ratings: true,
            users: true,
            categories,
            owned_by: viewer.filter(|_| mine),
            interacted_by: viewer.filter(|_| liked || commented || rated),
            filter_by_liked: liked,
            filter_by_commented: commented,
            filter_by_rated: rated,
            viewer,
            resource_id: None,
            sort,
            limit: Some(limit),
            page: Some(page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::resource_query::{PopularitySort, TimeSort};

    #[test]
    fn defaults_produce_full_feed() {
        let query = FeedQuery::default().into_resource_query(Some(4)).unwrap();
        assert!(query.likes && query.comments && query.avg_ratings && query.users);
        assert_eq!(query.limit, Some(DEFAULT_LIMIT));
        assert_eq!(query.page, Some(DEFAULT_PAGE));
        assert_eq!(query.viewer, Some(4));
        assert_eq!(query.owned_by, None);
        assert_eq!(query.interacted_by, None);
        assert!(query.categories.is_empty());
    }

    #[test]
    fn parses_sorts_and_categories() {
        let query = FeedQuery {
            sort: Some("latest, most_popular".to_string()),
            categories: Some("Art,,Tech".to_string()),
            ..Default::default()
        }
        .into_resource_query(None)
        .unwrap();
        assert_eq!(query.sort.time, Some(TimeSort::Latest));
        assert_eq!(query.sort.popularity, Some(PopularitySort::Most));
        assert_eq!(query.sort.rating, None);
        assert_eq!(query.categories, vec!["Art", "Tech"]);
    }

    #[test]
    fn rejects_unknown_sort() {
        let err = FeedQuery {
            sort: Some("shuffle".to_string()),
            ..Default::default()
        }
        .into_resource_query(None)
        .expect_err("expected invalid input error");
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::InvalidInput { value, .. }) if value == "shuffle"
        ));
    }

    #[test]
    fn rejects_invalid_limit_and_page() {
        let err = FeedQuery {
            limit: Some(0),
            ..Default::default()
        }
        .into_resource_query(None)
        .expect_err("expected invalid input error");
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::InvalidInput { value, .. }) if value == "0"
        ));

        let err = FeedQuery {
            limit: Some(MAX_LISTING_ELEMENTS as i64 + 1),
            ..Default::default()
        }
        .into_resource_query(None)
        .expect_err("expected limit error");
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::LimitExceeded { .. })
        ));

        let err = FeedQuery {
            page: Some(0),
            ..Default::default()
        }
        .into_resource_query(None)
        .expect_err("expected invalid input error");
        assert!(matches!(err, RequestError::Validation(_)));
    }

    #[test]
    fn personal_filters_need_a_viewer() {
        let err = FeedQuery {
            liked: Some(true),
            ..Default::default()
        }
        .into_resource_query(None)
        .expect_err("expected credentials error");
        assert!(matches!(err, RequestError::BadCredentials));

        let query = FeedQuery {
            mine: Some(true),
            rated: Some(true),
            ..Default::default()
        }
        .into_resource_query(Some(9))
        .unwrap();
        assert_eq!(query.owned_by, Some(9));
        assert_eq!(query.interacted_by, Some(9));
        assert!(query.filter_by_rated);
        assert!(!query.filter_by_liked);
    }
}
