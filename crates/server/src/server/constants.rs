/// Hard upper bound for any listing `LIMIT`/page size to protect DB and memory usage.
pub const MAX_LISTING_ELEMENTS: i32 = 200;

/// Resources shown on the landing page.
pub const LANDING_PAGE_RESOURCES: i64 = 8;
