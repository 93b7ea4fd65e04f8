pub mod accounts;
pub mod commands;
pub mod connection;
pub mod feed;
pub mod queries;
pub mod resource_query;
pub mod schema;
pub mod utils;
