pub mod category;
pub mod comment;
pub mod like;
pub mod listing;
pub mod rating;
pub mod resource;
pub mod session;
pub mod user;
