pub mod token;
pub mod utils;
