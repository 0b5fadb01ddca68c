pub mod api_error;
pub mod database;

pub use api_error::{parse_category_ref, ApiError};
