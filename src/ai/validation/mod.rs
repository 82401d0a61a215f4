//! Model answer validation.

mod json_repair;

pub use json_repair::{JsonRepairer, extract_json_from_response};
