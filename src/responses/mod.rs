pub mod errors;
pub mod html;
pub mod json;
pub mod xlsx;

pub use crate::errors::ResultResp;
pub use errors::error_to_response;
pub use html::html_response;
pub use json::{created_json, json_response, message_json, ok_json};
pub use xlsx::xlsx_response;
