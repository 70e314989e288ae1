//! HTTP adapter for explicit feedback.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{FeedbackRequest, FeedbackResponse};
pub use handlers::FeedbackApiError;
pub use routes::feedback_routes;
