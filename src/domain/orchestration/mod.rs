//! Orchestration module - request, response and error types shared by
//! every stage.

mod errors;
mod request;
mod response;

pub use errors::{OrchestrationError, Rejection, APOLOGY};
pub use request::{
    MultimodalInput, MultimodalKind, OrchestrationRequest, RequestContext, MAX_PROMPT_LENGTH,
};
pub use response::{FinalResponse, OrchestrationResponse, Outcome, PartSummary, ResponseSource};
