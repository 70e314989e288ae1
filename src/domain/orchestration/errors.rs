//! Orchestration error taxonomy.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, SubtaskId};

/// Terminal, pre-dispatch refusal issued by the request gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unsafe content: {reason}")]
    UnsafeContent { reason: String },

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
}

impl Rejection {
    pub fn code(&self) -> ErrorCode {
        match self {
            Rejection::UnsafeContent { .. } => ErrorCode::UnsafeContent,
            Rejection::RateLimited { .. } => ErrorCode::RateLimited,
        }
    }

    /// Text shown to the user. Never names the matched rule.
    pub fn user_message(&self) -> String {
        match self {
            Rejection::UnsafeContent { .. } => {
                "Your request was blocked because it appears to contain unsafe content.".to_string()
            }
            Rejection::RateLimited { retry_after_ms } => format!(
                "Too many requests. Please try again in {} seconds.",
                retry_after_ms.div_ceil(1000).max(1)
            ),
        }
    }
}

/// Everything that can go wrong while orchestrating one request.
///
/// Only `UnsafeContent`, `RateLimited` and `CriticalOrchestrationError`
/// end a request. The rest are downgraded to warnings by the stage that
/// raised them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    #[error("unsafe content: {reason}")]
    UnsafeContent { reason: String },

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("domain detection failed: {0}")]
    DomainDetectionFailure(String),

    #[error("decomposition failed: {0}")]
    DecompositionFailure(String),

    #[error("{subtask} failed: {message}")]
    DomainHandlerError { subtask: SubtaskId, message: String },

    #[error("critical orchestration error: {0}")]
    CriticalOrchestrationError(String),
}

/// Apology returned when a request fails unexpectedly.
pub const APOLOGY: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

impl OrchestrationError {
    pub fn critical(message: impl Into<String>) -> Self {
        Self::CriticalOrchestrationError(message.into())
    }

    /// True for errors that end the request.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::UnsafeContent { .. } | Self::RateLimited { .. } | Self::CriticalOrchestrationError(_)
        )
    }

    /// User-facing text. Internal detail stays in the trace and error list.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsafeContent { reason } => Rejection::UnsafeContent {
                reason: reason.clone(),
            }
            .user_message(),
            Self::RateLimited { retry_after_ms } => Rejection::RateLimited {
                retry_after_ms: *retry_after_ms,
            }
            .user_message(),
            Self::DomainDetectionFailure(_)
            | Self::DecompositionFailure(_)
            | Self::DomainHandlerError { .. }
            | Self::CriticalOrchestrationError(_) => APOLOGY.to_string(),
        }
    }
}

impl From<Rejection> for OrchestrationError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::UnsafeContent { reason } => Self::UnsafeContent { reason },
            Rejection::RateLimited { retry_after_ms } => Self::RateLimited { retry_after_ms },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_classification() {
        assert!(OrchestrationError::critical("x").is_terminal());
        assert!(OrchestrationError::RateLimited { retry_after_ms: 1 }.is_terminal());
        assert!(!OrchestrationError::DecompositionFailure("x".into()).is_terminal());
        assert!(!OrchestrationError::DomainHandlerError {
            subtask: SubtaskId::new(1),
            message: "x".into()
        }
        .is_terminal());
    }

    #[test]
    fn critical_errors_hide_detail_from_users() {
        let err = OrchestrationError::critical("memory repository returned EIO");
        assert_eq!(err.user_message(), APOLOGY);
        assert!(err.to_string().contains("EIO"));
    }

    #[test]
    fn rejection_messages_do_not_leak_rules() {
        let rejection = Rejection::UnsafeContent {
            reason: "matched denylist term 'exploit'".into(),
        };
        assert!(!rejection.user_message().contains("exploit"));
    }

    #[test]
    fn rate_limit_message_rounds_up_seconds() {
        let rejection = Rejection::RateLimited { retry_after_ms: 1_200 };
        assert!(rejection.user_message().contains("2 seconds"));
    }
}
