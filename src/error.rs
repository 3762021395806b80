//! Error taxonomy for the request pipeline.
//!
//! | Error | Cause | User sees | Server log |
//! |-------|-------|-----------|------------|
//! | [`ValidationError`] | bad or missing parameters | the reason, status 400 | debug |
//! | [`StoreError`] | connection, query or timeout failure | generic page, status 500 | error |
//! | [`RenderError`] | page assembly failure | generic page, status 500 | error |
//!
//! None of these are retried; each request gets exactly one attempt.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to acquire archive connection")]
    Connect(#[source] sqlx::Error),

    #[error("archive query failed")]
    Query(#[source] sqlx::Error),

    #[error("archive query exceeded {0:?}")]
    Timeout(Duration),

    /// Failure reported by a non-SQL backend.
    #[error("archive unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to render response: {0}")]
pub struct RenderError(pub String);

#[derive(Debug, Error)]
pub enum FaqError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl FaqError {
    /// Short message safe to show in the browser.
    pub fn user_message(&self) -> String {
        match self {
            FaqError::Validation(e) => format!("Bad request: {}", e.reason),
            FaqError::Store(_) => "The forum archive could not be searched right now.".to_string(),
            FaqError::Render(_) => "The result page could not be built.".to_string(),
        }
    }
}

/// Walks the `source()` chain into one line for server-side logs.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}
