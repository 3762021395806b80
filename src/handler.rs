//! Per-request orchestration.
//!
//! ```text
//! Received ─▶ Classified ─┬─▶ LookingUp ─▶ Assembling ─▶ Responded
//!                         ├─▶ FeedbackLogged
//!                         └─▶ Rejected   (also from LookingUp / Assembling)
//! ```
//!
//! Nothing is retried. Per-request values (keywords, user, session) live in a
//! [`RequestContext`] owned by the call; the handler itself only holds shared,
//! immutable collaborators.

use std::sync::Arc;

use uuid::Uuid;

use crate::assemble::ResponseAssembler;
use crate::audit::AuditSink;
use crate::classify::classify;
use crate::error::{error_chain, FaqError, ValidationError};
use crate::lookup::FaqLookupService;
use crate::models::{
    AuditRecord, ClassifiedRequest, FeedbackEntry, IncomingParameters, LookupRequest,
    DEMO_SESSION,
};

/// Terminal state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Responded,
    FeedbackLogged,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub outcome: Outcome,
    /// HTTP status code for the transport.
    pub status: u16,
    /// HTML body; empty for feedback acknowledgements.
    pub body: String,
}

/// Values scoped to a single lookup.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub keywords: Vec<String>,
    pub user_id: String,
    pub session_id: String,
}

impl RequestContext {
    /// Demo lookups share the constant demo session; others get a fresh UUID.
    pub fn for_lookup(req: LookupRequest) -> Self {
        let session_id = if req.is_demo {
            DEMO_SESSION.to_string()
        } else {
            Uuid::new_v4().to_string()
        };
        Self {
            keywords: req.keywords,
            user_id: req.user_id,
            session_id,
        }
    }
}

#[derive(Clone)]
pub struct RequestHandler {
    lookup: FaqLookupService,
    assembler: ResponseAssembler,
    audit: Arc<dyn AuditSink>,
}

impl RequestHandler {
    pub fn new(
        lookup: FaqLookupService,
        assembler: ResponseAssembler,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            lookup,
            assembler,
            audit,
        }
    }

    pub async fn handle(&self, params: IncomingParameters) -> HandlerResponse {
        match classify(&params) {
            ClassifiedRequest::Lookup(req) => {
                let ctx = RequestContext::for_lookup(req);
                match self.serve_lookup(&ctx).await {
                    Ok(page) => HandlerResponse {
                        outcome: Outcome::Responded,
                        status: 200,
                        body: page,
                    },
                    Err(err) => self.reject(err),
                }
            }
            ClassifiedRequest::Feedback { raw_value } => self.log_feedback(&raw_value).await,
            ClassifiedRequest::Invalid { reason } => {
                tracing::debug!(?params, %reason, "rejected request");
                self.reject(ValidationError::new(reason).into())
            }
        }
    }

    async fn serve_lookup(&self, ctx: &RequestContext) -> Result<String, FaqError> {
        tracing::debug!(
            keywords = ?ctx.keywords,
            session = %ctx.session_id,
            "looking up"
        );
        let matches = self.lookup.lookup(&ctx.keywords).await?;
        let assembled =
            self.assembler
                .assemble(&ctx.keywords, matches, &ctx.session_id, &ctx.user_id)?;

        let records: Vec<AuditRecord> = assembled
            .audit_entries
            .into_iter()
            .map(AuditRecord::Shown)
            .collect();
        tracing::info!(
            session = %ctx.session_id,
            results = records.len(),
            "served lookup"
        );
        // The reader already has a valid page; a lost audit line is logged, not fatal
        if let Err(e) = self.audit.append(&records).await {
            tracing::error!(session = %ctx.session_id, "failed to write audit log: {:#}", e);
        }
        Ok(assembled.page)
    }

    async fn log_feedback(&self, raw_value: &str) -> HandlerResponse {
        let entry = FeedbackEntry::parse(raw_value);
        tracing::info!(feedback = %entry.raw, "feedback received");
        if let Err(e) = self.audit.append(&[AuditRecord::Feedback(entry)]).await {
            tracing::error!("failed to write feedback to audit log: {:#}", e);
        }
        HandlerResponse {
            outcome: Outcome::FeedbackLogged,
            status: 200,
            body: String::new(),
        }
    }

    fn reject(&self, err: FaqError) -> HandlerResponse {
        let status = match &err {
            FaqError::Validation(_) => 400,
            FaqError::Store(_) | FaqError::Render(_) => {
                tracing::error!("request failed: {}", error_chain(&err));
                500
            }
        };
        HandlerResponse {
            outcome: Outcome::Rejected,
            status,
            body: self.assembler.layout().error_page(&err.user_message()),
        }
    }
}
