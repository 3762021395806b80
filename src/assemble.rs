//! Result page assembly.
//!
//! Ranks store-ordered matches 1..N, renders one fragment per match between
//! the fixed header and footer, and produces the audit entry for each result
//! shown.

use std::sync::Arc;

use crate::error::RenderError;
use crate::models::{AuditLogEntry, MatchedAnswer, RankedResult};
use crate::render::{HtmlRenderer, Renderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResponse {
    pub page: String,
    pub audit_entries: Vec<AuditLogEntry>,
}

#[derive(Clone)]
pub struct ResponseAssembler {
    layout: Arc<HtmlRenderer>,
    renderer: Arc<dyn Renderer>,
}

impl ResponseAssembler {
    /// Uses `layout` for both the page frame and the per-result fragments.
    pub fn new(layout: Arc<HtmlRenderer>) -> Self {
        let renderer: Arc<dyn Renderer> = layout.clone();
        Self { layout, renderer }
    }

    /// Replaces the per-result fragment renderer, keeping the page frame.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn layout(&self) -> &HtmlRenderer {
        &self.layout
    }

    /// An empty `matches` still yields a complete page with no fragments and
    /// no audit entries.
    pub fn assemble(
        &self,
        keywords: &[String],
        matches: Vec<MatchedAnswer>,
        session_id: &str,
        user_id: &str,
    ) -> Result<AssembledResponse, RenderError> {
        let mut page = self.layout.header(keywords);
        let mut audit_entries = Vec::with_capacity(matches.len());

        for (rank, answer) in (1u32..).zip(matches) {
            let result = RankedResult {
                answer,
                rank,
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
            };
            page.push_str(&self.renderer.render(&result)?);
            audit_entries.push(AuditLogEntry::for_result(keywords, &result));
        }

        page.push_str(self.layout.footer());
        Ok(AssembledResponse {
            page,
            audit_entries,
        })
    }
}
