//! Core data models used throughout the forum archive server.
//!
//! These types represent the request parameters, classified requests, archive
//! rows, and audit records that flow through a single lookup or feedback
//! request.

use serde::Serialize;

/// Session marker used for demo lookups in place of a per-request UUID.
pub const DEMO_SESSION: &str = "demo";

/// Loosely-typed parameter bag delivered by the transport.
///
/// Keeps keys in first-seen order and every value supplied for a key, so a
/// repeated `keyword=` parameter yields all of its values in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingParameters {
    entries: Vec<(String, Vec<String>)>,
}

impl IncomingParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the values of `key`.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Builds a parameter bag from decoded `(key, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.push(k, v);
        }
        params
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// All values for `key`, empty if the key is absent.
    pub fn all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.all(key).first().map(String::as_str)
    }
}

/// A validated keyword lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    /// Keywords in the order the client sent them. Never empty.
    pub keywords: Vec<String>,
    /// Client-generated user id, or [`DEMO_SESSION`] for an anonymous demo.
    pub user_id: String,
    pub is_demo: bool,
}

/// Result of classifying an [`IncomingParameters`] bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedRequest {
    Lookup(LookupRequest),
    Feedback { raw_value: String },
    Invalid { reason: String },
}

/// One question/answer row as returned by the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedAnswer {
    pub question: String,
    pub answer: String,
    pub question_id: String,
}

/// A matched answer placed at a 1-based position within one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedResult {
    pub answer: MatchedAnswer,
    pub rank: u32,
    pub session_id: String,
    pub user_id: String,
}

/// One line of the audit trail: which result was shown to whom, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    pub keywords: Vec<String>,
    pub question_id: String,
    pub session_id: String,
    pub rank: u32,
    pub user_id: String,
}

impl AuditLogEntry {
    pub fn for_result(keywords: &[String], result: &RankedResult) -> Self {
        Self {
            keywords: keywords.to_vec(),
            question_id: result.answer.question_id.clone(),
            session_id: result.session_id.clone(),
            rank: result.rank,
            user_id: result.user_id.clone(),
        }
    }
}

/// A rating submitted from the feedback form of a previously shown result.
///
/// The client sends `"<rating>,<sessionId>,<rank>"`. Parts that are missing
/// or malformed are kept as `None`; the raw value is always retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    pub raw: String,
    pub rating: Option<String>,
    pub session_id: Option<String>,
    pub rank: Option<u32>,
}

impl FeedbackEntry {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(3, ',').map(str::trim);
        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);
        let rating = non_empty(parts.next());
        let session_id = non_empty(parts.next());
        let rank = parts.next().and_then(|r| r.parse::<u32>().ok());
        Self {
            raw: raw.to_string(),
            rating,
            session_id,
            rank,
        }
    }
}

/// A record written to the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditRecord {
    Shown(AuditLogEntry),
    Feedback(FeedbackEntry),
}
