//! Request classification.
//!
//! Turns the transport's loosely-typed [`IncomingParameters`] into a
//! [`ClassifiedRequest`] before anything touches the archive or the audit log.
//!
//! Precedence:
//!
//! 1. `req` is `getFaqs` or `demo` → lookup
//! 2. `feedback` is present → feedback (payload in `value`)
//! 3. `req` is absent → invalid, missing request type
//! 4. otherwise → invalid, unsupported request type
//!
//! Browsers submitting the lookup form sometimes append a line terminator to
//! field values; trailing whitespace is trimmed from keywords and the user id.

use crate::models::{ClassifiedRequest, IncomingParameters, LookupRequest, DEMO_SESSION};

pub const REQ_GET_FAQS: &str = "getFaqs";
pub const REQ_DEMO: &str = "demo";
pub const LEGAL_REQUESTS: [&str; 2] = [REQ_GET_FAQS, REQ_DEMO];

pub const MISSING_REQUEST_TYPE: &str = "missing request type";
pub const UNSUPPORTED_REQUEST_TYPE: &str = "unsupported request type";
pub const NO_KEYWORDS: &str = "no keywords supplied";
pub const NO_USER_ID: &str = "no user id supplied";
pub const NO_FEEDBACK_VALUE: &str = "no feedback value supplied";

pub fn classify(params: &IncomingParameters) -> ClassifiedRequest {
    match params.first("req") {
        Some(req) if LEGAL_REQUESTS.contains(&req) => classify_lookup(params, req == REQ_DEMO),
        _ if params.contains("feedback") => match params.first("value") {
            Some(value) => ClassifiedRequest::Feedback {
                raw_value: value.to_string(),
            },
            None => invalid(NO_FEEDBACK_VALUE),
        },
        None => invalid(MISSING_REQUEST_TYPE),
        Some(_) => invalid(UNSUPPORTED_REQUEST_TYPE),
    }
}

fn classify_lookup(params: &IncomingParameters, is_demo: bool) -> ClassifiedRequest {
    let keywords: Vec<String> = params
        .all("keyword")
        .iter()
        .map(|k| k.trim_end().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return invalid(NO_KEYWORDS);
    }

    let uid = params
        .first("uid")
        .map(str::trim_end)
        .filter(|u| !u.is_empty());
    let user_id = match (uid, is_demo) {
        (Some(uid), _) => uid.to_string(),
        (None, true) => DEMO_SESSION.to_string(),
        (None, false) => return invalid(NO_USER_ID),
    };

    ClassifiedRequest::Lookup(LookupRequest {
        keywords,
        user_id,
        is_demo,
    })
}

fn invalid(reason: &str) -> ClassifiedRequest {
    ClassifiedRequest::Invalid {
        reason: reason.to_string(),
    }
}
