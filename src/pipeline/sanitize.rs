//! Response sanitising: recover the JSON body from a model reply.
//!
//! Even with an explicit "no markdown" instruction, chat models often wrap
//! JSON in a ` ```json ... ``` ` fence, sometimes an unlabelled one, and pad
//! it with whitespace. [`sanitize_response`] undoes that.
//!
//! The function is total: it never fails and never validates. Parsing the
//! returned text as JSON is a separate step whose failure is reported as
//! [`crate::error::CopyGenError::MalformedResponse`]. An absent or blank reply
//! yields `None`, which callers report as
//! [`crate::error::CopyGenError::EmptyResponse`], never as empty JSON.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());

static RE_FENCE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

/// Best-effort unwrapping of a model reply into bare JSON text.
///
/// 1. If a fence labelled `json` is present, return its trimmed inner content.
/// 2. Otherwise strip every fence marker and trim surrounding whitespace.
/// 3. Return `None` when nothing usable remains.
pub fn sanitize_response(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }

    if let Some(caps) = RE_JSON_FENCE.captures(raw) {
        let inner = caps[1].trim();
        if !inner.is_empty() {
            return Some(inner.to_string());
        }
    }

    let stripped = RE_FENCE_MARKER.replace_all(raw, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}
