//! Response body rewriting.
//!
//! Textual payloads have every literal occurrence of the upstream base URL
//! replaced with the local proxy prefix; binary payloads pass through
//! untouched. Detection is heuristic and deliberately kept behind the
//! [`is_likely_text`] seam so the strategy can be tuned without touching the
//! orchestrator.

use bytes::Bytes;

use super::PROXY_PREFIX;

/// How many leading bytes are inspected for the text/binary decision.
const SNIFF_WINDOW: usize = 1024;

/// Percentage of suspicious control characters above which the sniff window
/// is treated as binary.
const CONTROL_DENSITY_LIMIT: usize = 10;

/// Heuristic text detection over a byte buffer.
///
/// A null byte anywhere in the sniff window is a hard binary signal;
/// otherwise the payload counts as text while control characters other than
/// whitespace stay below a density threshold.
pub fn is_likely_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }

    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    if window.contains(&0) {
        return false;
    }

    let suspicious = window
        .iter()
        .filter(|byte| matches!(**byte, 0x01..=0x08 | 0x0b | 0x0c | 0x0e..=0x1f | 0x7f))
        .count();
    suspicious * 100 / window.len() < CONTROL_DENSITY_LIMIT
}

/// Replace every literal occurrence of the upstream base URL in a textual
/// payload with the local proxy prefix.
///
/// Binary payloads, payloads that are not valid UTF-8, and empty payloads
/// pass through unmodified.
pub fn rewrite_body(payload: Bytes, upstream_base_url: &str) -> Bytes {
    if payload.is_empty() || !is_likely_text(&payload) {
        return payload;
    }

    match std::str::from_utf8(&payload) {
        Ok(text) if text.contains(upstream_base_url) => {
            Bytes::from(text.replace(upstream_base_url, PROXY_PREFIX))
        }
        _ => payload,
    }
}
