//! Result frames embedded in the script's standard output.
//!
//! The harness writes exactly one line of the form
//! `<start marker><json payload><end marker>`. Markers carry a per-execution
//! nonce, and the decoder only looks at the last frame in the stream, so text
//! printed by the script itself cannot stand in for the harness's frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Payload of a success frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessFrame {
    /// Value returned by `main()`.
    pub main_result: Value,
    /// Output printed while `main()` ran.
    pub stdout: String,
}

/// Why the harness emitted an error frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFrameKind {
    /// `main()` raised.
    Exception,
    /// `main()` returned something JSON cannot represent.
    Unserializable,
    /// `main` is missing, not callable, or requires arguments.
    Signature,
}

/// Payload of an error frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub kind: ErrorFrameKind,
    pub message: String,
}

/// A frame located in stdout, payload not yet parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFrame<'a> {
    Success(&'a str),
    Error(&'a str),
}

/// Start and end markers for one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMarkers {
    result_start: String,
    result_end: String,
    error_start: String,
    error_end: String,
}

impl FrameMarkers {
    /// Markers with a fresh random nonce.
    pub fn generate() -> Self {
        Self::with_nonce(&Uuid::new_v4().simple().to_string())
    }

    /// Markers with a fixed nonce.
    pub fn with_nonce(nonce: &str) -> Self {
        Self {
            result_start: format!("__SB_RESULT_{nonce}_START__"),
            result_end: format!("__SB_RESULT_{nonce}_END__"),
            error_start: format!("__SB_ERROR_{nonce}_START__"),
            error_end: format!("__SB_ERROR_{nonce}_END__"),
        }
    }

    pub fn result_start(&self) -> &str {
        &self.result_start
    }

    pub fn result_end(&self) -> &str {
        &self.result_end
    }

    pub fn error_start(&self) -> &str {
        &self.error_start
    }

    pub fn error_end(&self) -> &str {
        &self.error_end
    }

    /// Render a success frame line, as the harness would print it.
    pub fn success_line(&self, frame: &SuccessFrame) -> serde_json::Result<String> {
        Ok(format!(
            "{}{}{}\n",
            self.result_start,
            serde_json::to_string(frame)?,
            self.result_end
        ))
    }

    /// Render an error frame line, as the harness would print it.
    pub fn error_line(&self, frame: &ErrorFrame) -> serde_json::Result<String> {
        Ok(format!(
            "{}{}{}\n",
            self.error_start,
            serde_json::to_string(frame)?,
            self.error_end
        ))
    }

    /// Find the last complete frame of either kind in `stdout`.
    pub fn last_frame<'a>(&self, stdout: &'a str) -> Option<RawFrame<'a>> {
        let success = last_between(stdout, &self.result_start, &self.result_end);
        let error = last_between(stdout, &self.error_start, &self.error_end);

        match (success, error) {
            (Some((s_at, s)), Some((e_at, e))) => {
                if s_at > e_at {
                    Some(RawFrame::Success(s))
                } else {
                    Some(RawFrame::Error(e))
                }
            }
            (Some((_, s)), None) => Some(RawFrame::Success(s)),
            (None, Some((_, e))) => Some(RawFrame::Error(e)),
            (None, None) => None,
        }
    }
}

/// Position and body of the last `start…end` span in `text`.
fn last_between<'a>(text: &'a str, start: &str, end: &str) -> Option<(usize, &'a str)> {
    let at = text.rfind(start)?;
    let body_start = at + start.len();
    let body_len = text[body_start..].find(end)?;
    Some((at, &text[body_start..body_start + body_len]))
}
