//! Failure classification: retry or surface as a terminal error.
//!
//! A failed attempt is inspected for an HTTP status — on the error itself
//! or nested in its cause chain up to a fixed depth. Statuses in the
//! always-retry set are retried unconditionally; everything else is decided
//! by per-status processors registered at client construction, with the
//! file-upload table consulted before the general one.
//!
//! # Status handling
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | Cancellation | abort, never retried |
//! | No status within the search depth | abort, original error unchanged |
//! | Status in always-retry set (407) | retry |
//! | Processor present and handled | retry |
//! | Processor absent or unhandled | abort with `Status { status, body }` |

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::constants::{ALWAYS_RETRY_STATUSES, MAX_CAUSE_DEPTH, SUCCESS_STATUSES};
use super::error::TransferError;
use super::retry::RetryVerdict;

/// Per-status retry processor.
///
/// Receives the status code; returns `true` when the failure is handled
/// (retry the attempt) and `false` to defer to the terminal-error path.
pub type StatusProcessor = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Which processor table governs the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyScope {
    /// Ordinary requests: general table only.
    General,
    /// File uploads: upload table first, general table as fallback.
    FileUpload,
}

/// Strongly owned status→processor tables.
///
/// Two independent sets exist: a general one and a file-upload-specific one
/// that falls back to the general set when no upload entry matches. Both
/// are registered at client construction; there is no lifetime coupling to
/// caller state.
#[derive(Clone, Default)]
pub struct RetryPolicies {
    general: HashMap<u16, StatusProcessor>,
    upload: HashMap<u16, StatusProcessor>,
}

impl RetryPolicies {
    /// Creates empty policy tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a processor in the general table.
    pub fn register<F>(&mut self, status: u16, processor: F)
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.general.insert(status, Arc::new(processor));
    }

    /// Registers a processor in the file-upload table.
    pub fn register_upload<F>(&mut self, status: u16, processor: F)
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.upload.insert(status, Arc::new(processor));
    }

    /// Two-level lookup: upload table first (in upload scope), then general.
    fn lookup(&self, scope: PolicyScope, status: u16) -> Option<&StatusProcessor> {
        if scope == PolicyScope::FileUpload
            && let Some(processor) = self.upload.get(&status)
        {
            return Some(processor);
        }
        self.general.get(&status)
    }
}

impl std::fmt::Debug for RetryPolicies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut general: Vec<u16> = self.general.keys().copied().collect();
        let mut upload: Vec<u16> = self.upload.keys().copied().collect();
        general.sort_unstable();
        upload.sort_unstable();
        f.debug_struct("RetryPolicies")
            .field("general", &general)
            .field("upload", &upload)
            .finish()
    }
}

/// Returns true for the status codes the transport treats as success:
/// 200, 201, 206. Any other status routes through classification.
#[must_use]
pub fn is_success_status(status: u16) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

/// Classifies a failed attempt.
///
/// Cancellation aborts. An error with no reachable HTTP status aborts with
/// the original error unchanged. A status in the always-retry set retries.
/// Otherwise the processor tables decide; an unhandled status aborts, and
/// when the status was found nested below the raised error a structured
/// [`TransferError::Status`] replacement is surfaced in its place.
#[must_use]
pub fn classify(
    error: &TransferError,
    policies: &RetryPolicies,
    scope: PolicyScope,
) -> RetryVerdict {
    if error.is_cancelled() {
        return RetryVerdict::Abort(None);
    }

    let Some(found) = find_status_failure(error) else {
        debug!(error = %error, "no HTTP status within search depth, not retryable");
        return RetryVerdict::Abort(None);
    };

    if ALWAYS_RETRY_STATUSES.contains(&found.status) {
        debug!(status = found.status, "status in always-retry set");
        return RetryVerdict::Retry;
    }

    if let Some(processor) = policies.lookup(scope, found.status)
        && processor(found.status)
    {
        debug!(status = found.status, ?scope, "status processor handled failure");
        return RetryVerdict::Retry;
    }

    debug!(status = found.status, ?scope, "no processor handled failure");
    RetryVerdict::Abort(found.replacement)
}

/// A status-bearing failure located on or below the raised error.
struct StatusFailure {
    status: u16,
    /// Structured stand-in to surface when the hit was nested; `None` when
    /// the raised error itself carries the status.
    replacement: Option<TransferError>,
}

/// Walks the cause chain, at most [`MAX_CAUSE_DEPTH`] hops below the raised
/// error, for the first [`TransferError`] carrying an HTTP status.
fn find_status_failure(error: &TransferError) -> Option<StatusFailure> {
    let mut current: &(dyn std::error::Error + 'static) = error;

    for depth in 0..=MAX_CAUSE_DEPTH {
        if let Some(transfer) = current.downcast_ref::<TransferError>()
            && let Some(status) = transfer.status_code()
        {
            let replacement = (depth > 0).then(|| match transfer {
                TransferError::Status {
                    url,
                    status,
                    body,
                    message,
                } => TransferError::Status {
                    url: url.clone(),
                    status: *status,
                    body: body.clone(),
                    message: message.clone(),
                },
                // Status-bearing but body-less (failed body read): rebuild
                // without the non-cloneable read error.
                other => {
                    let url = match other {
                        TransferError::BodyRead { url, .. } => url.clone(),
                        _ => String::new(),
                    };
                    TransferError::status(url, status, format!("nested transfer failure: {other}"))
                }
            });
            return Some(StatusFailure {
                status,
                replacement,
            });
        }
        current = current.source()?;
    }

    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Wrapper error used to nest a `TransferError` below other layers.
    #[derive(Debug, thiserror::Error)]
    #[error("wrapper: {source}")]
    struct Wrapper {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    }

    fn status_error(status: u16) -> TransferError {
        TransferError::status("https://api.example.com/files", status, "body text")
    }

    #[test]
    fn test_success_statuses() {
        assert!(is_success_status(200));
        assert!(is_success_status(201));
        assert!(is_success_status(206));
        for status in [100, 202, 204, 301, 400, 404, 407, 500, 503] {
            assert!(!is_success_status(status), "{status} must not be success");
        }
    }

    #[test]
    fn test_unregistered_status_aborts() {
        let policies = RetryPolicies::new();
        let verdict = classify(&status_error(500), &policies, PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Abort(None)));
    }

    #[test]
    fn test_always_retry_status_bypasses_tables() {
        let policies = RetryPolicies::new();
        let verdict = classify(&status_error(407), &policies, PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Retry));
    }

    #[test]
    fn test_handled_processor_retries() {
        let mut policies = RetryPolicies::new();
        policies.register(503, |_| true);
        let verdict = classify(&status_error(503), &policies, PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Retry));
    }

    #[test]
    fn test_unhandled_processor_aborts() {
        let mut policies = RetryPolicies::new();
        policies.register(503, |_| false);
        let verdict = classify(&status_error(503), &policies, PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Abort(_)));
    }

    #[test]
    fn test_upload_table_takes_precedence() {
        let mut policies = RetryPolicies::new();
        policies.register(509, |_| true);
        policies.register_upload(509, |_| false);

        // Upload scope consults the stricter upload entry first.
        let verdict = classify(&status_error(509), &policies, PolicyScope::FileUpload);
        assert!(matches!(verdict, RetryVerdict::Abort(_)));

        // General scope never sees the upload entry.
        let verdict = classify(&status_error(509), &policies, PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Retry));
    }

    #[test]
    fn test_upload_scope_falls_back_to_general_table() {
        let mut policies = RetryPolicies::new();
        policies.register(503, |_| true);
        let verdict = classify(&status_error(503), &policies, PolicyScope::FileUpload);
        assert!(matches!(verdict, RetryVerdict::Retry));
    }

    #[test]
    fn test_cancellation_never_retried() {
        let mut policies = RetryPolicies::new();
        policies.register(503, |_| true);
        let verdict = classify(&TransferError::Cancelled, &policies, PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Abort(None)));
    }

    #[test]
    fn test_statusless_error_aborts_unchanged() {
        let policies = RetryPolicies::new();
        let error = TransferError::io(std::io::Error::other("disk full"));
        let verdict = classify(&error, &policies, PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Abort(None)));
    }

    #[test]
    fn test_nested_status_found_within_depth() {
        // Status error three hops below the raised error: Io → io::Error →
        // wrapper → status. Exactly at the search cap.
        let wrapped = Wrapper {
            source: Box::new(status_error(407)),
        };
        let outer = TransferError::Io {
            source: std::io::Error::other(wrapped),
        };

        let verdict = classify(&outer, &RetryPolicies::new(), PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Retry));
    }

    #[test]
    fn test_nested_unhandled_status_surfaces_structured_replacement() {
        let outer = TransferError::Io {
            source: std::io::Error::other(status_error(500)),
        };

        let verdict = classify(&outer, &RetryPolicies::new(), PolicyScope::General);
        match verdict {
            RetryVerdict::Abort(Some(TransferError::Status { status, body, .. })) => {
                assert_eq!(status, 500);
                assert_eq!(body, "body text");
            }
            other => panic!("Expected structured replacement, got: {other:?}"),
        }
    }

    #[test]
    fn test_status_beyond_search_depth_not_found() {
        // Four wrapper hops put the status error beyond the 3-hop cap.
        let mut boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(status_error(500));
        for _ in 0..4 {
            boxed = Box::new(Wrapper { source: boxed });
        }
        let outer = TransferError::Io {
            source: std::io::Error::other(boxed),
        };

        let verdict = classify(&outer, &RetryPolicies::new(), PolicyScope::General);
        assert!(matches!(verdict, RetryVerdict::Abort(None)));
    }
}
