//! Drivewire Transport Library
//!
//! This library provides a resilient HTTP transport for a remote storage
//! REST API: retrying JSON requests, streaming downloads, and multipart
//! file uploads, with pluggable per-status retry policies, cooperative
//! cancellation, and bearer tokens that survive mid-operation rotation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`transport`] - Retrying HTTP client, stream copier, multipart
//!   encoder, failure classifier, and token plumbing

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod transport;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use transport::{
    Backoff, ByteRange, FileOpener, MultipartBoundary, MultipartEnvelope, PolicyScope, Progress,
    ProgressFn, RetryPolicies, RetryVerdict, SendFileInfo, StaticTokenSource, StatusProcessor,
    TokenSource, TokenUpdate, TokenUpdateListener, TransferError, TransportClient,
    TransportClientBuilder, copy, is_success_status, run_with_retry,
};
