//! Resilient HTTP transport for the storage API.
//!
//! This module provides the request surface the rest of the system talks
//! to: JSON requests, streaming downloads, and multipart file uploads, all
//! running inside a shared retry loop with exponential backoff, pluggable
//! per-status retry policies, cooperative cancellation, and per-attempt
//! bearer-token injection.
//!
//! # Features
//!
//! - Per-status retry policy tables with a dedicated upload scope
//! - Exponential backoff (1s base, 64s cap by default)
//! - Streaming uploads and downloads (memory-efficient for large files)
//! - Watermark-driven progress callbacks
//! - Cooperative cancellation at chunk granularity
//! - Fresh bearer token per attempt, surviving mid-operation rotation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use drivewire::{StaticTokenSource, TransportClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), drivewire::TransferError> {
//! let client = TransportClient::builder(Arc::new(StaticTokenSource::new("token"))).build();
//! let account: serde_json::Value = client
//!     .get("https://storage.example.com/api/v1/account", &CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod classify;
mod client;
pub mod constants;
mod copy;
mod error;
mod multipart;
mod retry;
mod token;

pub use classify::{PolicyScope, RetryPolicies, StatusProcessor, is_success_status};
pub use client::{ByteRange, FileOpener, SendFileInfo, TransportClient, TransportClientBuilder};
pub use copy::{Progress, ProgressFn, copy};
pub use error::TransferError;
pub use multipart::{MultipartBoundary, MultipartEnvelope};
pub use retry::{Backoff, RetryVerdict, run_with_retry};
pub use token::{StaticTokenSource, TokenSource, TokenUpdate, TokenUpdateListener};
