//! Constants for the transport module (timeouts, retry budget, buffers).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large transfers).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default attempt budget per logical operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Base delay for exponential backoff (1 second, doubled per attempt).
pub const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Backoff ceiling (64 seconds). Without a cap, a 100-attempt budget at
/// 2^n seconds would sleep for hours on later attempts.
pub const BACKOFF_CAP: Duration = Duration::from_secs(64);

/// Default chunk size for streaming copies (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Maximum number of cause-chain hops searched when classifying a failure.
pub const MAX_CAUSE_DEPTH: usize = 3;

/// Status codes treated as success throughout the transport:
/// 200 OK, 201 Created, 206 Partial Content.
pub const SUCCESS_STATUSES: [u16; 3] = [200, 201, 206];

/// Status codes retried unconditionally, bypassing the processor tables.
/// 407 Proxy Authentication Required is the sole member.
pub const ALWAYS_RETRY_STATUSES: [u16; 1] = [407];
