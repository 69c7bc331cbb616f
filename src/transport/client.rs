//! HTTP transport client for the storage API.
//!
//! `TransportClient` composes the retry executor, the failure classifier,
//! the stream copier, and the multipart encoder into the request surface
//! the rest of the system talks to: JSON GET/POST/PATCH, form posts,
//! streaming downloads, and multipart file uploads. Every logical operation
//! runs inside the retry loop — each attempt builds a fresh request, fetches
//! a fresh bearer token, and re-serializes its body, so a rotated token or a
//! half-consumed source stream never leaks across attempts.

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures_util::TryStreamExt;
use futures_util::future::BoxFuture;
use reqwest::{Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::{ReaderStream, StreamReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::classify::{PolicyScope, RetryPolicies, classify, is_success_status};
use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_ATTEMPTS, READ_TIMEOUT_SECS,
};
use super::copy::{Progress, ProgressFn, copy};
use super::error::TransferError;
use super::multipart::MultipartEnvelope;
use super::retry::{Backoff, run_with_retry};
use super::token::{TokenSource, TokenUpdate, TokenUpdateListener};
use crate::user_agent;

/// Byte range for a partial GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte of the range.
    pub offset: u64,
    /// Number of bytes; `None` means everything from `offset` onward.
    pub length: Option<u64>,
}

impl ByteRange {
    /// Range from `offset` to the end of the resource.
    #[must_use]
    pub fn from_offset(offset: u64) -> Self {
        Self {
            offset,
            length: None,
        }
    }

    /// Range of `length` bytes starting at `offset`.
    #[must_use]
    pub fn new(offset: u64, length: u64) -> Self {
        Self {
            offset,
            length: Some(length),
        }
    }

    /// Renders the `Range` header value: `bytes=offset-` or
    /// `bytes=offset-(offset+length-1)`.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self.length {
            Some(length) if length > 0 => {
                format!("bytes={}-{}", self.offset, self.offset + length - 1)
            }
            _ => format!("bytes={}-", self.offset),
        }
    }
}

/// Opens the upload source stream, returning its total length and a reader.
///
/// Invoked once per attempt: a partially consumed stream cannot be
/// replayed, so every retry reopens the source from the start.
pub type FileOpener = Box<
    dyn Fn() -> BoxFuture<
            'static,
            Result<(u64, Box<dyn AsyncRead + Send + Unpin>), TransferError>,
        > + Send
        + Sync,
>;

/// Everything needed to upload one file as `multipart/form-data`.
pub struct SendFileInfo {
    /// Per-attempt source stream opener.
    pub open: FileOpener,
    /// Form field name for the file part.
    pub field_name: String,
    /// File name emitted in the part's `Content-Disposition`.
    pub file_name: String,
    /// Extra form parameters, emitted before the file part in this order.
    pub params: Vec<(String, String)>,
    /// Chunk size for the body copy; 0 selects the default.
    pub buffer_size: usize,
    /// Progress callback over the file bytes (envelope bytes excluded).
    pub progress: Option<ProgressFn>,
    /// Cancellation signal threaded through source reads and body writes.
    pub cancel: CancellationToken,
}

impl SendFileInfo {
    /// Creates an upload description with no extra parameters, the default
    /// buffer size, no progress callback, and a fresh cancellation token.
    pub fn new(
        open: FileOpener,
        field_name: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            open,
            field_name: field_name.into(),
            file_name: file_name.into(),
            params: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl fmt::Debug for SendFileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendFileInfo")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("params", &self.params)
            .field("buffer_size", &self.buffer_size)
            .field("has_progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TransportClient`].
pub struct TransportClientBuilder {
    token_source: Arc<dyn TokenSource>,
    update_listener: Option<Arc<dyn TokenUpdateListener>>,
    policies: RetryPolicies,
    max_attempts: u32,
    backoff: Backoff,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    user_agent: String,
}

impl TransportClientBuilder {
    fn new(token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            token_source,
            update_listener: None,
            policies: RetryPolicies::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            user_agent: user_agent::default_transport_user_agent(),
        }
    }

    /// Installs the status→processor retry tables.
    #[must_use]
    pub fn policies(mut self, policies: RetryPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Overrides the per-operation attempt budget.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Overrides the backoff schedule.
    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Registers a credential-rotation listener.
    #[must_use]
    pub fn update_listener(mut self, listener: Arc<dyn TokenUpdateListener>) -> Self {
        self.update_listener = Some(listener);
        self
    }

    /// Overrides connect/read timeouts (seconds).
    #[must_use]
    pub fn timeouts(mut self, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self.read_timeout_secs = read_timeout_secs;
        self
    }

    /// Overrides the User-Agent header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds the client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn build(self) -> TransportClient {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.read_timeout_secs))
            .gzip(true)
            .user_agent(self.user_agent)
            .build()
            .expect("failed to build HTTP client with static configuration");
        TransportClient {
            http,
            tokens: self.token_source,
            update_listener: self.update_listener,
            policies: self.policies,
            max_attempts: self.max_attempts,
            backoff: self.backoff,
        }
    }
}

/// Resilient HTTP client for the storage API.
///
/// Designed to be created once and shared: each logical operation carries
/// its own request object, buffers, and retry state, so concurrent
/// operations never share mutable state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use drivewire::{StaticTokenSource, TransportClient};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), drivewire::TransferError> {
/// let client = TransportClient::builder(Arc::new(StaticTokenSource::new("token"))).build();
/// let info: serde_json::Value = client
///     .get("https://storage.example.com/api/v1/account", &CancellationToken::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct TransportClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    update_listener: Option<Arc<dyn TokenUpdateListener>>,
    policies: RetryPolicies,
    max_attempts: u32,
    backoff: Backoff,
}

impl fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportClient")
            .field("policies", &self.policies)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("has_update_listener", &self.update_listener.is_some())
            .finish_non_exhaustive()
    }
}

impl TransportClient {
    /// Starts building a client around the given token source.
    #[must_use]
    pub fn builder(token_source: Arc<dyn TokenSource>) -> TransportClientBuilder {
        TransportClientBuilder::new(token_source)
    }

    /// Forwards a credential rotation to the registered update listener.
    ///
    /// The client itself never persists tokens; the next request simply
    /// fetches the rotated token from the token source.
    pub fn notify_token_updated(&self, update: &TokenUpdate) {
        if let Some(listener) = &self.update_listener {
            debug!("forwarding credential rotation to update listener");
            listener.token_updated(update);
        }
    }

    /// Generic request: `prepare` finalizes the attempt's request builder,
    /// `parse` consumes the successful response.
    ///
    /// Runs inside the retry loop; both closures are re-invoked per attempt
    /// against a fresh builder and a fresh response.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] when the URL is invalid, the operation is
    /// cancelled, or all attempts fail.
    pub async fn send<T, Prepare, Parse>(
        &self,
        method: Method,
        url: &str,
        scope: PolicyScope,
        cancel: &CancellationToken,
        prepare: Prepare,
        parse: Parse,
    ) -> Result<T, TransferError>
    where
        Prepare: Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
        Parse: AsyncFn(reqwest::Response) -> Result<T, TransferError>,
    {
        Url::parse(url).map_err(|_| TransferError::invalid_url(url))?;

        run_with_retry(
            self.max_attempts,
            &self.backoff,
            cancel,
            async || {
                let request = prepare(self.base_request(method.clone(), url).await?);
                let response = request
                    .send()
                    .await
                    .map_err(|source| TransferError::network(url, source))?;
                let status = response.status().as_u16();
                if !is_success_status(status) {
                    return Err(capture_failure(url, status, response).await);
                }
                parse(response).await
            },
            |error| classify(error, &self.policies, scope),
        )
        .await
    }

    /// GET returning a JSON-decoded body.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on invalid URL, cancellation, terminal HTTP
    /// failure, or decode failure.
    #[instrument(skip(self, cancel), fields(url = %url))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<T, TransferError> {
        self.send(
            Method::GET,
            url,
            PolicyScope::General,
            cancel,
            |request| request,
            async |response| parse_json(url, response).await,
        )
        .await
    }

    /// GET returning the raw body text.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`get`](Self::get), minus decode failures.
    #[instrument(skip(self, cancel), fields(url = %url))]
    pub async fn get_string(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TransferError> {
        self.send(
            Method::GET,
            url,
            PolicyScope::General,
            cancel,
            |request| request,
            async |response| {
                response
                    .text()
                    .await
                    .map_err(|source| TransferError::network(url, source))
            },
        )
        .await
    }

    /// POST with a JSON body, returning a JSON-decoded response.
    ///
    /// The body is re-serialized on every attempt.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`get`](Self::get).
    #[instrument(skip(self, body, cancel), fields(url = %url))]
    pub async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T, TransferError> {
        self.send(
            Method::POST,
            url,
            PolicyScope::General,
            cancel,
            |request| request.json(body),
            async |response| parse_json(url, response).await,
        )
        .await
    }

    /// PATCH with a JSON body, returning a JSON-decoded response.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`get`](Self::get).
    #[instrument(skip(self, body, cancel), fields(url = %url))]
    pub async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T, TransferError> {
        self.send(
            Method::PATCH,
            url,
            PolicyScope::General,
            cancel,
            |request| request.json(body),
            async |response| parse_json(url, response).await,
        )
        .await
    }

    /// POST with a form-urlencoded body, returning a JSON-decoded response.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`get`](Self::get).
    #[instrument(skip(self, fields, cancel), fields(url = %url))]
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        fields: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<T, TransferError> {
        self.send(
            Method::POST,
            url,
            PolicyScope::General,
            cancel,
            |request| request.form(&fields),
            async |response| parse_json(url, response).await,
        )
        .await
    }

    /// Streams a GET response body into `sink` in `buffer_size` chunks,
    /// returning the bytes written for the final (successful) attempt.
    ///
    /// A range request carries the matching `Range` header and expects a
    /// 206 response. On a transient failure the whole cycle is retried and
    /// the body is streamed into `sink` again from the start, so sinks used
    /// with retryable operations should be reset-capable (seekable files,
    /// growable buffers written at a fixed position, ...).
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on invalid URL, cancellation, terminal HTTP
    /// failure, or sink I/O failure.
    #[instrument(skip(self, sink, cancel, progress), fields(url = %url))]
    pub async fn get_to_stream<W>(
        &self,
        url: &str,
        sink: &mut W,
        range: Option<ByteRange>,
        buffer_size: usize,
        cancel: &CancellationToken,
        mut progress: Option<&mut (dyn FnMut(u64) -> u64 + Send)>,
    ) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        Url::parse(url).map_err(|_| TransferError::invalid_url(url))?;
        let buffer_size = effective_buffer_size(buffer_size);

        run_with_retry(
            self.max_attempts,
            &self.backoff,
            cancel,
            async || {
                let mut request = self.base_request(Method::GET, url).await?;
                if let Some(range) = &range {
                    request = request.header(header::RANGE, range.header_value());
                }
                let response = request
                    .send()
                    .await
                    .map_err(|source| TransferError::network(url, source))?;
                let status = response.status().as_u16();
                if !is_success_status(status) {
                    return Err(capture_failure(url, status, response).await);
                }

                let stream = response.bytes_stream().map_err(std::io::Error::other);
                let mut reader = StreamReader::new(stream);
                let state = progress
                    .as_deref_mut()
                    .map(|callback| Progress::new(callback as &mut (dyn FnMut(u64) -> u64 + Send)));
                copy(&mut reader, sink, buffer_size, cancel, state).await
            },
            |error| classify(error, &self.policies, PolicyScope::General),
        )
        .await
    }

    /// Streams a GET response body directly into `buf` starting at
    /// `offset`, returning the count written. At most `buf.len() - offset`
    /// bytes are read; any response remainder beyond the region is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on invalid URL or offset, cancellation, or
    /// terminal HTTP failure.
    #[instrument(skip(self, buf, cancel), fields(url = %url))]
    pub async fn get_to_buffer(
        &self,
        url: &str,
        buf: &mut [u8],
        offset: usize,
        range: Option<ByteRange>,
        cancel: &CancellationToken,
    ) -> Result<usize, TransferError> {
        Url::parse(url).map_err(|_| TransferError::invalid_url(url))?;
        if offset > buf.len() {
            return Err(TransferError::io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("buffer offset {offset} beyond length {}", buf.len()),
            )));
        }

        run_with_retry(
            self.max_attempts,
            &self.backoff,
            cancel,
            async || {
                let mut request = self.base_request(Method::GET, url).await?;
                if let Some(range) = &range {
                    request = request.header(header::RANGE, range.header_value());
                }
                let response = request
                    .send()
                    .await
                    .map_err(|source| TransferError::network(url, source))?;
                let status = response.status().as_u16();
                if !is_success_status(status) {
                    return Err(capture_failure(url, status, response).await);
                }

                let region = &mut buf[offset..];
                let capacity = region.len() as u64;
                let stream = response.bytes_stream().map_err(std::io::Error::other);
                let mut reader = StreamReader::new(stream).take(capacity);
                let mut cursor = std::io::Cursor::new(region);
                let written =
                    copy(&mut reader, &mut cursor, DEFAULT_BUFFER_SIZE, cancel, None).await?;
                Ok(written as usize)
            },
            |error| classify(error, &self.policies, PolicyScope::General),
        )
        .await
    }

    /// Uploads a file as `multipart/form-data`, returning the JSON-decoded
    /// response.
    ///
    /// The source stream is reopened and a fresh boundary generated on every
    /// attempt; the total content length is computed from the precomputed
    /// envelope, so the upload carries an explicit `Content-Length` and is
    /// never chunked. File bytes flow through the stream copier, which
    /// honors `info.cancel` and reports progress over the file body.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on invalid URL, cancellation, source I/O
    /// failure, or terminal HTTP failure.
    #[instrument(skip(self, info), fields(url = %url, file = %info.file_name))]
    pub async fn send_file<T: DeserializeOwned>(
        &self,
        url: &str,
        info: SendFileInfo,
    ) -> Result<T, TransferError> {
        Url::parse(url).map_err(|_| TransferError::invalid_url(url))?;

        let SendFileInfo {
            open,
            field_name,
            file_name,
            params,
            buffer_size,
            progress,
            cancel,
        } = info;
        let buffer_size = effective_buffer_size(buffer_size);
        // The callback survives across attempts but each attempt's copy task
        // needs an owned handle, so it lives behind a shared lock.
        let progress = progress.map(|callback| Arc::new(StdMutex::new(callback)));

        run_with_retry(
            self.max_attempts,
            &self.backoff,
            &cancel,
            async || {
                let (file_len, reader) = (open)().await?;
                let envelope =
                    MultipartEnvelope::build(&field_name, &file_name, file_len, &params);
                let total = envelope.content_length();

                let (body_writer, body_reader) = tokio::io::duplex(buffer_size);
                let feeder = spawn_body_feeder(
                    reader,
                    body_writer,
                    envelope.prefix().to_vec(),
                    envelope.postfix().to_vec(),
                    buffer_size,
                    cancel.clone(),
                    progress.clone(),
                );

                // An explicit Content-Length keeps the streamed body out of
                // chunked transfer encoding.
                let request = self
                    .base_request(Method::POST, url)
                    .await?
                    .header(header::CONTENT_TYPE, envelope.content_type())
                    .header(header::CONTENT_LENGTH, total)
                    .body(reqwest::Body::wrap_stream(ReaderStream::with_capacity(
                        body_reader,
                        buffer_size,
                    )));

                let send_result = request.send().await;

                // Once the send resolved (or failed) the body side is done:
                // either fully consumed, or unblocked by the dropped pipe.
                let feed_result = match feeder.await {
                    Ok(result) => result,
                    Err(join_error) => Err(TransferError::io(std::io::Error::other(join_error))),
                };

                let response = match send_result {
                    Ok(response) => response,
                    // The feeder's failure is the cause when the copy was
                    // cancelled or the source read failed mid-body.
                    Err(source) => {
                        return match feed_result {
                            Err(feed_error) => Err(feed_error),
                            Ok(()) => Err(TransferError::network(url, source)),
                        };
                    }
                };

                let status = response.status().as_u16();
                if !is_success_status(status) {
                    // A cancelled upload outranks whatever the server said
                    // about the truncated body.
                    if matches!(feed_result, Err(TransferError::Cancelled)) {
                        return Err(TransferError::Cancelled);
                    }
                    return Err(capture_failure(url, status, response).await);
                }
                feed_result?;
                parse_json(url, response).await
            },
            |error| classify(error, &self.policies, PolicyScope::FileUpload),
        )
        .await
    }

    /// Builds the attempt's request with the cross-cutting headers: a
    /// freshly fetched bearer token and `Cache-Control: no-cache`.
    /// (User-Agent and timeouts are client-level settings.)
    async fn base_request(
        &self,
        method: Method,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, TransferError> {
        let token = self.tokens.bearer_token().await?;
        Ok(self
            .http
            .request(method, url)
            .header(header::AUTHORIZATION, normalize_bearer(&token))
            .header(header::CACHE_CONTROL, "no-cache"))
    }
}

/// Writes prefix, file body, and postfix into the request pipe on a
/// separate task so the send and the body production run concurrently.
fn spawn_body_feeder(
    mut reader: Box<dyn AsyncRead + Send + Unpin>,
    mut writer: tokio::io::DuplexStream,
    prefix: Vec<u8>,
    postfix: Vec<u8>,
    buffer_size: usize,
    cancel: CancellationToken,
    progress: Option<Arc<StdMutex<ProgressFn>>>,
) -> tokio::task::JoinHandle<Result<(), TransferError>> {
    tokio::spawn(async move {
        writer.write_all(&prefix).await.map_err(TransferError::io)?;

        if let Some(shared) = progress {
            let mut adapter = move |position: u64| -> u64 {
                shared
                    .lock()
                    .map_or(u64::MAX, |mut callback| (*callback)(position))
            };
            copy(
                &mut reader,
                &mut writer,
                buffer_size,
                &cancel,
                Some(Progress::new(&mut adapter)),
            )
            .await?;
        } else {
            copy(&mut reader, &mut writer, buffer_size, &cancel, None).await?;
        }

        writer.write_all(&postfix).await.map_err(TransferError::io)?;
        writer.shutdown().await.map_err(TransferError::io)?;
        Ok(())
    })
}

/// Decodes a successful response body as JSON.
async fn parse_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, TransferError> {
    let body = response
        .text()
        .await
        .map_err(|source| TransferError::network(url, source))?;
    serde_json::from_str(&body).map_err(|source| TransferError::decode(url, source))
}

/// Captures a non-success response as a terminal error, reading the body
/// best-effort. A failed body read is itself wrapped so callers always see
/// a structured error.
async fn capture_failure(url: &str, status: u16, response: reqwest::Response) -> TransferError {
    match response.text().await {
        Ok(body) => TransferError::status(url, status, body),
        Err(source) => TransferError::body_read(url, status, source),
    }
}

fn effective_buffer_size(buffer_size: usize) -> usize {
    if buffer_size == 0 {
        DEFAULT_BUFFER_SIZE
    } else {
        buffer_size
    }
}

fn normalize_bearer(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::token::StaticTokenSource;

    #[test]
    fn test_range_header_single_bounded() {
        assert_eq!(ByteRange::from_offset(100).header_value(), "bytes=100-");
    }

    #[test]
    fn test_range_header_double_bounded() {
        assert_eq!(ByteRange::new(100, 50).header_value(), "bytes=100-149");
    }

    #[test]
    fn test_range_header_zero_length_falls_back_to_open_range() {
        assert_eq!(
            ByteRange {
                offset: 10,
                length: Some(0)
            }
            .header_value(),
            "bytes=10-"
        );
    }

    #[test]
    fn test_normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(normalize_bearer("abc123"), "Bearer abc123");
    }

    #[test]
    fn test_normalize_bearer_keeps_existing_prefix() {
        assert_eq!(normalize_bearer("bEaReR abc123"), "bEaReR abc123");
    }

    #[test]
    fn test_effective_buffer_size_zero_selects_default() {
        assert_eq!(effective_buffer_size(0), DEFAULT_BUFFER_SIZE);
        assert_eq!(effective_buffer_size(4096), 4096);
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_any_attempt() {
        let client =
            TransportClient::builder(Arc::new(StaticTokenSource::new("token"))).build();
        let result: Result<serde_json::Value, _> =
            client.get("not-a-valid-url", &CancellationToken::new()).await;
        assert!(matches!(result, Err(TransferError::InvalidUrl { .. })));
    }

    #[test]
    fn test_debug_lists_no_token_material() {
        let client =
            TransportClient::builder(Arc::new(StaticTokenSource::new("secret-token"))).build();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-token"));
    }
}
