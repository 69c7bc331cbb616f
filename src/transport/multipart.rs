//! Multipart/form-data envelope with a precomputed content length.
//!
//! Uploads are framed as `multipart/form-data` with the extra form
//! parameters emitted before the file part. The prefix (everything before
//! the file bytes) and postfix (the closing delimiter) are built up front so
//! the total request length is known before streaming begins and the upload
//! can be sent without chunked transfer encoding.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of the random boundary token.
const BOUNDARY_LEN: usize = 24;

/// Randomly generated multipart boundary token.
///
/// A fresh boundary is generated per upload attempt. The token is drawn
/// from a cryptographically seeded RNG, so collision with content bytes is
/// not a practical concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBoundary(String);

impl MultipartBoundary {
    /// Generates a fresh random boundary.
    #[must_use]
    pub fn generate() -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(BOUNDARY_LEN)
            .map(char::from)
            .collect();
        Self(token)
    }

    /// Returns the boundary token.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Precomputed byte segments wrapped around a streamed file body.
#[derive(Debug, Clone)]
pub struct MultipartEnvelope {
    boundary: MultipartBoundary,
    prefix: Vec<u8>,
    postfix: Vec<u8>,
    file_len: u64,
}

impl MultipartEnvelope {
    /// Builds the envelope for one upload attempt.
    ///
    /// `params` are emitted as `form-data` parts, in order, before the file
    /// part header for `field_name`/`file_name`. The file part declares
    /// `Content-Type: application/octet-stream` and the file's own
    /// `Content-Length`.
    #[must_use]
    pub fn build(
        field_name: &str,
        file_name: &str,
        file_len: u64,
        params: &[(String, String)],
    ) -> Self {
        let boundary = MultipartBoundary::generate();
        let b = boundary.value();

        let mut prefix = String::new();
        for (key, value) in params {
            prefix.push_str(&format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{key}\"\r\n\r\n{value}\r\n"
            ));
        }
        prefix.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\
             Content-Length: {file_len}\r\n\r\n"
        ));

        let postfix = format!("\r\n--{b}--\r\n");

        Self {
            boundary,
            prefix: prefix.into_bytes(),
            postfix: postfix.into_bytes(),
            file_len,
        }
    }

    /// Returns the boundary token used by this envelope.
    #[must_use]
    pub fn boundary(&self) -> &str {
        self.boundary.value()
    }

    /// Bytes sent before the file body.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Bytes sent after the file body (closing delimiter).
    #[must_use]
    pub fn postfix(&self) -> &[u8] {
        &self.postfix
    }

    /// Total request body length: prefix + file + postfix.
    ///
    /// Known before the request is sent, so uploads carry an explicit
    /// `Content-Length` and are never chunked.
    #[must_use]
    pub fn content_length(&self) -> u64 {
        self.prefix.len() as u64 + self.file_len + self.postfix.len() as u64
    }

    /// Value for the request `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary.value())
    }
}
