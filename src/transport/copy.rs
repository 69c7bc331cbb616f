//! Cancellable chunked copy between byte streams with progress reporting.
//!
//! The copier is the single code path that moves body bytes in both
//! directions: download responses flow through it into caller sinks, and
//! upload sources flow through it into the outgoing request body. Progress
//! is reported through a watermark scheme — the callback receives the
//! cumulative byte count and returns the count at which it wants to be
//! called next.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::error::TransferError;

/// Progress callback: receives cumulative bytes transferred, returns the
/// next watermark at which it should fire again.
pub type ProgressFn = Box<dyn FnMut(u64) -> u64 + Send>;

/// Watermark-based progress state for a single logical transfer.
///
/// Owned by one copy loop at a time; never shared across concurrent
/// transfers. The first chunk always triggers a call (the initial watermark
/// is zero), and [`finish`](Self::finish) guarantees exactly one trailing
/// call with the terminal position when the periodic calls did not already
/// report it.
pub struct Progress<'a> {
    callback: &'a mut (dyn FnMut(u64) -> u64 + Send),
    watermark: u64,
    last_reported: Option<u64>,
}

impl<'a> Progress<'a> {
    /// Wraps a callback with fresh watermark state.
    pub fn new(callback: &'a mut (dyn FnMut(u64) -> u64 + Send)) -> Self {
        Self {
            callback,
            watermark: 0,
            last_reported: None,
        }
    }

    /// Reports `position` if it has reached the current watermark.
    pub fn advance(&mut self, position: u64) {
        if position >= self.watermark {
            self.watermark = (self.callback)(position);
            self.last_reported = Some(position);
        }
    }

    /// Issues the trailing call with the terminal position, unless the last
    /// periodic call already reported exactly that position.
    pub fn finish(&mut self, position: u64) {
        if self.last_reported != Some(position) {
            (self.callback)(position);
            self.last_reported = Some(position);
        }
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("watermark", &self.watermark)
            .field("last_reported", &self.last_reported)
            .finish_non_exhaustive()
    }
}

/// Copies `source` into `dest` in `buffer_size` chunks, returning the total
/// bytes copied.
///
/// Cancellation is observed before every read and before every write; once
/// the token fires, no further bytes are written and
/// [`TransferError::Cancelled`] is returned. The destination is flushed
/// after the final chunk.
///
/// # Errors
///
/// Returns [`TransferError::Cancelled`] on cancellation and
/// [`TransferError::Io`] on read/write failures.
pub async fn copy<R, W>(
    source: &mut R,
    dest: &mut W,
    buffer_size: usize,
    cancel: &CancellationToken,
    mut progress: Option<Progress<'_>>,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut position: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let read = source.read(&mut buf).await.map_err(TransferError::io)?;
        if read == 0 {
            break;
        }
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        dest.write_all(&buf[..read])
            .await
            .map_err(TransferError::io)?;
        position += read as u64;
        if let Some(state) = progress.as_mut() {
            state.advance(position);
        }
    }

    dest.flush().await.map_err(TransferError::io)?;

    if let Some(state) = progress.as_mut() {
        state.finish(position);
    }

    Ok(position)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records every value passed to the progress callback; fires at every
    /// `step` bytes.
    fn recording_progress(
        step: u64,
        calls: Arc<Mutex<Vec<u64>>>,
    ) -> impl FnMut(u64) -> u64 + Send {
        move |position| {
            calls.lock().unwrap().push(position);
            position + step
        }
    }

    #[tokio::test]
    async fn test_copy_moves_all_bytes() {
        let data = vec![7u8; 10_000];
        let mut source = std::io::Cursor::new(data.clone());
        let mut dest = Vec::new();

        let copied = copy(&mut source, &mut dest, 1024, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(copied, 10_000);
        assert_eq!(dest, data);
    }

    #[tokio::test]
    async fn test_copy_empty_source_reports_zero() {
        let mut source = std::io::Cursor::new(Vec::<u8>::new());
        let mut dest = Vec::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut callback = recording_progress(1024, Arc::clone(&calls));

        let copied = copy(
            &mut source,
            &mut dest,
            1024,
            &CancellationToken::new(),
            Some(Progress::new(&mut callback)),
        )
        .await
        .unwrap();

        assert_eq!(copied, 0);
        // Even an empty transfer yields exactly one progress signal.
        assert_eq!(*calls.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_progress_monotonic_and_terminal() {
        let data = vec![1u8; 10_000];
        let mut source = std::io::Cursor::new(data);
        let mut dest = Vec::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut callback = recording_progress(3000, Arc::clone(&calls));

        copy(
            &mut source,
            &mut dest,
            1000,
            &CancellationToken::new(),
            Some(Progress::new(&mut callback)),
        )
        .await
        .unwrap();

        let calls = calls.lock().unwrap();
        assert!(!calls.is_empty());
        assert!(
            calls.windows(2).all(|pair| pair[0] <= pair[1]),
            "progress values must be non-decreasing: {calls:?}"
        );
        assert_eq!(*calls.last().unwrap(), 10_000);
    }

    #[tokio::test]
    async fn test_trailing_progress_not_duplicated() {
        // Watermark step of 1 fires on every chunk, so the final chunk's
        // periodic call already reports the terminal position and no
        // trailing call is added.
        let data = vec![2u8; 4096];
        let mut source = std::io::Cursor::new(data);
        let mut dest = Vec::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut callback = recording_progress(1, Arc::clone(&calls));

        copy(
            &mut source,
            &mut dest,
            1024,
            &CancellationToken::new(),
            Some(Progress::new(&mut callback)),
        )
        .await
        .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(*calls.last().unwrap(), 4096);
        assert_eq!(
            calls.iter().filter(|&&value| value == 4096).count(),
            1,
            "terminal position must be reported exactly once: {calls:?}"
        );
    }

    #[tokio::test]
    async fn test_pre_cancelled_copy_writes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut source = std::io::Cursor::new(vec![9u8; 1024]);
        let mut dest = Vec::new();

        let result = copy(&mut source, &mut dest, 256, &cancel, None).await;
        assert!(matches!(result, Err(TransferError::Cancelled)));
        assert!(dest.is_empty(), "no bytes may be written after cancellation");
    }

    #[tokio::test]
    async fn test_cancellation_mid_copy_stops_before_next_chunk() {
        let cancel = CancellationToken::new();
        let mut source = std::io::Cursor::new(vec![5u8; 4096]);
        let mut dest = Vec::new();

        // Cancel from inside the first progress call: the loop must observe
        // the token before reading the next chunk.
        let cancel_clone = cancel.clone();
        let mut callback: Box<dyn FnMut(u64) -> u64 + Send> = Box::new(move |position| {
            cancel_clone.cancel();
            position + 1_000_000
        });

        let result = copy(
            &mut source,
            &mut dest,
            1024,
            &cancel,
            Some(Progress::new(&mut callback)),
        )
        .await;

        assert!(matches!(result, Err(TransferError::Cancelled)));
        assert_eq!(dest.len(), 1024, "only the first chunk may be written");
    }
}
