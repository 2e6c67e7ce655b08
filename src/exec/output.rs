//! Bounded capture of child/sandbox output

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK: usize = 8 * 1024;

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    dropped: usize,
}

/// Shared, size-capped output accumulator
///
/// Clones share the same buffer. Bytes beyond the cap are counted but not kept.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    inner: Arc<Mutex<Captured>>,
    limit: usize,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Captured::default())),
            limit,
        }
    }

    pub fn push(&self, chunk: impl AsRef<[u8]>) {
        let chunk = chunk.as_ref();
        let mut captured = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let room = self.limit.saturating_sub(captured.bytes.len());
        let kept = room.min(chunk.len());
        captured.bytes.extend_from_slice(&chunk[..kept]);
        captured.dropped += chunk.len() - kept;
    }

    pub fn is_truncated(&self) -> bool {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).dropped > 0
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Captured text (lossy UTF-8) with a marker if anything was dropped
    pub fn snapshot(&self) -> String {
        let captured = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let mut text = String::from_utf8_lossy(&captured.bytes).into_owned();
        if captured.dropped > 0 {
            if !text.ends_with('\n') && !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&format!(
                "[output truncated: {} more bytes not shown]\n",
                captured.dropped
            ));
        }
        text
    }
}

/// Read `reader` to EOF into `buffer`, as data arrives
///
/// Keeps reading past the cap so a chatty child never blocks on a full pipe.
pub async fn drain<R>(mut reader: R, buffer: OutputBuffer) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.push(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_everything_under_limit() {
        let buffer = OutputBuffer::new(64);
        buffer.push("hello ");
        buffer.clone().push("world\n");
        assert_eq!(buffer.snapshot(), "hello world\n");
        assert!(!buffer.is_truncated());
    }

    #[test]
    fn test_truncates_with_marker() {
        let buffer = OutputBuffer::new(4);
        buffer.push("abcdef");
        buffer.push("gh");
        assert!(buffer.is_truncated());
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.snapshot(), "abcd\n[output truncated: 4 more bytes not shown]\n");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let buffer = OutputBuffer::new(16);
        buffer.push([0x66, 0xff, 0x6f]);
        assert_eq!(buffer.snapshot(), "f\u{fffd}o");
    }

    #[tokio::test]
    async fn test_drain_reads_to_end() {
        let buffer = OutputBuffer::new(1024);
        let data: &[u8] = b"line one\nline two\n";
        drain(data, buffer.clone()).await.unwrap();
        assert_eq!(buffer.snapshot(), "line one\nline two\n");
    }
}
