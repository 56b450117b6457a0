//! 原始字节回放传输
//!
//! 读取抓包文件 (或标准输入) 中的原始字节流，按固定块大小交付，
//! 可选地按通知间隔限速。到达 EOF 即视为断开。

use std::path::Path;
use std::time::Duration;

use bytes::BytesMut;
use contracts::{ContractError, RawChunk, Transport};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::error::{IngestionError, Result};

/// Default chunk size, roughly one BLE notification
pub const DEFAULT_REPLAY_CHUNK: usize = 244;

/// Replays raw bytes from any async reader
pub struct ReplayTransport {
    name: String,
    reader: Box<dyn AsyncRead + Send + Unpin>,
    chunk_size: usize,
    pace: Option<Duration>,
    connected: bool,
    bytes_read: u64,
    failure: Option<ContractError>,
}

impl std::fmt::Debug for ReplayTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayTransport")
            .field("name", &self.name)
            .field("chunk_size", &self.chunk_size)
            .field("pace", &self.pace)
            .field("connected", &self.connected)
            .field("bytes_read", &self.bytes_read)
            .finish()
    }
}

impl ReplayTransport {
    /// Open a capture file
    ///
    /// # Errors
    /// `Open` if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| IngestionError::open(path, e))?;

        let name = path
            .file_name()
            .map(|n| format!("replay:{}", n.to_string_lossy()))
            .unwrap_or_else(|| "replay".to_string());
        Ok(Self::from_reader(name, file))
    }

    /// Replay standard input
    pub fn stdin() -> Self {
        Self::from_reader("stdin", tokio::io::stdin())
    }

    pub fn from_reader(
        name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
            chunk_size: DEFAULT_REPLAY_CHUNK,
            pace: None,
            connected: true,
            bytes_read: 0,
            failure: None,
        }
    }

    /// Bytes per delivered chunk (at least 1)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Delay before each chunk, to mimic the notification rate
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl Transport for ReplayTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_chunk(&mut self) -> Option<RawChunk> {
        if !self.connected {
            return None;
        }
        if let Some(pace) = self.pace {
            tokio::time::sleep(pace).await;
        }

        let mut buf = BytesMut::zeroed(self.chunk_size);
        let n = match self.reader.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!(transport = %self.name, error = %e, "replay read failed");
                self.failure = Some(ContractError::transport(&self.name, e.to_string()));
                self.connected = false;
                return None;
            }
        };

        if n == 0 {
            debug!(transport = %self.name, bytes = self.bytes_read, "replay exhausted");
            self.connected = false;
            return None;
        }

        buf.truncate(n);
        self.bytes_read += n as u64;
        Some(RawChunk::new(buf.freeze()))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn take_error(&mut self) -> Option<ContractError> {
        self.failure.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_replay_file_in_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let mut transport = ReplayTransport::open(file.path())
            .await
            .unwrap()
            .with_chunk_size(300);
        assert!(transport.name().starts_with("replay:"));

        let mut got = Vec::new();
        while let Some(chunk) = transport.read_chunk().await {
            assert!(chunk.len() <= 300);
            got.extend_from_slice(&chunk);
        }

        assert_eq!(got, data);
        assert_eq!(transport.bytes_read(), 1000);
        assert!(!transport.is_connected());
        assert!(transport.read_chunk().await.is_none());
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "usb serial unplugged",
            )))
        }
    }

    #[tokio::test]
    async fn test_read_error_is_not_end_of_file() {
        let mut transport = ReplayTransport::from_reader("serial", FailingReader);

        assert!(transport.read_chunk().await.is_none());
        assert!(!transport.is_connected());
        let err = transport.take_error().unwrap();
        assert!(err.to_string().contains("usb serial unplugged"));

        // A clean EOF leaves no error behind
        let mut eof = ReplayTransport::from_reader("empty", &b""[..]);
        assert!(eof.read_chunk().await.is_none());
        assert!(eof.take_error().is_none());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = ReplayTransport::open("/definitely/not/here.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::Open { .. }));
    }

    #[tokio::test]
    async fn test_from_reader() {
        let mut transport = ReplayTransport::from_reader("mem", &b"abc"[..]).with_chunk_size(2);

        assert_eq!(transport.read_chunk().await.unwrap().as_bytes(), b"ab");
        assert_eq!(transport.read_chunk().await.unwrap().as_bytes(), b"c");
        assert!(transport.read_chunk().await.is_none());
    }
}
