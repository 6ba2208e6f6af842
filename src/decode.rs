//! Streaming gzip decode of one response body into the output file.

use flate2::write::MultiGzDecoder;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{PullError, Result};
use crate::source::BodyStream;

/// Decompress `body` chunk by chunk into `out`, the file at `path`.
///
/// Returns the number of decompressed bytes written. A body with no bytes at
/// all, or one whose gzip members inflate to nothing, yields `Ok(0)`.
pub async fn append_gzip_body<W: Write>(
    body: &mut dyn BodyStream,
    out: W,
    path: &Path,
) -> Result<u64> {
    let mut decoder = MultiGzDecoder::new(CountingWriter::new(out));
    let mut received = 0usize;

    while let Some(chunk) = body.next_chunk().await? {
        received += chunk.len();
        if let Err(e) = decoder.write_all(&chunk) {
            return Err(classify(decoder.get_mut(), e, path));
        }
    }

    if received == 0 {
        return Ok(0);
    }

    if let Err(e) = decoder.try_finish() {
        return Err(classify(decoder.get_mut(), e, path));
    }
    let mut writer = decoder.finish().map_err(PullError::Decode)?;
    if let Err(e) = writer.flush() {
        return Err(classify(&mut writer, e, path));
    }

    Ok(writer.written)
}

/// Attribute an I/O error either to the sink or to the gzip stream.
fn classify<W>(writer: &mut CountingWriter<W>, err: io::Error, path: &Path) -> PullError {
    match writer.sink_error.take() {
        Some(sink) => PullError::fs("append output file", path, sink),
        None => PullError::Decode(err),
    }
}

struct CountingWriter<W> {
    inner: W,
    written: u64,
    sink_error: Option<io::Error>,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            written: 0,
            sink_error: None,
        }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.write(buf) {
            Ok(n) => {
                self.written += n as u64;
                Ok(n)
            }
            Err(e) => {
                let kind = e.kind();
                self.sink_error = Some(e);
                Err(kind.into())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().inspect_err(|e| {
            self.sink_error = Some(io::Error::new(e.kind(), e.to_string()));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::collections::VecDeque;

    struct Chunks(VecDeque<Bytes>);

    impl Chunks {
        fn split(data: &[u8], size: usize) -> Self {
            Chunks(data.chunks(size).map(Bytes::copy_from_slice).collect())
        }
    }

    #[async_trait]
    impl BodyStream for Chunks {
        async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
            Ok(self.0.pop_front())
        }
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn decodes_body_split_across_chunks() {
        let text = b"GET /index.html 200\nGET /logo.png 304\n".repeat(50);
        let mut body = Chunks::split(&gzip(&text), 7);
        let mut out = Vec::new();

        let written = append_gzip_body(&mut body, &mut out, Path::new("out.log")).await.unwrap();

        assert_eq!(written, text.len() as u64);
        assert_eq!(out, text);
    }

    #[tokio::test]
    async fn concatenated_members_are_all_decoded() {
        let mut data = gzip(b"first\n");
        data.extend(gzip(b"second\n"));
        let mut body = Chunks::split(&data, 16);
        let mut out = Vec::new();

        append_gzip_body(&mut body, &mut out, Path::new("out.log")).await.unwrap();

        assert_eq!(out, b"first\nsecond\n");
    }

    #[tokio::test]
    async fn empty_body_is_zero_bytes() {
        let mut body = Chunks(VecDeque::new());
        let mut out = Vec::new();

        let written = append_gzip_body(&mut body, &mut out, Path::new("out.log")).await.unwrap();

        assert_eq!(written, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn empty_gzip_stream_is_zero_bytes() {
        let mut body = Chunks::split(&gzip(b""), 64);
        let mut out = Vec::new();

        let written = append_gzip_body(&mut body, &mut out, Path::new("out.log")).await.unwrap();

        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn malformed_header_is_a_decode_error() {
        let mut body = Chunks::split(b"<html>not gzip</html>", 64);
        let mut out = Vec::new();

        let err = append_gzip_body(&mut body, &mut out, Path::new("out.log")).await.unwrap_err();

        assert!(matches!(err, PullError::Decode(_)));
    }

    #[tokio::test]
    async fn truncated_stream_is_a_decode_error() {
        let data = gzip(&b"0123456789".repeat(100));
        let mut body = Chunks::split(&data[..data.len() / 2], 32);
        let mut out = Vec::new();

        let err = append_gzip_body(&mut body, &mut out, Path::new("out.log")).await.unwrap_err();

        assert!(matches!(err, PullError::Decode(_)));
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn sink_failure_is_a_filesystem_error() {
        let mut body = Chunks::split(&gzip(&b"x".repeat(100_000)), 4096);

        let err = append_gzip_body(&mut body, FullDisk, Path::new("out.log")).await.unwrap_err();

        assert!(matches!(err, PullError::Filesystem { .. }));
    }
}
