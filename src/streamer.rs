//! Whole-file (200) and single-range (206) response bodies.
//!
//! Bodies are lazy: nothing is read from disk until the transport polls the
//! stream, and each poll reads at most one chunk.

use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};

use crate::error::{Result, ShareError};
use crate::range::RangeSpec;
use crate::CHUNK_SIZE;

/// finite, single-use sequence of file chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Status, headers and body for a streamed file.
pub struct MediaResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub content_length: u64,
    pub body: ChunkStream,
}

impl std::fmt::Debug for MediaResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish()
    }
}

impl MediaResponse {
    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for MediaResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from_stream(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Parse `range_header` against `file_size` and stream the matching bytes of `path`.
///
/// An unsatisfiable range fails before the file is opened, so no body bytes
/// are ever produced for it.
pub async fn serve_file(
    path: &Path,
    file_size: u64,
    content_type: &str,
    range_header: Option<&str>,
) -> Result<MediaResponse> {
    let range = RangeSpec::parse(range_header, file_size)?;
    stream_file(path, file_size, content_type, range).await
}

/// Build the response for an already validated range (or the whole file).
pub async fn stream_file(
    path: &Path,
    file_size: u64,
    content_type: &str,
    range: Option<RangeSpec>,
) -> Result<MediaResponse> {
    let mut file = File::open(path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ShareError::NotFound
        } else {
            tracing::error!("Failed to open {:?}: {}", path, e);
            ShareError::Io(e)
        }
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    let (status, start, length) = match range {
        None => (StatusCode::OK, 0, file_size),
        Some(range) => {
            let value = HeaderValue::from_str(&range.content_range(file_size))
                .map_err(|e| ShareError::BadRequest(e.to_string()))?;
            headers.insert(header::CONTENT_RANGE, value);
            (StatusCode::PARTIAL_CONTENT, range.start, range.len())
        }
    };
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    tracing::debug!(
        "Streaming {:?}: status {} offset {} length {}",
        path,
        status.as_u16(),
        start,
        length
    );

    Ok(MediaResponse {
        status,
        headers,
        content_length: length,
        body: chunk_stream(file, length, CHUNK_SIZE),
    })
}

/// Yield at most `length` bytes of `reader` in chunks no larger than `chunk_size`.
///
/// Reading stops once `length` bytes were produced even if the reader has more.
pub fn chunk_stream<R>(reader: R, length: u64, chunk_size: usize) -> ChunkStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let chunk_size = chunk_size.max(1);
    Box::pin(futures::stream::try_unfold(
        reader.take(length),
        move |mut reader| async move {
            let mut buf = BytesMut::zeroed(chunk_size);
            let n = reader.read(&mut buf[..]).await?;
            if n == 0 {
                return Ok::<_, io::Error>(None);
            }
            buf.truncate(n);
            tracing::trace!("Read chunk of {} bytes", n);
            Ok(Some((buf.freeze(), reader)))
        },
    ))
}
