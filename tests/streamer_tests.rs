use axum::http::{header, StatusCode};
use bytes::Bytes;
use futures::TryStreamExt;
use localshare::range::RangeSpec;
use localshare::streamer::{chunk_stream, serve_file, stream_file, MediaResponse};
use localshare::{ShareError, CHUNK_SIZE};
use std::path::PathBuf;

// deterministic but non-repeating-looking content
fn fixture(dir: &tempfile::TempDir, name: &str, len: usize) -> (PathBuf, Vec<u8>) {
    let data: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
    let path = dir.path().join(name);
    std::fs::write(&path, &data).unwrap();
    (path, data)
}

async fn collect(media: MediaResponse) -> (Vec<Bytes>, Vec<u8>) {
    let chunks: Vec<Bytes> = media.body.try_collect().await.unwrap();
    let joined = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    (chunks, joined)
}

#[tokio::test]
async fn test_full_file_stream() {
    let dir = tempfile::tempdir().unwrap();
    let (path, data) = fixture(&dir, "clip.mp4", 3 * CHUNK_SIZE + 17);

    let media = serve_file(&path, data.len() as u64, "video/mp4", None).await.unwrap();
    assert_eq!(media.status, StatusCode::OK);
    assert_eq!(media.header(header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(media.header(header::CONTENT_LENGTH), Some(data.len().to_string().as_str()));
    assert_eq!(media.header(header::CONTENT_TYPE), Some("video/mp4"));
    assert!(media.header(header::CONTENT_RANGE).is_none());

    let (chunks, body) = collect(media).await;
    assert_eq!(body, data);
    assert!(chunks.iter().all(|c| c.len() <= CHUNK_SIZE));
}

#[tokio::test]
async fn test_partial_ranges_match_slices() {
    let dir = tempfile::tempdir().unwrap();
    let (path, data) = fixture(&dir, "song.mp3", 20_000);
    let size = data.len() as u64;

    for (start, end) in [(0u64, 0u64), (0, 19_999), (1, 8192), (8191, 8193), (12_345, 19_999), (19_999, 19_999)] {
        let header_value = format!("bytes={}-{}", start, end);
        let media = serve_file(&path, size, "audio/mpeg", Some(&header_value)).await.unwrap();

        assert_eq!(media.status, StatusCode::PARTIAL_CONTENT);
        let expected_range = format!("bytes {}-{}/{}", start, end, size);
        assert_eq!(media.header(header::CONTENT_RANGE), Some(expected_range.as_str()));
        let expected_len = (end - start + 1).to_string();
        assert_eq!(media.header(header::CONTENT_LENGTH), Some(expected_len.as_str()));

        let (_, body) = collect(media).await;
        assert_eq!(body, &data[start as usize..=end as usize], "range {}", header_value);
    }
}

#[tokio::test]
async fn test_unsatisfiable_range_emits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (path, data) = fixture(&dir, "a.bin", 100);
    let size = data.len() as u64;

    for value in ["bytes=100-", "bytes=0-100", "bytes=5-4", "bytes=-10"] {
        let result = serve_file(&path, size, "application/octet-stream", Some(value)).await;
        assert!(
            matches!(result, Err(ShareError::RangeNotSatisfiable { size: 100 })),
            "{} should be unsatisfiable",
            value
        );
    }
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.mp4");
    let result = stream_file(&path, 10, "video/mp4", None).await;
    assert!(matches!(result, Err(ShareError::NotFound)));
}

#[tokio::test]
async fn test_stream_stops_at_declared_length() {
    let dir = tempfile::tempdir().unwrap();
    let (path, data) = fixture(&dir, "grown.bin", 1000);

    // file grew after it was stat'ed: only the declared bytes go out
    let media = stream_file(&path, 600, "application/octet-stream", None).await.unwrap();
    let (_, body) = collect(media).await;
    assert_eq!(body, &data[..600]);

    let range = Some(RangeSpec { start: 100, end: 199 });
    let media = stream_file(&path, 1000, "application/octet-stream", range).await.unwrap();
    let (_, body) = collect(media).await;
    assert_eq!(body, &data[100..200]);
}

#[tokio::test]
async fn test_rechunking_does_not_change_bytes() {
    let data: Vec<u8> = (0..50_000u32).map(|i| (i % 256) as u8).collect();

    for chunk_size in [1, 7, 4096, 8192, 65_536] {
        let reader = std::io::Cursor::new(data.clone());
        let chunks: Vec<Bytes> = chunk_stream(reader, data.len() as u64, chunk_size)
            .try_collect()
            .await
            .unwrap();
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= chunk_size));
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(joined, data, "chunk size {}", chunk_size);
    }
}

#[tokio::test]
async fn test_large_media_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("video.mp4");
    let file = std::fs::File::create(&path).unwrap();
    file.set_len(10_000_000).unwrap();

    let media = serve_file(&path, 10_000_000, "video/mp4", Some("bytes=1000000-1999999"))
        .await
        .unwrap();
    assert_eq!(media.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        media.header(header::CONTENT_RANGE),
        Some("bytes 1000000-1999999/10000000")
    );
    assert_eq!(media.content_length, 1_000_000);
    let (_, body) = collect(media).await;
    assert_eq!(body.len(), 1_000_000);

    let result = serve_file(&path, 10_000_000, "video/mp4", Some("bytes=20000000-")).await;
    assert!(matches!(result, Err(ShareError::RangeNotSatisfiable { .. })));
}
