//! On-the-fly zip archives for folder downloads.

use std::fs::File;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate every regular file below `dir` into an in-memory archive.
///
/// Entry names are relative to `dir` with `/` separators. Empty directories
/// are not recorded. Blocking; run it on the blocking pool.
pub fn zip_directory(dir: &Path) -> io::Result<Vec<u8>> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    let mut count = 0usize;
    for path in regular_files(dir)? {
        let name = entry_name(dir, &path);
        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        let mut source = File::open(&path)?;
        io::copy(&mut source, &mut writer)?;
        count += 1;
    }
    writer.flush()?;

    let bytes = writer.finish().map_err(zip_error)?.into_inner();
    tracing::debug!("Zipped {} file(s) from {:?} ({} bytes)", count, dir, bytes.len());
    Ok(bytes)
}

// sorted so the archive layout is stable
fn regular_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

fn entry_name(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn zip_error(e: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

