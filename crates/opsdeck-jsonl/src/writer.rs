//! Atomic rewrites and single-record appends.
//!
//! Rewrites use the temp-file-then-rename pattern: renames within one
//! filesystem are atomic on POSIX, so a reader never observes a
//! half-written collection and a crash leaves the previous file intact.

use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Atomically replace a JSONL file with the given records.
///
/// All records are serialized to a sibling temp file first; the temp file is
/// then renamed over the target. On failure the target is left unchanged and
/// the temp file is removed on a best-effort basis.
///
/// # Errors
///
/// Returns an error if serialization fails, the temp file cannot be written,
/// or the rename fails (e.g. a cross-filesystem target).
pub async fn write_jsonl_atomic<T>(path: &Path, records: &[T]) -> Result<()>
where
    T: Serialize,
{
    let temp_path = temp_sibling(path);

    if let Err(e) = write_all(&temp_path, records).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Append a single record to the end of a JSONL file.
///
/// The file is created if it does not exist. The record and trailing
/// newline are written in one buffered flush; this is the growth path for
/// append-only logs such as the audit trail.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub async fn append_jsonl<T>(path: &Path, record: &T) -> Result<()>
where
    T: Serialize,
{
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    let ext = match path.extension() {
        Some(ext) => {
            let mut ext = ext.to_os_string();
            ext.push(".tmp");
            ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp.set_extension(ext);
    temp
}

async fn write_all<T>(temp_path: &Path, records: &[T]) -> Result<()>
where
    T: Serialize,
{
    let file = File::create(temp_path).await?;
    let mut writer = BufWriter::new(file);
    for record in records {
        let json = serde_json::to_vec(record)?;
        writer.write_all(&json).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    Ok(())
}
