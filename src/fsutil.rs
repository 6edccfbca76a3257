//! Atomic file persistence shared by the rule writer and the config writer.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write `contents` to a temporary sibling, fsync, then rename over `path`.
/// A crash mid-write never leaves a truncated file at the target.
pub async fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = sibling_with_suffix(path, ".tmp");
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Copy `path` to `path.orig` once, before the first-ever overwrite.
/// Subsequent calls are no-ops; a missing original is also a no-op.
pub async fn backup_once(path: &Path) -> io::Result<()> {
    let backup = sibling_with_suffix(path, ".orig");
    if fs::try_exists(&backup).await? {
        return Ok(());
    }
    match fs::copy(path, &backup).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
