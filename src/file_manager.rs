use futures::StreamExt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::AssetFailure;
use crate::transport::ChunkStream;

/// Places output files, optionally under a configured output directory.
#[derive(Clone, Debug, Default)]
pub struct FileManager {
    base_dir: Option<PathBuf>,
}

impl FileManager {
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
        }
    }

    /// Maps a path relative to the output location onto the disk path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(relative),
            None => PathBuf::from(relative),
        }
    }

    pub fn create_parent_dirs(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// Writes `content` to `relative`, overwriting any existing file.
    pub fn save_file(&self, relative: &str, content: &[u8]) -> io::Result<PathBuf> {
        let path = self.resolve(relative);
        self.create_parent_dirs(&path)?;

        let mut file = fs::File::create(&path)?;
        file.write_all(content)?;

        Ok(path)
    }

    /// Drains `chunks` into `relative` as they arrive. The chunks land in a
    /// temporary file beside the destination, which only replaces the
    /// destination once the stream has finished.
    pub async fn stream_to_file(
        &self,
        relative: &str,
        mut chunks: ChunkStream,
    ) -> Result<(PathBuf, u64), AssetFailure> {
        let path = self.resolve(relative);
        let io_failure = |source: io::Error| AssetFailure::Io {
            path: path.clone(),
            source,
        };

        self.create_parent_dirs(&path).map_err(io_failure)?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut partial = NamedTempFile::new_in(parent).map_err(io_failure)?;

        let mut written = 0u64;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            partial.write_all(&chunk).map_err(io_failure)?;
            written += chunk.len() as u64;
        }
        partial.flush().map_err(io_failure)?;
        partial.persist(&path).map_err(|e| io_failure(e.error))?;

        Ok((path, written))
    }
}
