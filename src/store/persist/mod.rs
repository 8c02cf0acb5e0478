
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::ChunkMetadata;
use super::flat_index::FlatIndex;
use crate::RagError;

pub const INDEX_FILE_NAME: &str = "flat.index";
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// The pair of on-disk artifacts that make up a persisted store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreArtifacts {
    dir: PathBuf,
    index_path: PathBuf,
    metadata_path: PathBuf,
}

/// Which of the two artifacts exist on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactPresence {
    Both,
    Neither,
    IndexOnly,
    MetadataOnly,
}

impl StoreArtifacts {
    #[inline]
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            index_path: dir.join(INDEX_FILE_NAME),
            metadata_path: dir.join(METADATA_FILE_NAME),
            dir,
        }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    #[inline]
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    #[inline]
    pub fn presence(&self) -> ArtifactPresence {
        match (self.index_path.exists(), self.metadata_path.exists()) {
            (true, true) => ArtifactPresence::Both,
            (false, false) => ArtifactPresence::Neither,
            (true, false) => ArtifactPresence::IndexOnly,
            (false, true) => ArtifactPresence::MetadataOnly,
        }
    }

    /// Load the persisted pair.
    ///
    /// Returns `Ok(None)` unless both artifacts exist. An artifact that exists but
    /// cannot be read or parsed, or a pair whose cardinalities disagree, is an error.
    #[inline]
    pub fn load(&self) -> Result<Option<(FlatIndex, Vec<ChunkMetadata>)>, RagError> {
        match self.presence() {
            ArtifactPresence::Both => {}
            ArtifactPresence::Neither => {
                debug!("No persisted store found in {}", self.dir.display());
                return Ok(None);
            }
            ArtifactPresence::IndexOnly | ArtifactPresence::MetadataOnly => {
                warn!(
                    "Only one store artifact present in {}, starting empty",
                    self.dir.display()
                );
                return Ok(None);
            }
        }

        let index: FlatIndex = read_json(&self.index_path)?;
        index
            .check_consistency()
            .map_err(|reason| malformed(&self.index_path, reason))?;

        let metadata: Vec<ChunkMetadata> = read_json(&self.metadata_path)?;

        if metadata.len() != index.len() {
            return Err(malformed(
                &self.metadata_path,
                format!(
                    "{} metadata records do not match {} indexed vectors",
                    metadata.len(),
                    index.len()
                ),
            ));
        }

        debug!(
            "Loaded {} vectors from {}",
            index.len(),
            self.index_path.display()
        );

        Ok(Some((index, metadata)))
    }

    /// Write both artifacts, replacing any previous pair.
    ///
    /// Both are fully written and synced to temporary files in the store directory
    /// before either replaces its predecessor, so a failure while writing leaves the
    /// previous pair untouched.
    #[inline]
    pub fn write(&self, index: &FlatIndex, metadata: &[ChunkMetadata]) -> Result<(), RagError> {
        fs::create_dir_all(&self.dir)?;

        let index_file = write_temp_json(&self.dir, index)?;
        let metadata_file = write_temp_json(&self.dir, metadata)?;

        index_file
            .persist(&self.index_path)
            .map_err(|e| e.error)?;
        metadata_file
            .persist(&self.metadata_path)
            .map_err(|e| e.error)?;

        debug!(
            "Persisted {} vectors to {}",
            index.len(),
            self.dir.display()
        );
        Ok(())
    }
}

fn write_temp_json<T: Serialize + ?Sized>(dir: &Path, value: &T) -> io::Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer(&mut writer, value).map_err(io::Error::from)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    Ok(temp)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RagError> {
    let bytes = fs::read(path).map_err(|e| malformed(path, e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| malformed(path, e.to_string()))
}

fn malformed(path: &Path, reason: String) -> RagError {
    RagError::MalformedPersistedState {
        path: path.to_path_buf(),
        reason,
    }
}
