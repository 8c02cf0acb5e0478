// Vector store module
// Exact flat index plus aligned chunk metadata, persisted as a pair


pub mod flat_index;
pub mod persist;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::RagError;
pub use flat_index::{FlatIndex, Neighbor, distance_to_score, is_finite, squared_l2};
pub use persist::{INDEX_FILE_NAME, METADATA_FILE_NAME, StoreArtifacts};

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// ID of the document this chunk belongs to
    pub doc_id: String,
    /// The actual text content of the chunk
    pub text: String,
}

impl ChunkMetadata {
    #[inline]
    pub fn new(doc_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: text.into(),
        }
    }
}

/// Search result from vector similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// `1 / (1 + distance)`, higher is more similar
    pub score: f32,
    pub distance: f32,
    pub metadata: ChunkMetadata,
}

/// Summary of the store contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub vector_count: usize,
    pub dimension: usize,
    /// Chunk count per document id
    pub documents: BTreeMap<String, usize>,
}

/// The index and its metadata always change together under the same guard.
#[derive(Debug)]
struct StoreState {
    index: FlatIndex,
    metadata: Vec<ChunkMetadata>,
}

/// Flat vector store with whole-store persistence.
///
/// `add` holds the write guard across the append and the persist, so readers
/// never see an index whose length differs from the metadata list, and two adds
/// never interleave their writes to disk.
#[derive(Debug)]
pub struct VectorStore {
    artifacts: StoreArtifacts,
    state: RwLock<StoreState>,
}

impl VectorStore {
    /// Open the store in `dir`, loading the persisted pair if both artifacts exist
    #[inline]
    pub fn open<P: AsRef<Path>>(dir: P, dimension: usize) -> Result<Self, RagError> {
        if dimension == 0 {
            return Err(RagError::Config(
                "vector dimension must be greater than zero".to_string(),
            ));
        }

        let artifacts = StoreArtifacts::in_dir(dir);
        debug!("Opening vector store at {}", artifacts.dir().display());

        let state = match artifacts.load()? {
            Some((index, metadata)) => {
                if index.dimension() != dimension {
                    return Err(RagError::MalformedPersistedState {
                        path: artifacts.index_path().to_path_buf(),
                        reason: format!(
                            "index dimension {} does not match configured dimension {}",
                            index.dimension(),
                            dimension
                        ),
                    });
                }
                StoreState { index, metadata }
            }
            None => StoreState {
                index: FlatIndex::new(dimension),
                metadata: Vec::new(),
            },
        };

        info!(
            "Vector store ready with {} vectors of dimension {}",
            state.index.len(),
            dimension
        );

        Ok(Self {
            artifacts,
            state: RwLock::new(state),
        })
    }

    #[inline]
    pub fn storage_dir(&self) -> &Path {
        self.artifacts.dir()
    }

    #[inline]
    pub fn dimension(&self) -> Result<usize, RagError> {
        Ok(self.read()?.index.dimension())
    }

    #[inline]
    pub fn len(&self) -> Result<usize, RagError> {
        Ok(self.read()?.index.len())
    }

    #[inline]
    pub fn is_empty(&self) -> Result<bool, RagError> {
        Ok(self.len()? == 0)
    }

    /// Append a batch of vectors and their metadata, then persist the whole store.
    ///
    /// Nothing is appended unless every vector has the store's dimension and the
    /// two batches have equal length. If persisting fails the batch stays in
    /// memory and the previous on-disk pair is kept; the error is returned.
    #[inline]
    pub fn add(
        &self,
        vectors: Vec<Vec<f32>>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<(), RagError> {
        if vectors.len() != metadatas.len() {
            return Err(RagError::BatchSizeMismatch {
                vectors: vectors.len(),
                metadatas: metadatas.len(),
            });
        }

        if vectors.is_empty() {
            return Ok(());
        }

        let mut state = self.write()?;
        state.index.add(&vectors)?;
        state.metadata.extend(metadatas);

        debug!(
            "Appended {} vectors, store now holds {}",
            vectors.len(),
            state.index.len()
        );

        self.artifacts
            .write(&state.index, &state.metadata)
            .inspect_err(|e| {
                error!(
                    "Failed to persist vector store to {}, in-memory state is ahead of disk: {}",
                    self.artifacts.dir().display(),
                    e
                );
            })
    }

    /// Return up to `k` stored chunks nearest to `query`, most similar first
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidQueryParameters(
                "k must be greater than zero".to_string(),
            ));
        }

        let state = self.read()?;

        if query.len() != state.index.dimension() {
            return Err(RagError::InvalidQueryParameters(format!(
                "query has dimension {} but the store holds vectors of dimension {}",
                query.len(),
                state.index.dimension()
            )));
        }

        if !is_finite(query) {
            return Err(RagError::InvalidQueryParameters(
                "query contains a NaN or infinite component".to_string(),
            ));
        }

        if state.index.is_empty() {
            return Ok(Vec::new());
        }

        let results = state
            .index
            .search(query, k)?
            .into_iter()
            .filter_map(|neighbor| {
                state
                    .metadata
                    .get(neighbor.position)
                    .map(|metadata| ScoredChunk {
                        score: distance_to_score(neighbor.distance),
                        distance: neighbor.distance,
                        metadata: metadata.clone(),
                    })
            })
            .collect::<Vec<_>>();

        debug!("Search returned {} of {} requested", results.len(), k);
        Ok(results)
    }

    /// Vector count, dimension and chunk count per document
    #[inline]
    pub fn stats(&self) -> Result<StoreStats, RagError> {
        let state = self.read()?;

        let mut documents = BTreeMap::new();
        for metadata in &state.metadata {
            *documents.entry(metadata.doc_id.clone()).or_insert(0) += 1;
        }

        Ok(StoreStats {
            vector_count: state.index.len(),
            dimension: state.index.dimension(),
            documents,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, RagError> {
        self.state.read().map_err(|_| RagError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, RagError> {
        self.state.write().map_err(|_| RagError::LockPoisoned)
    }
}
