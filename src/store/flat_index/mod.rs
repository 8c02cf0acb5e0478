
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::RagError;

/// Exact nearest-neighbor index over fixed-dimension vectors.
///
/// Vectors are stored row-major in a single buffer. A vector's ordinal position
/// is its only identifier, and the index only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    count: usize,
    vectors: Vec<f32>,
}

/// A candidate returned from a flat search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Ordinal position of the stored vector
    pub position: usize,
    /// Squared euclidean distance to the query
    pub distance: f32,
}

impl FlatIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            count: 0,
            vectors: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get the stored vector at `position`
    #[cfg(test)]
    pub(crate) fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.count {
            return None;
        }
        let start = position * self.dimension;
        self.vectors.get(start..start + self.dimension)
    }

    /// Append a batch of vectors. Every vector is checked before any is appended,
    /// so a failed call leaves the index untouched.
    #[inline]
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), RagError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        // Non-finite floats serialize as JSON null and could never be loaded back.
        if let Some(position) = vectors.iter().position(|v| !is_finite(v)) {
            return Err(RagError::NonFiniteVector { position });
        }

        self.vectors.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.vectors.extend_from_slice(vector);
        }
        self.count += vectors.len();

        Ok(())
    }

    /// Find the `k` stored vectors closest to `query` by squared euclidean distance.
    ///
    /// Results are ordered nearest first. Equal distances are ordered by position,
    /// so the same index state always produces the same ordering.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RagError> {
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if !is_finite(query) {
            return Err(RagError::NonFiniteVector { position: 0 });
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: squared_l2(query, stored),
            })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, compare_neighbors);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(compare_neighbors);

        Ok(neighbors)
    }

    /// Check internal bookkeeping after deserialization
    #[inline]
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("index dimension is zero".to_string());
        }

        let expected = self.count.checked_mul(self.dimension).ok_or_else(|| {
            format!(
                "vector count {} overflows with dimension {}",
                self.count, self.dimension
            )
        })?;

        if expected != self.vectors.len() {
            return Err(format!(
                "index declares {} vectors of dimension {} but holds {} floats",
                self.count,
                self.dimension,
                self.vectors.len()
            ));
        }

        Ok(())
    }
}

/// True when every component is neither NaN nor infinite
#[inline]
pub fn is_finite(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.position.cmp(&b.position))
}

/// Squared euclidean distance between two equal-length vectors
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Map a squared distance onto (0, 1]. Zero distance scores exactly 1.0.
#[inline]
pub fn distance_to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}
