//! C2: Catalog Vector Index.
//!
//! A read-only inner-product index over unit-normalized vectors, loaded
//! from disk once at startup alongside a parallel metadata array. No
//! mutation after load; safe for concurrent reads via a plain `Arc`.
//!
//! The on-disk format is a small custom binary layout produced by the
//! (out-of-scope) offline ingest tool: a `u32` row count, a `u32`
//! dimension, then `rows * dim` little-endian `f32` values, each row
//! already unit-normalized.

use crate::core::{CoreError, Result};
use crate::models::Exercise;
use ndarray::{Array1, Array2};
use std::fs;
use std::io::Read;
use std::path::Path;

pub struct VectorIndex {
    /// `rows x dim`, each row unit-normalized.
    vectors: Array2<f32>,
    metadata: Vec<Exercise>,
}

impl VectorIndex {
    /// Load the index and its metadata sidecar. Fails with
    /// `CatalogInconsistent` if the row counts of the two artifacts
    /// differ — this check is fatal at process start (§7).
    pub fn load(index_path: impl AsRef<Path>, metadata_path: impl AsRef<Path>) -> Result<Self> {
        let vectors = read_vector_file(index_path.as_ref())?;

        let metadata_raw = fs::read_to_string(metadata_path.as_ref()).map_err(|e| {
            CoreError::CatalogInconsistent {
                reason: format!(
                    "failed to read metadata sidecar {}: {e}",
                    metadata_path.as_ref().display()
                ),
            }
        })?;
        let metadata: Vec<Exercise> = serde_json::from_str(&metadata_raw)?;

        if vectors.nrows() != metadata.len() {
            return Err(CoreError::CatalogInconsistent {
                reason: format!(
                    "index has {} rows but metadata has {} entries",
                    vectors.nrows(),
                    metadata.len()
                ),
            });
        }

        Ok(Self { vectors, metadata })
    }

    /// Construct directly from already-loaded data, used by tests and by
    /// any future in-process re-embedding path.
    pub fn from_parts(vectors: Array2<f32>, metadata: Vec<Exercise>) -> Result<Self> {
        if vectors.nrows() != metadata.len() {
            return Err(CoreError::CatalogInconsistent {
                reason: format!(
                    "index has {} rows but metadata has {} entries",
                    vectors.nrows(),
                    metadata.len()
                ),
            });
        }
        Ok(Self { vectors, metadata })
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// `Search(queryVec, k)`: up to `k` `(score, rowIndex)` pairs sorted
    /// by descending inner product. `queryVec` is expected already
    /// L2-normalized by the caller (C3).
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<(f32, usize)> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }
        if query_vec.len() != self.vectors.ncols() {
            return Vec::new();
        }

        let query = Array1::from_vec(query_vec.to_vec());
        let scores = self.vectors.dot(&query);

        let mut scored: Vec<(f32, usize)> = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| (score, i))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Metadata lookup for a row index, skipping out-of-range rows
    /// rather than erroring (§4.2).
    pub fn metadata_at(&self, row: usize) -> Option<&Exercise> {
        self.metadata.get(row)
    }

    pub fn exercise_by_id(&self, id: crate::models::ExerciseId) -> Option<&Exercise> {
        self.metadata.iter().find(|e| e.exercise_id == id)
    }
}

fn read_vector_file(path: &Path) -> Result<Array2<f32>> {
    let mut file = fs::File::open(path).map_err(|e| CoreError::CatalogInconsistent {
        reason: format!("failed to open vector index {}: {e}", path.display()),
    })?;

    let mut header = [0u8; 8];
    file.read_exact(&mut header)
        .map_err(|e| CoreError::CatalogInconsistent {
            reason: format!("failed to read vector index header: {e}"),
        })?;
    let rows = u32::from_le_bytes(header[0..4].try_into().unwrap()) as usize;
    let dim = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;

    let mut buf = vec![0u8; rows * dim * 4];
    file.read_exact(&mut buf)
        .map_err(|e| CoreError::CatalogInconsistent {
            reason: format!("vector index body shorter than header promised: {e}"),
        })?;

    let data: Vec<f32> = buf
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
        .collect();

    Array2::from_shape_vec((rows, dim), data).map_err(|e| CoreError::CatalogInconsistent {
        reason: format!("vector index shape mismatch: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Exercise;

    fn exercise(id: u64, title: &str) -> Exercise {
        Exercise {
            exercise_id: id,
            title: title.to_string(),
            standard_title: None,
            training_name: None,
            muscles: vec![],
            equipment_tool: None,
            equipment_category: "other".to_string(),
            target_group: None,
            fitness_factor: None,
            fitness_level: None,
            description: None,
            video_url: None,
            video_length_seconds: None,
            image_url: None,
            image_file_name: None,
            training_aim_name: None,
            training_place_name: None,
            training_section_name: None,
            training_step_name: None,
        }
    }

    #[test]
    fn search_returns_descending_scores() {
        let vectors = Array2::from_shape_vec(
            (3, 2),
            vec![1.0, 0.0, 0.0, 1.0, 0.7071, 0.7071],
        )
        .unwrap();
        let metadata = vec![exercise(1, "a"), exercise(2, "b"), exercise(3, "c")];
        let index = VectorIndex::from_parts(vectors, metadata).unwrap();

        let results = index.search(&[1.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, 0);
        assert!(results[0].0 >= results[1].0);
    }

    #[test]
    fn row_count_mismatch_is_catalog_inconsistent() {
        let vectors = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let metadata = vec![exercise(1, "a")];
        let err = VectorIndex::from_parts(vectors, metadata).unwrap_err();
        assert!(matches!(err, CoreError::CatalogInconsistent { .. }));
    }
}
