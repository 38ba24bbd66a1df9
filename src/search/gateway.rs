//! C3: Catalog Search Gateway. Sits between the orchestrator and the
//! embedding service + in-process vector index, applying the
//! target-group / fitness-factor pre-filter the catalog index itself
//! knows nothing about.

use crate::catalog::VectorIndex;
use crate::core::Result;
use crate::embedding::EmbeddingClient;
use crate::models::{Candidate, Exercise, SearchFilters};
use crate::vocabulary::MuscleLabel;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Oversampling factor applied to `k` before the metadata filter runs,
/// so rejections don't starve the caller of results (§4.3 step 2).
const OVERSAMPLE_FACTOR: usize = 3;

#[derive(Clone, Eq, PartialEq, Hash)]
struct CacheKey {
    query: String,
    k: usize,
    target_group_allowed: Option<Vec<String>>,
    fitness_factor_excluded: Vec<String>,
}

struct CacheEntry {
    candidates: Vec<Candidate>,
    expires_at: Instant,
}

pub struct SearchGateway {
    embedding: EmbeddingClient,
    index: Arc<VectorIndex>,
    cache: RwLock<HashMap<CacheKey, CacheEntry>>,
    cache_ttl: Duration,
}

impl SearchGateway {
    pub fn new(embedding: EmbeddingClient, index: Arc<VectorIndex>, cache_ttl: Duration) -> Self {
        Self {
            embedding,
            index,
            cache: RwLock::new(HashMap::new()),
            cache_ttl,
        }
    }

    /// `Search(query, k, filters) → [Candidate]` (§4.3).
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<Candidate>> {
        let key = CacheKey {
            query: query.to_string(),
            k,
            target_group_allowed: filters.target_group_allowed.clone(),
            fitness_factor_excluded: filters.fitness_factor_excluded.clone(),
        };

        if let Some(hit) = self.cache_get(&key).await {
            return Ok(hit);
        }

        let query_vec = self.embedding.embed(query).await?;
        let oversampled_k = k.saturating_mul(OVERSAMPLE_FACTOR).max(k);
        let hits = self.index.search(&query_vec, oversampled_k);

        let mut survivors: Vec<Candidate> = Vec::new();
        for (score, row) in hits {
            let Some(exercise) = self.index.metadata_at(row) else {
                continue;
            };
            if passes_filters(exercise, filters) {
                survivors.push(Candidate {
                    exercise: exercise.clone(),
                    score,
                });
            }
        }

        survivors.truncate(k);
        self.cache_put(key, survivors.clone()).await;
        Ok(survivors)
    }

    /// `MatchesMuscle(metadata, aliasSet)`: true if `exercise.muscles`
    /// intersects `alias_set` by case-insensitive substring, either
    /// direction (§4.3).
    pub fn matches_muscle(exercise: &Exercise, alias_set: &[MuscleLabel]) -> bool {
        let aliases_lower: Vec<String> = alias_set.iter().map(|a| a.as_str().to_lowercase()).collect();
        exercise.muscles.iter().any(|muscle| {
            let muscle_lower = muscle.to_lowercase();
            aliases_lower
                .iter()
                .any(|alias| muscle_lower.contains(alias.as_str()) || alias.contains(&muscle_lower))
        })
    }

    async fn cache_get(&self, key: &CacheKey) -> Option<Vec<Candidate>> {
        let cache = self.cache.read().await;
        let entry = cache.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.candidates.clone())
        } else {
            None
        }
    }

    async fn cache_put(&self, key: CacheKey, candidates: Vec<Candidate>) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CacheEntry {
                candidates,
                expires_at: Instant::now() + self.cache_ttl,
            },
        );
    }
}

fn passes_filters(exercise: &Exercise, filters: &SearchFilters) -> bool {
    if let Some(allowed) = &filters.target_group_allowed {
        let group = exercise
            .target_group
            .map(|g| g.as_str().to_string())
            .unwrap_or_else(|| "common".to_string());
        let common_allowed = allowed.iter().any(|g| g == "common");
        if group == "common" {
            if !common_allowed {
                return false;
            }
        } else if !allowed.iter().any(|g| g == &group) {
            return false;
        }
    }

    if let Some(factor) = &exercise.fitness_factor {
        if filters.fitness_factor_excluded.iter().any(|f| f == factor) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetGroup;

    fn exercise(target_group: Option<TargetGroup>, fitness_factor: Option<&str>) -> Exercise {
        Exercise {
            exercise_id: 1,
            title: "test".to_string(),
            standard_title: None,
            training_name: None,
            muscles: vec!["큰가슴근".to_string()],
            equipment_tool: None,
            equipment_category: "other".to_string(),
            target_group,
            fitness_factor: fitness_factor.map(|s| s.to_string()),
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
    fn absent_target_group_counts_as_common() {
        let ex = exercise(None, None);
        let filters = SearchFilters {
            target_group_allowed: Some(vec!["common".to_string()]),
            fitness_factor_excluded: vec![],
        };
        assert!(passes_filters(&ex, &filters));
    }

    #[test]
    fn target_group_not_allowed_is_rejected() {
        let ex = exercise(Some(TargetGroup::Elder), None);
        let filters = SearchFilters {
            target_group_allowed: Some(vec!["adult".to_string()]),
            fitness_factor_excluded: vec![],
        };
        assert!(!passes_filters(&ex, &filters));
    }

    #[test]
    fn excluded_fitness_factor_is_rejected() {
        let ex = exercise(None, Some("strength"));
        let filters = SearchFilters {
            target_group_allowed: None,
            fitness_factor_excluded: vec!["strength".to_string()],
        };
        assert!(!passes_filters(&ex, &filters));
    }

    #[test]
    fn matches_muscle_checks_bidirectional_substring() {
        let ex = exercise(None, None);
        let alias = MuscleLabel::is_canonical("큰가슴근");
        assert!(alias);
        let aliases = crate::vocabulary::normalize(["가슴"]);
        assert!(SearchGateway::matches_muscle(&ex, &aliases));
    }
}
