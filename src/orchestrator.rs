//! C6: Routine Orchestrator. The load-bearing component: turns a
//! week of logs (plus optional profile) into a catalog-backed
//! `Routine`. Grounded on `generate_workout_recommendation`'s overall
//! shape, reworked into the progressive search / dedup / backfill
//! pipeline specified in SPEC_FULL.md §4.6.

use crate::assembler;
use crate::core::Result;
use crate::llm::LlmClient;
use crate::models::{
    Candidate, CleanProfile, DayDraft, ExerciseId, JournalAnalysis, LogEntry, Routine, RoutineDraft,
    SearchFilters, UserProfile,
};
use crate::query_validator;
use crate::search::SearchGateway;
use crate::vocabulary::{self, MuscleLabel};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Exercises kept per day once filtering settles (§4.6 step 4).
const PER_DAY: usize = 4;

pub struct Orchestrator {
    search: Arc<SearchGateway>,
    llm: Arc<LlmClient>,
}

impl Orchestrator {
    pub fn new(search: Arc<SearchGateway>, llm: Arc<LlmClient>) -> Self {
        Self { search, llm }
    }

    pub async fn synthesize_routine(
        &self,
        logs: &[LogEntry],
        days: u32,
        frequency: u32,
        raw_profile: UserProfile,
    ) -> Result<Routine> {
        let clean = clean_profile(&raw_profile);
        let draft = self.llm.sketch_routine(logs, days, frequency, &raw_profile).await?;
        self.expand_and_assemble(draft, &clean).await
    }

    pub async fn synthesize_weekly_pattern(
        &self,
        metrics: &crate::models::WeeklyMetrics,
        raw_profile: UserProfile,
    ) -> Result<Routine> {
        let clean = clean_profile(&raw_profile);
        let draft = self.llm.sketch_weekly_pattern(metrics, &raw_profile).await?;
        self.expand_and_assemble(draft, &clean).await
    }

    /// `POST /analyze-journal`: a single day's log, no multi-day
    /// expansion — just the LLM's evaluation plus one isolated search
    /// per recommended next-target muscle.
    pub async fn analyze_journal(&self, log: &LogEntry, raw_profile: UserProfile) -> Result<JournalAnalysis> {
        let clean = clean_profile(&raw_profile);
        let filters = derive_filters(&clean);
        let raw = self.llm.analyze_journal(log, &raw_profile).await?;

        let workout_evaluation = raw
            .get("workoutEvaluation")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let recommendations = raw
            .get("recommendations")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let encouragement = raw
            .get("encouragement")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let raw_target_muscles: Vec<String> = raw
            .get("targetMuscles")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let raw_next_target_muscles: Vec<String> = raw
            .get("nextTargetMuscles")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        let target_muscles: Vec<String> = vocabulary::normalize(&raw_target_muscles)
            .into_iter()
            .map(|l| l.as_str().to_string())
            .collect();
        let next_target_muscles: Vec<String> = vocabulary::normalize(&raw_next_target_muscles)
            .into_iter()
            .map(|l| l.as_str().to_string())
            .collect();

        let next_target_exercises =
            assembler::search_next_targets(&next_target_muscles, &filters, &self.search).await;

        Ok(JournalAnalysis {
            workout_evaluation,
            target_muscles,
            recommendations,
            next_target_muscles,
            next_target_exercises,
            encouragement,
        })
    }

    async fn expand_and_assemble(&self, draft: RoutineDraft, profile: &CleanProfile) -> Result<Routine> {
        let filters = derive_filters(profile);
        let populated = self.expand_days(draft, &filters).await?;
        assembler::assemble(populated, &filters, &self.search).await
    }

    /// Steps 4–6 of §4.6: per-day expansion, cross-day dedup by score,
    /// backfill for days that lost candidates.
    async fn expand_days(&self, draft: RoutineDraft, filters: &SearchFilters) -> Result<RoutineDraft> {
        let fallback_targets = vocabulary::normalize(&draft.next_target_muscles);
        let mut join_set: JoinSet<(usize, DayDraft, String, Vec<Candidate>)> = JoinSet::new();

        for (index, day) in draft.daily_details.iter().enumerate() {
            let search = Arc::clone(&self.search);
            let filters = filters.clone();
            let day = day.clone();
            let fallback = fallback_targets.clone();

            join_set.spawn(async move {
                let targets = resolve_targets(&day, &fallback);
                let validated_query = query_validator::validate(
                    &day.rag_query,
                    &targets.iter().map(|t| t.as_str().to_string()).collect::<Vec<_>>(),
                    &UserProfile::default(),
                    &[],
                    false,
                );
                let candidates = search_day(&search, &validated_query, &targets, &filters).await;
                (index, day, validated_query, candidates)
            });
        }

        let mut by_day: Vec<(DayDraft, String, Vec<Candidate>)> =
            vec![(DayDraft { day: 0, focus: String::new(), target_muscles: vec![], rag_query: String::new(), estimated_duration: 0, exercises: vec![] }, String::new(), vec![]); draft.daily_details.len()];

        while let Some(joined) = join_set.join_next().await {
            if let Ok((index, day, query, candidates)) = joined {
                by_day[index] = (day, query, candidates);
            }
        }

        // Cross-day dedup by score, earlier day wins ties (§4.6 step 5).
        let mut best_owner: HashMap<ExerciseId, (usize, f32)> = HashMap::new();
        for (day_index, (_, _, candidates)) in by_day.iter().enumerate() {
            for candidate in candidates {
                let id = candidate.exercise.exercise_id;
                let entry = best_owner.entry(id).or_insert((day_index, candidate.score));
                if candidate.score > entry.1 {
                    *entry = (day_index, candidate.score);
                }
            }
        }

        let mut daily_details = Vec::with_capacity(by_day.len());
        // Every id assigned to any day by the dedup pass is permanently
        // off-limits to every other day's backfill search.
        let mut taken: HashSet<ExerciseId> = best_owner.keys().cloned().collect();

        for (day_index, (mut day, query, candidates)) in by_day.into_iter().enumerate() {
            let mut kept: Vec<Candidate> = candidates
                .into_iter()
                .filter(|c| {
                    best_owner
                        .get(&c.exercise.exercise_id)
                        .map(|(owner, _)| *owner == day_index)
                        .unwrap_or(false)
                })
                .collect();

            // Back-fill (§4.6 step 6): re-search excluding every taken id.
            if kept.len() < PER_DAY {
                if let Ok(extra) = self.search.search(&query, PER_DAY * 2, filters).await {
                    for candidate in extra {
                        if kept.len() >= PER_DAY {
                            break;
                        }
                        if taken.contains(&candidate.exercise.exercise_id) {
                            continue;
                        }
                        taken.insert(candidate.exercise.exercise_id);
                        kept.push(candidate);
                    }
                }
            }

            kept.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            kept.truncate(PER_DAY);

            day.exercises = kept.into_iter().map(|c| c.exercise).collect();
            daily_details.push(day);
        }

        Ok(RoutineDraft {
            strengths: draft.strengths,
            weaknesses: draft.weaknesses,
            muscle_balance: draft.muscle_balance,
            next_target_muscles: draft.next_target_muscles,
            daily_details,
        })
    }
}

fn resolve_targets(day: &DayDraft, fallback: &[MuscleLabel]) -> Vec<MuscleLabel> {
    let targets = vocabulary::normalize(&day.target_muscles);
    if targets.is_empty() {
        fallback.to_vec()
    } else {
        targets
    }
}

/// Three progressive search attempts, stopping at the first non-empty
/// result, then the strict/broadened/recovery filter passes (§4.6
/// step 4). Recovery fires whenever the day is still short of
/// `PER_DAY` after passes 1+2, independent of whether the pool itself
/// was empty.
async fn search_day(
    search: &SearchGateway,
    validated_query: &str,
    targets: &[MuscleLabel],
    filters: &SearchFilters,
) -> Vec<Candidate> {
    let target0 = targets.first().map(|t| t.as_str().to_string()).unwrap_or_else(|| "전신".to_string());

    let primary = search.search(validated_query, 12, filters).await.unwrap_or_default();
    let pool = if !primary.is_empty() {
        primary
    } else {
        let simple_query = format!("{target0} 운동");
        let simple = search.search(&simple_query, 18, filters).await.unwrap_or_default();
        if !simple.is_empty() {
            simple
        } else {
            let relaxed = SearchFilters {
                target_group_allowed: None,
                fitness_factor_excluded: vec![],
            };
            search.search(&simple_query, 18, &relaxed).await.unwrap_or_default()
        }
    };

    let alias_sets: Vec<Vec<MuscleLabel>> = targets.iter().map(vocabulary::expand_aliases).collect();

    // Pass 1: strict muscle match.
    let mut strict: Vec<Candidate> = pool
        .iter()
        .filter(|c| alias_sets.iter().any(|aliases| SearchGateway::matches_muscle(&c.exercise, aliases)))
        .cloned()
        .collect();
    strict.truncate(PER_DAY);

    if strict.len() >= PER_DAY {
        return strict;
    }

    // Pass 2: broadened — accept remaining pool candidates regardless
    // of exact muscle match, preserving descending score order.
    let chosen_ids: HashSet<ExerciseId> = strict.iter().map(|c| c.exercise.exercise_id).collect();
    for candidate in &pool {
        if strict.len() >= PER_DAY {
            break;
        }
        if chosen_ids.contains(&candidate.exercise.exercise_id) {
            continue;
        }
        strict.push(candidate.clone());
    }

    if strict.len() >= PER_DAY {
        return strict;
    }

    // Pass 3: recovery — minimal query, fully relaxed filters, topping
    // up whatever pass 1+2 already found regardless of pool size.
    let relaxed = SearchFilters::default();
    let recovered = search.search(&target0, PER_DAY, &relaxed).await.unwrap_or_default();
    let chosen_ids: HashSet<ExerciseId> = strict.iter().map(|c| c.exercise.exercise_id).collect();
    for candidate in recovered {
        if strict.len() >= PER_DAY {
            break;
        }
        if chosen_ids.contains(&candidate.exercise.exercise_id) {
            continue;
        }
        strict.push(candidate);
    }
    strict
}

/// Profile hygiene (§4.6 step 1): strip blank / "not selected"
/// sentinels, matching `_clean_user_profile`.
pub fn clean_profile(raw: &UserProfile) -> CleanProfile {
    fn clean_field(value: &Option<String>) -> Option<String> {
        value.as_ref().map(|s| s.trim()).filter(|s| {
            !s.is_empty() && *s != "선택안함" && *s != "선택 안함" && !s.eq_ignore_ascii_case("none")
        }).map(|s| s.to_string())
    }

    CleanProfile {
        target_group: clean_field(&raw.target_group),
        fitness_level: clean_field(&raw.fitness_level),
        fitness_factor: clean_field(&raw.fitness_factor),
    }
}

/// §4.6 step 2: derive the search filters from the cleaned profile.
pub fn derive_filters(profile: &CleanProfile) -> SearchFilters {
    let target_group_allowed = profile.target_group.as_ref().map(|group| {
        if group == "common" {
            vec!["common".to_string()]
        } else {
            vec![group.clone(), "common".to_string()]
        }
    });

    let fitness_factor_excluded = match &profile.fitness_factor {
        Some(factor) if factor.contains("근력") || factor.to_lowercase().contains("strength") => {
            vec!["유연성".to_string()]
        }
        _ => vec![],
    };

    SearchFilters {
        target_group_allowed,
        fitness_factor_excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_profile_strips_not_selected_sentinel() {
        let raw = UserProfile {
            target_group: Some("선택안함".to_string()),
            fitness_level: Some("intermediate".to_string()),
            fitness_factor: None,
        };
        let clean = clean_profile(&raw);
        assert_eq!(clean.target_group, None);
        assert_eq!(clean.fitness_level, Some("intermediate".to_string()));
    }

    #[test]
    fn derive_filters_adds_common_to_specific_target_group() {
        let profile = CleanProfile {
            target_group: Some("adult".to_string()),
            fitness_level: None,
            fitness_factor: None,
        };
        let filters = derive_filters(&profile);
        let allowed = filters.target_group_allowed.unwrap();
        assert!(allowed.contains(&"adult".to_string()));
        assert!(allowed.contains(&"common".to_string()));
    }

    #[test]
    fn derive_filters_excludes_flexibility_for_strength_factor() {
        let profile = CleanProfile {
            target_group: None,
            fitness_level: None,
            fitness_factor: Some("근력".to_string()),
        };
        let filters = derive_filters(&profile);
        assert!(filters.fitness_factor_excluded.contains(&"유연성".to_string()));
    }

    #[test]
    fn derive_filters_no_restriction_when_profile_absent() {
        let profile = CleanProfile::default();
        let filters = derive_filters(&profile);
        assert!(filters.target_group_allowed.is_none());
        assert!(filters.fitness_factor_excluded.is_empty());
    }
}
