//! C8: Response Assembler. Takes a populated draft (days already
//! carry their resolved, score-sorted exercise lists) and produces
//! the final `Routine`: per-muscle "next target" searches, the
//! flattened recommendation list, and a final vocabulary pass.

use crate::core::Result;
use crate::models::{ExerciseId, Routine, RoutineDraft, SearchFilters};
use crate::search::SearchGateway;
use crate::vocabulary;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

const NEXT_TARGET_K: usize = 3;

/// §4.8: assembles the final `Routine` from a draft whose days already
/// carry resolved exercise lists sorted descending by score.
pub async fn assemble(draft: RoutineDraft, filters: &SearchFilters, search: &Arc<SearchGateway>) -> Result<Routine> {
    let next_target_muscles: Vec<String> = vocabulary::normalize(&draft.next_target_muscles)
        .into_iter()
        .map(|label| label.as_str().to_string())
        .collect();

    let next_target_exercises = search_next_targets(&next_target_muscles, filters, search).await;

    let recommended_exercises = flatten_recommended(&draft);

    Ok(Routine {
        strengths: draft.strengths,
        weaknesses: draft.weaknesses,
        muscle_balance: draft.muscle_balance,
        next_target_muscles,
        daily_details: draft.daily_details,
        next_target_exercises,
        recommended_exercises,
    })
}

/// One isolated search per muscle, all running concurrently (§5).
pub(crate) async fn search_next_targets(
    muscles: &[String],
    filters: &SearchFilters,
    search: &Arc<SearchGateway>,
) -> HashMap<String, Vec<ExerciseId>> {
    let mut join_set: JoinSet<(String, Vec<ExerciseId>)> = JoinSet::new();

    for muscle in muscles {
        let muscle = muscle.clone();
        let filters = filters.clone();
        let search = Arc::clone(search);

        join_set.spawn(async move {
            let query = format!("{muscle} 강화 운동");
            let ids = search
                .search(&query, NEXT_TARGET_K, &filters)
                .await
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.exercise.exercise_id)
                .collect();
            (muscle, ids)
        });
    }

    let mut out = HashMap::new();
    while let Some(joined) = join_set.join_next().await {
        if let Ok((muscle, ids)) = joined {
            out.insert(muscle, ids);
        }
    }
    out
}

fn flatten_recommended(draft: &RoutineDraft) -> Vec<ExerciseId> {
    let mut seen: HashSet<ExerciseId> = HashSet::new();
    let mut out = Vec::new();
    for day in &draft.daily_details {
        for exercise in &day.exercises {
            if seen.insert(exercise.exercise_id) {
                out.push(exercise.exercise_id);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayDraft, Exercise, MuscleBalance};

    fn exercise(id: u64) -> Exercise {
        Exercise {
            exercise_id: id,
            title: "test".to_string(),
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
    fn flatten_recommended_dedups_preserving_first_occurrence() {
        let draft = RoutineDraft {
            strengths: String::new(),
            weaknesses: String::new(),
            muscle_balance: MuscleBalance::default(),
            next_target_muscles: vec![],
            daily_details: vec![
                DayDraft {
                    day: 1,
                    focus: String::new(),
                    target_muscles: vec![],
                    rag_query: String::new(),
                    estimated_duration: 0,
                    exercises: vec![exercise(1), exercise(2)],
                },
                DayDraft {
                    day: 2,
                    focus: String::new(),
                    target_muscles: vec![],
                    rag_query: String::new(),
                    estimated_duration: 0,
                    exercises: vec![exercise(2), exercise(3)],
                },
            ],
        };
        let ids = flatten_recommended(&draft);
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
