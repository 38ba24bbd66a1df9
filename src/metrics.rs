//! C4: Weekly Metrics Builder. A pure function over the submitted
//! logs — no I/O, no catalog lookups. Grounded on
//! `_calculate_weekly_metrics` / `_infer_body_part`.

use crate::models::{LogEntry, NamedCount, WeeklyMetrics};
use crate::vocabulary::equipment_category;
use std::collections::HashMap;

const LOWER_BODY_KEYWORDS: &[&str] = &[
    "다리", "하체", "스쿼트", "런지", "데드", "레그", "대퇴", "허벅지", "종아리", "힙", "볼기", "둔근",
];
const UPPER_BODY_KEYWORDS: &[&str] = &[
    "가슴", "어깨", "팔", "등", "코어", "복부", "벤치", "프레스", "풀업", "랫", "로우",
];

/// `logs → WeeklyMetrics` (§4.4).
pub fn calculate_weekly_metrics(logs: &[LogEntry]) -> WeeklyMetrics {
    let mut intensity_counts: HashMap<String, u32> = HashMap::new();
    let mut body_part_counts: HashMap<String, u32> = HashMap::new();
    let mut muscle_counts: HashMap<String, u32> = HashMap::new();
    let mut equipment_counts: HashMap<String, u32> = HashMap::new();
    let mut equipment_category_counts: HashMap<String, u32> = HashMap::new();
    let mut total_minutes: u32 = 0;
    let mut active_days: u32 = 0;

    for day in logs {
        if !day.exercises.is_empty() {
            active_days += 1;
        }

        for exercise in &day.exercises {
            let intensity_key = match exercise.intensity {
                crate::models::Intensity::High => "high",
                crate::models::Intensity::Mid => "mid",
                crate::models::Intensity::Low => "low",
            };
            *intensity_counts.entry(intensity_key.to_string()).or_insert(0) += 1;

            total_minutes += exercise.exercise_time;

            let body_part = exercise
                .body_part
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| infer_body_part(&exercise.title, exercise.description.as_deref(), None));
            *body_part_counts.entry(body_part).or_insert(0) += 1;

            for muscle in &exercise.muscles {
                *muscle_counts.entry(muscle.clone()).or_insert(0) += 1;
            }

            if let Some(tool) = &exercise.exercise_tool {
                let trimmed = tool.trim();
                if !trimmed.is_empty() && trimmed != "정보 없음" {
                    *equipment_counts.entry(trimmed.to_string()).or_insert(0) += 1;
                    let category = equipment_category(trimmed).to_string();
                    *equipment_category_counts.entry(category).or_insert(0) += 1;
                }
            }
        }
    }

    // §8 invariant activeDays + restDays = 7 must hold even when more
    // than 7 log entries are submitted (e.g. via /recommend-routine,
    // which allows up to 14 days) — cap before storing, not just when
    // deriving restDays.
    let active_days = active_days.min(7);
    let rest_days = 7u32.saturating_sub(active_days);

    WeeklyMetrics {
        active_days,
        rest_days,
        total_minutes,
        intensity_counts,
        body_part_counts,
        top_muscles: top_k(muscle_counts),
        top_equipment: top_k(equipment_counts),
        top_equipment_categories: top_k(equipment_category_counts),
    }
}

/// §7: metrics-only fallback used when the LLM path fails outright.
/// No catalog lookup, no network call — just "rest your most-trained
/// muscles" read straight off the submitted logs.
pub fn fallback_recommendations(logs: &[LogEntry]) -> Vec<String> {
    let metrics = calculate_weekly_metrics(logs);
    metrics
        .top_muscles
        .into_iter()
        .take(3)
        .map(|m| format!("{}을(를) 과사용했습니다 — 이번 주는 휴식을 권장합니다", m.name))
        .collect()
}

fn top_k(counts: HashMap<String, u32>) -> Vec<NamedCount> {
    let mut items: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount { name, count })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    items
}

/// `LogExercise.title`/`description`/exercise's `trainingName` → a
/// coarse body-part bucket when the log entry didn't carry one.
fn infer_body_part(title: &str, description: Option<&str>, training_name: Option<&str>) -> String {
    let text = [Some(title), description, training_name]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if LOWER_BODY_KEYWORDS.iter().any(|k| text.contains(k)) {
        "lower_body".to_string()
    } else if UPPER_BODY_KEYWORDS.iter().any(|k| text.contains(k)) {
        "upper_body".to_string()
    } else {
        "other".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Intensity, LogExercise};

    fn log_exercise(title: &str, intensity: Intensity, minutes: u32) -> LogExercise {
        LogExercise {
            title: title.to_string(),
            body_part: None,
            muscles: vec!["큰가슴근".to_string()],
            exercise_tool: Some("덤벨".to_string()),
            intensity,
            exercise_time: minutes,
            exercise_memo: None,
            description: None,
        }
    }

    #[test]
    fn active_days_count_days_with_exercises() {
        let logs = vec![
            LogEntry {
                date: "2026-07-20".to_string(),
                memo: None,
                exercises: vec![log_exercise("벤치프레스", Intensity::High, 30)],
            },
            LogEntry {
                date: "2026-07-21".to_string(),
                memo: None,
                exercises: vec![],
            },
        ];
        let metrics = calculate_weekly_metrics(&logs);
        assert_eq!(metrics.active_days, 1);
        assert_eq!(metrics.rest_days, 6);
        assert_eq!(metrics.total_minutes, 30);
    }

    #[test]
    fn active_and_rest_days_sum_to_seven_when_logs_exceed_a_week() {
        let logs: Vec<LogEntry> = (0..10)
            .map(|i| LogEntry {
                date: format!("2026-07-{:02}", 20 + i),
                memo: None,
                exercises: vec![log_exercise("벤치프레스", Intensity::High, 10)],
            })
            .collect();
        let metrics = calculate_weekly_metrics(&logs);
        assert_eq!(metrics.active_days, 7);
        assert_eq!(metrics.rest_days, 0);
        assert_eq!(metrics.active_days + metrics.rest_days, 7);
    }

    #[test]
    fn infer_body_part_prefers_lower_body_keywords() {
        assert_eq!(infer_body_part("스쿼트", None, None), "lower_body");
        assert_eq!(infer_body_part("벤치프레스", None, None), "upper_body");
        assert_eq!(infer_body_part("명상", None, None), "other");
    }

    #[test]
    fn fallback_recommendations_names_top_muscle() {
        let logs = vec![LogEntry {
            date: "2026-07-20".to_string(),
            memo: None,
            exercises: vec![log_exercise("벤치프레스", Intensity::High, 10)],
        }];
        let recs = fallback_recommendations(&logs);
        assert!(!recs.is_empty());
        assert!(recs[0].contains("큰가슴근"));
    }

    #[test]
    fn top_muscles_sorted_descending() {
        let logs = vec![LogEntry {
            date: "2026-07-20".to_string(),
            memo: None,
            exercises: vec![
                log_exercise("벤치프레스", Intensity::High, 10),
                log_exercise("벤치프레스", Intensity::Mid, 10),
            ],
        }];
        let metrics = calculate_weekly_metrics(&logs);
        assert_eq!(metrics.top_muscles[0].name, "큰가슴근");
        assert_eq!(metrics.top_muscles[0].count, 2);
    }
}
