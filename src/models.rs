//! Shared data model (§3). Inputs and outputs are tagged variant types
//! with explicit optionality — "not selected" is an absent `Option`,
//! never a sentinel string, once past the HTTP boundary (Design Notes §9).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type ExerciseId = u64;

/// Closed target-group set (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetGroup {
    Youth,
    Adolescent,
    Adult,
    Elder,
    Common,
}

impl TargetGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youth => "youth",
            Self::Adolescent => "adolescent",
            Self::Adult => "adult",
            Self::Elder => "elder",
            Self::Common => "common",
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog exercise, immutable for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub exercise_id: ExerciseId,
    pub title: String,
    pub standard_title: Option<String>,
    pub training_name: Option<String>,
    pub muscles: Vec<String>,
    pub equipment_tool: Option<String>,
    pub equipment_category: String,
    pub target_group: Option<TargetGroup>,
    pub fitness_factor: Option<String>,
    pub fitness_level: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub video_length_seconds: Option<u32>,
    pub image_url: Option<String>,
    pub image_file_name: Option<String>,
    // Supplemented fields (SPEC_FULL.md §3) — carried through verbatim
    // into prompts, never filtered or validated on their own.
    pub training_aim_name: Option<String>,
    pub training_place_name: Option<String>,
    pub training_section_name: Option<String>,
    pub training_step_name: Option<String>,
}

/// Intensity bucket for a single logged exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    High,
    Mid,
    Low,
}

/// A single exercise entry within a day's journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogExercise {
    pub title: String,
    pub body_part: Option<String>,
    pub muscles: Vec<String>,
    pub exercise_tool: Option<String>,
    pub intensity: Intensity,
    pub exercise_time: u32,
    pub exercise_memo: Option<String>,
    pub description: Option<String>,
}

/// One calendar day's journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub date: String,
    pub memo: Option<String>,
    pub exercises: Vec<LogExercise>,
}

/// Raw user profile as received over HTTP — every field may be an
/// explicit "not selected" sentinel, cleaned away by
/// [`crate::orchestrator::clean_profile`] before it reaches the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub target_group: Option<String>,
    pub fitness_level: Option<String>,
    pub fitness_factor: Option<String>,
}

/// Profile after hygiene: sentinels and blanks stripped (§4.6 step 1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanProfile {
    pub target_group: Option<String>,
    pub fitness_level: Option<String>,
    pub fitness_factor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedCount {
    pub name: String,
    pub count: u32,
}

/// Built by C4, a pure function of the submitted logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMetrics {
    pub active_days: u32,
    pub rest_days: u32,
    pub total_minutes: u32,
    pub intensity_counts: HashMap<String, u32>,
    pub body_part_counts: HashMap<String, u32>,
    pub top_muscles: Vec<NamedCount>,
    pub top_equipment: Vec<NamedCount>,
    pub top_equipment_categories: Vec<NamedCount>,
}

/// One sketched day from C5, before exercises are resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDraft {
    pub day: u32,
    pub focus: String,
    pub target_muscles: Vec<String>,
    pub rag_query: String,
    pub estimated_duration: u32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleBalance {
    pub overworked: Vec<String>,
    pub underworked: Vec<String>,
}

/// The LLM's first-pass plan (§3, Glossary "Draft").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineDraft {
    pub strengths: String,
    pub weaknesses: String,
    pub muscle_balance: MuscleBalance,
    pub next_target_muscles: Vec<String>,
    pub daily_details: Vec<DayDraft>,
}

/// The final, catalog-backed result emitted by C8.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub strengths: String,
    pub weaknesses: String,
    pub muscle_balance: MuscleBalance,
    pub next_target_muscles: Vec<String>,
    pub daily_details: Vec<DayDraft>,
    pub next_target_exercises: HashMap<String, Vec<ExerciseId>>,
    pub recommended_exercises: Vec<ExerciseId>,
}

/// A scored retrieval hit from C2/C3, before metadata filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub exercise: Exercise,
    pub score: f32,
}

/// Optional filters threaded through C3 (§4.3).
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub target_group_allowed: Option<Vec<String>>,
    pub fitness_factor_excluded: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleAnalysis {
    pub overworked: Vec<String>,
    pub underworked: Vec<String>,
    pub next_target_muscles: Vec<String>,
    pub focus: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPatternResponse {
    pub result: Routine,
    pub metrics_summary: WeeklyMetrics,
    pub recommended_exercises: Vec<ExerciseId>,
    pub muscle_analysis: MuscleAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalAnalysis {
    pub workout_evaluation: String,
    pub target_muscles: Vec<String>,
    pub recommendations: Vec<String>,
    pub next_target_muscles: Vec<String>,
    pub next_target_exercises: HashMap<String, Vec<ExerciseId>>,
    pub encouragement: String,
}
