//! C5: LLM Client. Wraps an external chat-completion service and
//! houses the three prompt templates (log-analysis, routine-
//! recommendation, weekly-pattern). Grounded on the teacher's
//! `LLMService` struct shape (`reqwest::Client` + endpoint + key),
//! filled with a real chat-completion round trip instead of the
//! rule-based stand-in.

use crate::core::{CoreError, Result};
use crate::llm::repair::parse_or_repair;
use crate::models::{LogEntry, RoutineDraft, UserProfile, WeeklyMetrics};
use crate::vocabulary::MUSCLE_LABELS;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl LlmClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url,
            model,
            api_key,
            temperature,
            max_tokens,
        }
    }

    async fn chat(&self, system_prompt: String, user_prompt: String) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut req = self.http.post(&url).json(&ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        });

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| CoreError::chat_unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::chat_unavailable(format!(
                "chat completion service returned status {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoreError::chat_unavailable(e.to_string()))?;

        let raw_text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CoreError::chat_unavailable("empty chat completion response".to_string()))?;

        parse_or_repair(&raw_text)
            .ok_or_else(|| CoreError::response_malformed("chat completion output could not be repaired into JSON".to_string()))
    }

    /// *log-analysis* template: one day's log, returns the raw JSON
    /// value (the orchestrator deserializes into `JournalAnalysis`
    /// after filling in catalog-backed fields).
    pub async fn analyze_journal(&self, log: &LogEntry, profile: &UserProfile) -> Result<Value> {
        let system = log_analysis_system_prompt();
        let user = format!(
            "사용자 프로필: {}\n\n오늘의 운동 기록: {}",
            format_profile_block(profile),
            serde_json::to_string(log)?,
        );
        self.chat(system, user).await
    }

    /// *weekly-pattern* template: metrics summary embedded in the user
    /// message, returns a `RoutineDraft` with empty `exercises` per day
    /// for the orchestrator to fill.
    pub async fn sketch_weekly_pattern(
        &self,
        metrics: &WeeklyMetrics,
        profile: &UserProfile,
    ) -> Result<RoutineDraft> {
        let system = weekly_pattern_system_prompt();
        let user = format!(
            "사용자 프로필: {}\n\n주간 운동 지표: {}",
            format_profile_block(profile),
            serde_json::to_string(metrics)?,
        );
        let value = self.chat(system, user).await?;
        serde_json::from_value(value)
            .map_err(|e| CoreError::response_malformed(format!("weekly-pattern response shape invalid: {e}")))
    }

    /// *routine-recommendation* template: a multi-day plan request.
    pub async fn sketch_routine(
        &self,
        logs: &[LogEntry],
        days: u32,
        frequency: u32,
        profile: &UserProfile,
    ) -> Result<RoutineDraft> {
        let system = routine_recommendation_system_prompt();
        let user = format!(
            "사용자 프로필: {}\n\n목표 일수: {days}, 주당 빈도: {frequency}\n\n최근 운동 기록: {}",
            format_profile_block(profile),
            serde_json::to_string(logs)?,
        );
        let value = self.chat(system, user).await?;
        serde_json::from_value(value)
            .map_err(|e| CoreError::response_malformed(format!("routine-recommendation response shape invalid: {e}")))
    }
}

fn format_profile_block(profile: &UserProfile) -> String {
    let target_group = profile.target_group.as_deref().unwrap_or("미지정");
    let fitness_level = profile.fitness_level.as_deref().unwrap_or("미지정");
    let fitness_factor = profile.fitness_factor.as_deref().unwrap_or("미지정");
    format!("대상군: {target_group}, 체력 수준: {fitness_level}, 체력 요인: {fitness_factor}")
}

fn vocabulary_clause() -> String {
    format!(
        "근육 이름은 반드시 다음 목록에서만 선택하세요: {}",
        MUSCLE_LABELS.join(", ")
    )
}

fn log_analysis_system_prompt() -> String {
    format!(
        "당신은 운동 일지를 분석하는 피트니스 코치입니다. {} \
         응답은 반드시 JSON 객체여야 하며 다음 필드를 포함합니다: \
         workoutEvaluation(string), targetMuscles(array), recommendations(array), \
         nextTargetMuscles(array), encouragement(string). 다른 텍스트는 포함하지 마세요.",
        vocabulary_clause()
    )
}

fn routine_recommendation_system_prompt() -> String {
    format!(
        "당신은 맞춤형 운동 루틴을 설계하는 피트니스 코치입니다. {} \
         응답은 반드시 JSON 객체여야 하며 다음 필드를 포함합니다: \
         strengths(string), weaknesses(string), muscleBalance{{overworked, underworked}}, \
         nextTargetMuscles(array), dailyDetails(array of {{day, focus, targetMuscles, ragQuery, estimatedDuration}}). \
         dailyDetails는 최소 3일 이상이어야 하고 각 날의 타겟 근육은 최소 3개 이상이어야 합니다. \
         exercises 필드는 포함하지 마세요 — 이후 단계에서 채워집니다.",
        vocabulary_clause()
    )
}

fn weekly_pattern_system_prompt() -> String {
    format!(
        "당신은 주간 운동 기록을 분석해 다음 주 루틴을 설계하는 피트니스 코치입니다. {} \
         응답은 반드시 JSON 객체여야 하며 다음 필드를 포함합니다: \
         strengths(string), weaknesses(string), muscleBalance{{overworked, underworked}}, \
         nextTargetMuscles(array), dailyDetails(array of {{day, focus, targetMuscles, ragQuery, estimatedDuration}}). \
         각 날의 exercises 필드는 빈 배열로 두세요 — 이후 단계에서 채워집니다.",
        vocabulary_clause()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_clause_lists_canonical_labels() {
        let clause = vocabulary_clause();
        assert!(clause.contains("큰가슴근"));
    }

    #[test]
    fn profile_block_falls_back_to_unspecified() {
        let profile = UserProfile::default();
        let block = format_profile_block(&profile);
        assert!(block.contains("미지정"));
    }
}
