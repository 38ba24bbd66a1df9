//! C7: Query Validator. Guarantees a search query handed to C3 cannot
//! be defeated by a vague or empty LLM-composed string. Grounded on
//! `_validate_rag_query`'s five-step shape.

use crate::models::UserProfile;
use crate::vocabulary::all_equipment_keywords;

const MIN_QUERY_LEN: usize = 3;
const MAX_QUERY_LEN: usize = 200;

const INTENT_KEYWORDS: &[&str] = &["운동", "강화", "개발", "훈련", "트레이닝", "스트레칭", "회복"];

/// `Validate(query, targets, profile, diversity, enforceEquipment) → validatedQuery`.
pub fn validate(
    query: &str,
    targets: &[String],
    _profile: &UserProfile,
    preferred_equipment: &[String],
    enforce_equipment: bool,
) -> String {
    let mut q = query.trim().to_string();

    if q.chars().count() < MIN_QUERY_LEN {
        q = targets
            .first()
            .cloned()
            .unwrap_or_else(|| "전신 운동".to_string());
    }

    if q.chars().count() > MAX_QUERY_LEN {
        q = q.chars().take(MAX_QUERY_LEN).collect();
    }

    if let Some(first_target) = targets.first() {
        if !targets.iter().any(|t| q.contains(t.as_str())) {
            q.push(' ');
            q.push_str(first_target);
        }
    }

    if enforce_equipment && !preferred_equipment.is_empty() {
        let category_keywords = all_equipment_keywords();
        let q_lower = q.to_lowercase();
        let has_equipment_keyword = category_keywords.iter().any(|k| q_lower.contains(k.as_str()))
            || preferred_equipment.iter().any(|e| q_lower.contains(&e.to_lowercase()));

        if !has_equipment_keyword {
            if let Some(first) = preferred_equipment.first() {
                q.push(' ');
                q.push_str(first);
            }
        }
    }

    if !INTENT_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        q.push(' ');
        q.push_str(INTENT_KEYWORDS[0]);
    }

    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_falls_back_to_first_target() {
        let profile = UserProfile::default();
        let result = validate("", &["큰가슴근".to_string()], &profile, &[], false);
        assert!(result.contains("큰가슴근"));
    }

    #[test]
    fn long_query_is_truncated() {
        let profile = UserProfile::default();
        let long_query = "가".repeat(250);
        let result = validate(&long_query, &["큰가슴근".to_string()], &profile, &[], false);
        assert!(result.chars().count() <= MAX_QUERY_LEN + "큰가슴근".chars().count() + 10);
    }

    #[test]
    fn single_korean_character_counts_as_too_short() {
        let profile = UserProfile::default();
        // One Korean character is 3 bytes but a single codepoint — must
        // still be treated as below MIN_QUERY_LEN and fall back.
        let result = validate("등", &["큰가슴근".to_string()], &profile, &[], false);
        assert!(result.contains("큰가슴근"));
    }

    #[test]
    fn missing_target_is_appended() {
        let profile = UserProfile::default();
        let result = validate("벤치프레스 동작", &["큰가슴근".to_string()], &profile, &[], false);
        assert!(result.contains("큰가슴근"));
    }

    #[test]
    fn missing_intent_keyword_is_appended() {
        let profile = UserProfile::default();
        let result = validate("큰가슴근", &["큰가슴근".to_string()], &profile, &[], false);
        assert!(INTENT_KEYWORDS.iter().any(|kw| result.contains(kw)));
    }

    #[test]
    fn enforced_equipment_appends_preferred_item() {
        let profile = UserProfile::default();
        let result = validate(
            "큰가슴근 운동",
            &["큰가슴근".to_string()],
            &profile,
            &["덤벨".to_string()],
            true,
        );
        assert!(result.contains("덤벨"));
    }
}
