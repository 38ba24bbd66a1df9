//! The JSON Repairer (§4.5). Recovers truncated model output as an
//! ordered sequence of pure strategies; each returns either a parsed
//! value or "not yet" — never raises for control flow.
//!
//! This crate runs the balanced-prefix scan before the backward-repair
//! scan, the opposite of the order the mechanics were first written
//! in, because the prefix scan never drops a structurally-complete
//! trailing element the way an overly aggressive backward trim can
//! (see DESIGN.md).

use serde_json::Value;

/// Attempts to parse `raw` as JSON, falling back to repair strategies
/// in order. Returns `None` only if every strategy, including a plain
/// parse, fails.
pub fn parse_or_repair(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }

    balanced_prefix_repair(raw).or_else(|| backward_repair(raw))
}

/// Strategy 1: scan forward tracking string/escape state and a stack of
/// open brackets. Every time a bracket closes, the position right after
/// it is a safe cut point — the structure closed there is itself
/// complete, whatever remains open above it can be auto-closed. Take
/// the last such cut point (the longest recoverable prefix), strip a
/// trailing comma, close the still-open brackets in LIFO order, then
/// attempt a parse.
fn balanced_prefix_repair(raw: &str) -> Option<Value> {
    let chars: Vec<char> = raw.chars().collect();
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;
    let mut last_cut: Option<(usize, Vec<char>)> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if ch == '\\' {
            escape_next = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }

        match ch {
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                if stack.pop().is_some() {
                    last_cut = Some((i + 1, stack.clone()));
                }
            }
            _ => {}
        }
    }

    let (end, remaining) = last_cut?;
    let prefix: String = chars[..end].iter().collect();
    let trimmed = prefix.trim_end();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);

    let mut repaired = trimmed.to_string();
    for opener in remaining.iter().rev() {
        repaired.push(if *opener == '{' { '}' } else { ']' });
    }

    serde_json::from_str(&repaired).ok()
}

/// Strategy 2: scan backward from the end of `raw` looking for the
/// last complete field boundary (prefer the last comma over the last
/// colon; trim a trailing incomplete `"key":` fragment), close every
/// still-open bracket in true LIFO order after stripping a trailing
/// comma, then attempt a parse.
fn backward_repair(raw: &str) -> Option<Value> {
    let mut candidate = raw.to_string();

    let last_comma = candidate.rfind(',');
    let last_colon = candidate.rfind(':');

    match (last_comma, last_colon) {
        (Some(comma_pos), Some(colon_pos)) if comma_pos > colon_pos => {
            candidate.truncate(comma_pos);
        }
        (None, Some(colon_pos)) => {
            if let Some(field_start) = candidate[..colon_pos].rfind('"') {
                candidate.truncate(field_start);
            }
        }
        (Some(comma_pos), Some(_)) => {
            candidate.truncate(comma_pos);
        }
        _ => {}
    }

    let trimmed = candidate.trim_end();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
    let mut repaired = trimmed.to_string();

    for opener in open_bracket_stack(trimmed).iter().rev() {
        repaired.push(if *opener == '{' { '}' } else { ']' });
    }

    serde_json::from_str(&repaired).ok()
}

/// The stack of brackets still open at the end of `s`, in the order
/// they were opened, skipping anything inside a string. Used to close
/// a truncated candidate in true LIFO order rather than by bracket
/// type.
fn open_bracket_stack(s: &str) -> Vec<char> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for ch in s.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if ch == '\\' {
            escape_next = true;
            continue;
        }
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match ch {
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    stack
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_json_parses_directly() {
        let raw = r#"{"a": 1, "b": [1, 2, 3]}"#;
        let value = parse_or_repair(raw).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn truncated_trailing_array_element_recovers_via_balanced_prefix() {
        let raw = r#"{"days": [{"day": 1, "exercises": []}, {"day": 2, "exercises": []}"#;
        let value = parse_or_repair(raw).unwrap();
        assert_eq!(value["days"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn truncated_mid_field_recovers_via_backward_repair() {
        let raw = r#"{"a": 1, "b": "incomplete str"#;
        let value = parse_or_repair(raw);
        assert!(value.is_some());
        assert_eq!(value.unwrap()["a"], 1);
    }

    #[test]
    fn mixed_nesting_closes_brackets_in_true_lifo_order() {
        let raw = r#"{"a": [1, 2, {"b": 3"#;
        let value = parse_or_repair(raw).unwrap();
        assert_eq!(value["a"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unrecoverable_garbage_returns_none() {
        let raw = "not json at all {{{";
        assert!(parse_or_repair(raw).is_none());
    }
}
