//! Predicates deciding whether a locally held value and a freshly read one
//! are close enough to skip an update.
//!
//! The variable-set comparison is deliberately weak: it looks at the count
//! and at the multiset of `name` attributes only. Differences in `type`,
//! `required`, `allowedValues` and the rest go unnoticed. Callers rely on
//! this suppression, so it must not be tightened silently.

use serde_json::Value;
use tracing::warn;

/// Sentinel OpenCGA prepends to project aliases.
pub const ALIAS_PREFIX: &str = "null@";

/// Description comparison. With `check_description` off every difference is
/// suppressed.
pub fn description_equivalent(check_description: bool, old: &str, new: &str) -> bool {
    !check_description || old == new
}

/// Compare two variable-definition lists by length and sorted `name`s.
///
/// A missing or non-string `name` compares as the empty string.
pub fn variables_equivalent(old: &[Value], new: &[Value]) -> bool {
    if old.len() != new.len() {
        warn!(old = old.len(), new = new.len(), "mismatched variable set counts");
        return false;
    }

    let old_names = sorted_names(old);
    let new_names = sorted_names(new);
    if old_names != new_names {
        warn!(?old_names, ?new_names, "mismatched variable set names");
        return false;
    }
    true
}

/// String form of [`variables_equivalent`] for values held as JSON text.
/// Text that does not parse as a list counts as an empty list.
pub fn variables_json_equivalent(old: &str, new: &str) -> bool {
    variables_equivalent(&parse_list(old), &parse_list(new))
}

/// Prefix `alias` with [`ALIAS_PREFIX`] unless the sentinel already appears
/// in it.
pub fn normalize_alias(alias: &str) -> String {
    if alias.contains(ALIAS_PREFIX) {
        alias.to_string()
    } else {
        format!("{ALIAS_PREFIX}{alias}")
    }
}

/// Alias comparison after normalizing both sides.
pub fn aliases_equivalent(a: &str, b: &str) -> bool {
    normalize_alias(a) == normalize_alias(b)
}

/// A study's project reference cannot be read back from the study, so any
/// difference is suppressed.
pub fn project_reference_equivalent(_old: &str, _new: &str) -> bool {
    true
}

fn sorted_names(variables: &[Value]) -> Vec<&str> {
    let mut names: Vec<&str> = variables
        .iter()
        .map(|v| v.get("name").and_then(Value::as_str).unwrap_or(""))
        .collect();
    names.sort_unstable();
    names
}

fn parse_list(text: &str) -> Vec<Value> {
    serde_json::from_str(text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_check_toggle() {
        assert!(description_equivalent(false, "old", "new"));
        assert!(description_equivalent(true, "same", "same"));
        assert!(!description_equivalent(true, "old", "new"));
    }

    #[test]
    fn reordered_variables_are_equivalent() {
        let created = vec![json!({"name": "a"}), json!({"name": "b"})];
        let fetched = vec![json!({"name": "b"}), json!({"name": "a"})];
        assert!(variables_equivalent(&created, &fetched));
    }

    #[test]
    fn renamed_variable_requires_update() {
        let created = vec![json!({"name": "a"}), json!({"name": "b"})];
        let fetched = vec![json!({"name": "a"}), json!({"name": "c"})];
        assert!(!variables_equivalent(&created, &fetched));
    }

    #[test]
    fn length_mismatch_is_never_equivalent() {
        let one = vec![json!({"name": "a"})];
        let two = vec![json!({"name": "a"}), json!({"name": "a"})];
        assert!(!variables_equivalent(&one, &two));
    }

    #[test]
    fn attributes_other_than_name_are_ignored() {
        // Known limitation: type and required changes are not detected.
        let old = vec![json!({"name": "a", "type": "TEXT", "required": true})];
        let new = vec![json!({"name": "a", "type": "INTEGER", "required": false})];
        assert!(variables_equivalent(&old, &new));
    }

    #[test]
    fn duplicate_names_are_counted() {
        let old = vec![json!({"name": "a"}), json!({"name": "a"})];
        let new = vec![json!({"name": "a"}), json!({"name": "b"})];
        assert!(!variables_equivalent(&old, &new));
    }

    #[test]
    fn json_text_form() {
        assert!(variables_json_equivalent(
            r#"[{"name":"x","type":"TEXT"},{"name":"y"}]"#,
            r#"[{"name":"y"},{"name":"x"}]"#
        ));
        assert!(variables_json_equivalent("not json", "[]"));
        assert!(!variables_json_equivalent("not json", r#"[{"name":"x"}]"#));
    }

    #[test]
    fn alias_is_prefixed_once() {
        assert_eq!(normalize_alias("p1"), "null@p1");
        assert_eq!(normalize_alias("null@p1"), "null@p1");
        assert_eq!(normalize_alias(""), "null@");
        assert!(aliases_equivalent("p1", "null@p1"));
        assert!(!aliases_equivalent("p1", "p2"));
    }

    #[test]
    fn project_reference_is_always_suppressed() {
        assert!(project_reference_equivalent("1", "null@other"));
    }
}
