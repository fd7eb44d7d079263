//! `FAIL_TO_PASS` decoding and test command assembly.
//!
//! SWE-bench dumps store the failing tests either as a real JSON array or as
//! a string holding a (sometimes single-quoted) Python list literal. Both
//! shapes are decoded once into [`FailingTests`].

use serde_json::Value;

use crate::error::FailingTestsError;

/// Generic invocation used when no specific tests can be derived.
pub const FALLBACK_TEST_COMMAND: &str = "python -m pytest -rA -vv";

const PYTEST_PREFIX: &str = "python -m pytest";
const PYTEST_FLAGS: &str = "-rA -vv -o console_output_style=classic --tb=short";

/// Decoded failing-tests field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailingTests {
    /// Field missing, `null`, or an empty string.
    Absent,
    /// A bare test identifier.
    Single(String),
    /// A list of test identifiers, possibly empty.
    List(Vec<String>),
}

impl FailingTests {
    /// Decode the raw JSON value of the field.
    pub fn parse(raw: Option<&Value>) -> Result<Self, FailingTestsError> {
        match raw {
            None | Some(Value::Null) => Ok(Self::Absent),
            Some(Value::String(s)) => Self::parse_str(s),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(position, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(FailingTestsError::NonStringElement { position }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Some(Value::Bool(_)) => Err(FailingTestsError::UnsupportedType("bool")),
            Some(Value::Number(_)) => Err(FailingTestsError::UnsupportedType("number")),
            Some(Value::Object(_)) => Err(FailingTestsError::UnsupportedType("object")),
        }
    }

    /// Decode the string form of the field.
    pub fn parse_str(raw: &str) -> Result<Self, FailingTestsError> {
        let trimmed = raw.trim_start();
        if trimmed.is_empty() {
            return Ok(Self::Absent);
        }
        if !trimmed.starts_with('[') {
            return Ok(Self::Single(raw.to_string()));
        }

        // Python list literals use single quotes
        let normalized = trimmed.replace('\'', "\"");
        serde_json::from_str::<Vec<String>>(&normalized)
            .map(Self::List)
            .map_err(|source| FailingTestsError::InvalidList {
                raw: raw.to_string(),
                source,
            })
    }

    /// Test identifiers in pytest node form.
    pub fn identifiers(&self) -> Vec<String> {
        match self {
            Self::Absent => Vec::new(),
            Self::Single(test) => vec![to_pytest_id(test)],
            Self::List(tests) => tests.iter().map(|t| to_pytest_id(t)).collect(),
        }
    }

    /// Build the pytest command for these tests, or the fallback when there
    /// is nothing to select.
    pub fn to_command(&self) -> String {
        let ids = self.identifiers();
        if ids.is_empty() {
            FALLBACK_TEST_COMMAND.to_string()
        } else {
            format!("{} {} {}", PYTEST_PREFIX, ids.join(" "), PYTEST_FLAGS)
        }
    }
}

/// Rewrite a Django-style `name (qualifier)` identifier into
/// `qualifier::name`. Plain test paths are returned unchanged.
pub fn to_pytest_id(test: &str) -> String {
    if !test.ends_with(')') {
        return test.to_string();
    }
    match test.split_once(" (") {
        Some((name, rest)) => {
            let qualifier = rest.split(" (").next().unwrap_or(rest);
            format!("{}::{}", qualifier.trim_end_matches(')'), name)
        }
        None => test.to_string(),
    }
}

/// Resolve the test command for an entry.
///
/// An explicit command always wins. Otherwise the failing tests field is
/// decoded; a decode failure is logged and the fallback used.
pub fn resolve_test_command(
    explicit: Option<&str>,
    failing: Option<&Value>,
    index: usize,
) -> String {
    if let Some(cmd) = explicit.filter(|c| !c.is_empty()) {
        return cmd.to_string();
    }

    match FailingTests::parse(failing) {
        Ok(tests) => tests.to_command(),
        Err(e) => {
            tracing::warn!(index, error = %e, "Failed to parse FAIL_TO_PASS field");
            FALLBACK_TEST_COMMAND.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_django_identifier_rewritten() {
        assert_eq!(
            to_pytest_id("test_str (model_enums.tests.ChoicesTests)"),
            "model_enums.tests.ChoicesTests::test_str"
        );
    }

    #[test]
    fn test_plain_identifier_unchanged() {
        assert_eq!(
            to_pytest_id("tests/test_api.py::test_get"),
            "tests/test_api.py::test_get"
        );
        assert_eq!(to_pytest_id("test_x(foo)"), "test_x(foo)");
    }

    #[test]
    fn test_nested_parentheses_take_first_qualifier() {
        assert_eq!(to_pytest_id("test_a (pkg.Case (sub))"), "pkg.Case::test_a");
    }

    #[test]
    fn test_parse_single_quoted_list() {
        let parsed = FailingTests::parse_str("['a.py::t1', 'b.py::t2']").unwrap();
        assert_eq!(
            parsed,
            FailingTests::List(vec!["a.py::t1".to_string(), "b.py::t2".to_string()])
        );
    }

    #[test]
    fn test_parse_bare_string() {
        let parsed = FailingTests::parse_str("tests/test_x.py::test_y").unwrap();
        assert_eq!(parsed, FailingTests::Single("tests/test_x.py::test_y".to_string()));
    }

    #[test]
    fn test_parse_empty_forms() {
        assert_eq!(FailingTests::parse(None).unwrap(), FailingTests::Absent);
        assert_eq!(FailingTests::parse(Some(&Value::Null)).unwrap(), FailingTests::Absent);
        assert_eq!(FailingTests::parse_str("").unwrap(), FailingTests::Absent);
        assert_eq!(FailingTests::parse_str("[]").unwrap(), FailingTests::List(vec![]));
    }

    #[test]
    fn test_parse_json_array_value() {
        let value = json!(["test_a (app.tests.A)", "tests/test_b.py::test_b"]);
        let parsed = FailingTests::parse(Some(&value)).unwrap();
        assert_eq!(
            parsed.identifiers(),
            vec!["app.tests.A::test_a".to_string(), "tests/test_b.py::test_b".to_string()]
        );
    }

    #[test]
    fn test_parse_rejects_non_string_elements() {
        let value = json!(["ok", 3]);
        let err = FailingTests::parse(Some(&value)).unwrap_err();
        assert!(matches!(err, FailingTestsError::NonStringElement { position: 1 }));
    }

    #[test]
    fn test_parse_rejects_malformed_list() {
        let err = FailingTests::parse_str("[\"unterminated").unwrap_err();
        assert!(matches!(err, FailingTestsError::InvalidList { .. }));
        assert!(FailingTests::parse(Some(&json!(42))).is_err());
    }

    #[test]
    fn test_command_for_django_list() {
        let raw = json!("[\"test_str (model_enums.tests.ChoicesTests)\"]");
        let cmd = resolve_test_command(None, Some(&raw), 0);
        assert!(cmd.contains("model_enums.tests.ChoicesTests::test_str"));
        assert_eq!(
            cmd,
            "python -m pytest model_enums.tests.ChoicesTests::test_str -rA -vv -o console_output_style=classic --tb=short"
        );
    }

    #[test]
    fn test_command_falls_back_for_empty_or_absent() {
        assert_eq!(resolve_test_command(None, Some(&json!("[]")), 0), FALLBACK_TEST_COMMAND);
        assert_eq!(resolve_test_command(None, Some(&json!([])), 0), FALLBACK_TEST_COMMAND);
        assert_eq!(resolve_test_command(None, None, 0), FALLBACK_TEST_COMMAND);
        assert_eq!(resolve_test_command(None, Some(&json!("")), 0), FALLBACK_TEST_COMMAND);
    }

    #[test]
    fn test_command_falls_back_on_parse_error() {
        let raw = json!("[not json");
        assert_eq!(resolve_test_command(None, Some(&raw), 3), FALLBACK_TEST_COMMAND);
    }

    #[test]
    fn test_explicit_command_wins() {
        let raw = json!("[\"test_str (model_enums.tests.ChoicesTests)\"]");
        assert_eq!(
            resolve_test_command(Some("tox -e py311"), Some(&raw), 0),
            "tox -e py311"
        );
    }

    #[test]
    fn test_empty_explicit_command_ignored() {
        let raw = json!("tests/test_a.py");
        assert_eq!(
            resolve_test_command(Some(""), Some(&raw), 0),
            "python -m pytest tests/test_a.py -rA -vv -o console_output_style=classic --tb=short"
        );
    }

    #[test]
    fn test_bare_django_string_rewritten() {
        let raw = json!("test_str (app.tests.A)");
        let parsed = FailingTests::parse(Some(&raw)).unwrap();
        assert_eq!(parsed, FailingTests::Single("test_str (app.tests.A)".to_string()));
        assert_eq!(parsed.identifiers(), vec!["app.tests.A::test_str".to_string()]);
        assert_eq!(
            resolve_test_command(None, Some(&raw), 0),
            "python -m pytest app.tests.A::test_str -rA -vv -o console_output_style=classic --tb=short"
        );
    }
}
