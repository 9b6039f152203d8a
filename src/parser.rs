//! Classification of terraform output.
//!
//! Everything here is pure: the same text always yields the same result.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::ParseError,
    project::{ChangeSummary, Validity},
};

pub const VALID_MARKER: &str = "The configuration is valid";
pub const ERROR_MARKER: &str = "Error:";
pub const NO_CHANGES_MARKER: &str = "No changes.";
pub const DRIFT_MARKERS: &[&str] = &[
    "Objects have changed outside of Terraform",
    "state diverged from real infrastructure",
];

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[mGKHF]").expect("valid regex"));

static PLAN_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Plan: (\d+) to add, (\d+) to change, (\d+) to destroy\.").expect("valid regex")
});

pub fn strip_ansi(raw: &str) -> String {
    ANSI_ESCAPE.replace_all(raw, "").into_owned()
}

pub fn parse_validity(raw: &str) -> Validity {
    if strip_ansi(raw).contains(VALID_MARKER) {
        Validity::Valid
    } else {
        Validity::Invalid
    }
}

/// Classify plan output. Error and drift markers win over a summary line,
/// since terraform can print both.
pub fn parse_changes(raw: &str) -> Result<ChangeSummary, ParseError> {
    let output = strip_ansi(raw);

    if output.contains(ERROR_MARKER) {
        return Ok(ChangeSummary::PlanError);
    }
    if DRIFT_MARKERS.iter().any(|marker| output.contains(marker)) {
        return Ok(ChangeSummary::DriftError);
    }
    if output.contains(NO_CHANGES_MARKER) {
        return Ok(ChangeSummary::none());
    }

    let captures = PLAN_SUMMARY
        .captures(&output)
        .ok_or(ParseError::MissingSummary)?;

    let count = |index: usize| -> Result<u32, ParseError> {
        let text = &captures[index];
        text.parse()
            .map_err(|_| ParseError::InvalidCount(text.to_string()))
    };

    Ok(ChangeSummary::counts(count(1)?, count(2)?, count(3)?))
}

/// After an apply nothing is pending unless terraform reported an error.
pub fn parse_apply(raw: &str) -> ChangeSummary {
    if strip_ansi(raw).contains(ERROR_MARKER) {
        ChangeSummary::PlanError
    } else {
        ChangeSummary::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "Plan: 8 to add, 7 to change, 8 to destroy.";

    #[test]
    fn test_parses_summary_line() {
        let output = format!("Terraform will perform the following actions:\n\n{SUMMARY}\n");
        assert_eq!(parse_changes(&output), Ok(ChangeSummary::counts(8, 7, 8)));
    }

    #[test]
    fn test_parses_summary_with_escape_codes() {
        let output = "\x1b[1mPlan:\x1b[0m 8 to add, 7 to change, 8 to destroy.";
        assert_eq!(parse_changes(output), Ok(ChangeSummary::counts(8, 7, 8)));
    }

    #[test]
    fn test_parses_json_log_line() {
        let output = r#"{"@level":"info","@message":"Plan: 8 to add, 7 to change, 8 to destroy.","changes":{"add":8,"change":7,"import":0,"remove":8,"operation":"plan"}}"#;
        assert_eq!(parse_changes(output), Ok(ChangeSummary::counts(8, 7, 8)));
    }

    #[test]
    fn test_error_wins_over_summary() {
        let before = format!("Error: Unsupported attribute\n\n{SUMMARY}");
        let after = format!("{SUMMARY}\nError: Unsupported attribute");
        assert_eq!(parse_changes(&before), Ok(ChangeSummary::PlanError));
        assert_eq!(parse_changes(&after), Ok(ChangeSummary::PlanError));
    }

    #[test]
    fn test_error_wins_over_drift() {
        let output = "Objects have changed outside of Terraform\nError: boom";
        assert_eq!(parse_changes(output), Ok(ChangeSummary::PlanError));
    }

    #[test]
    fn test_drift_detected() {
        for marker in DRIFT_MARKERS {
            let output = format!("Note: {marker}\n\n{SUMMARY}");
            assert_eq!(parse_changes(&output), Ok(ChangeSummary::DriftError));
        }
    }

    #[test]
    fn test_no_changes() {
        let output = "No changes. Your infrastructure matches the configuration.";
        assert_eq!(parse_changes(output), Ok(ChangeSummary::none()));
    }

    #[test]
    fn test_missing_summary_is_parse_error() {
        assert_eq!(parse_changes("something unexpected"), Err(ParseError::MissingSummary));
    }

    #[test]
    fn test_oversized_count_is_parse_error() {
        let output = "Plan: 99999999999 to add, 0 to change, 0 to destroy.";
        assert_eq!(
            parse_changes(output),
            Err(ParseError::InvalidCount("99999999999".to_string()))
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let output = format!("\x1b[32m{SUMMARY}\x1b[0m");
        assert_eq!(parse_changes(&output), parse_changes(&output));
    }

    #[test]
    fn test_validity() {
        assert_eq!(
            parse_validity("\x1b[32m\x1b[1mSuccess!\x1b[0m The configuration is valid.\n"),
            Validity::Valid
        );
        assert_eq!(parse_validity("Error: Missing required argument"), Validity::Invalid);
        assert_eq!(parse_validity(""), Validity::Invalid);
    }

    #[test]
    fn test_apply() {
        assert_eq!(parse_apply("Apply complete! Resources: 1 added"), ChangeSummary::none());
        assert_eq!(parse_apply("Error: creating bucket"), ChangeSummary::PlanError);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1m\x1b[31mError:\x1b[0m x"), "Error: x");
    }
}
