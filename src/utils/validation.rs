use anyhow::{anyhow, Result};

use crate::utils::markdown::truncate_for_display;

/// Longest slice of rejected input quoted back in an error message.
const MAX_ECHOED_INPUT: usize = 32;

/// Student names are stored verbatim; only blank input is rejected.
pub fn validate_student_name(name: &str) -> Result<()> {
    validate_required_text("Student name", name)
}

pub fn validate_subject(subject: &str) -> Result<()> {
    validate_required_text("Subject", subject)
}

pub fn validate_test_type(test_type: &str) -> Result<()> {
    validate_required_text("Test type", test_type)
}

/// Parses a practical or theoretical score. Surrounding whitespace is
/// ignored; anything that is not a whole number in the `i32` range is
/// rejected. The result is widened so totals of two scores cannot overflow.
pub fn parse_score(field: &str, input: &str) -> Result<i64> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(anyhow!("{} cannot be empty", field));
    }

    trimmed.parse::<i32>().map(i64::from).map_err(|_| {
        anyhow!(
            "{} must be a whole number from {} to {}, got '{}'",
            field,
            i32::MIN,
            i32::MAX,
            truncate_for_display(trimmed, MAX_ECHOED_INPUT)
        )
    })
}

fn validate_required_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{} cannot be empty", field));
    }

    Ok(())
}
