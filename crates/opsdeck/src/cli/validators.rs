//! Clap value parsers with helpful error messages.

use crate::domain::{self, AppKey, status};

/// Validate an issue title argument.
///
/// # Errors
///
/// Returns a message when the title is empty or too long.
pub fn validate_title(title: &str) -> Result<String, String> {
    let trimmed = title.trim();
    domain::validate_title(trimmed)?;
    Ok(trimmed.to_string())
}

/// Validate an app key argument against the registry.
///
/// # Errors
///
/// Returns a message listing the registered keys.
pub fn validate_app_key(app: &str) -> Result<String, String> {
    let trimmed = app.trim();
    if AppKey::from_key(trimmed).is_none() {
        return Err(format!(
            "unknown app key '{trimmed}' (registered: {})",
            AppKey::ALL
                .iter()
                .map(|a| a.key())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a non-empty issue target (display id or document key).
///
/// # Errors
///
/// Returns a message for an empty target.
pub fn validate_target(target: &str) -> Result<String, String> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err("target must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate a terminal status for the `close` command.
///
/// # Errors
///
/// Returns a message listing the terminal statuses.
pub fn validate_terminal_status(value: &str) -> Result<String, String> {
    let normalized = value.trim().to_ascii_lowercase();
    if !status::is_terminal(&normalized) {
        return Err(format!(
            "'{value}' is not a terminal status (one of: {})",
            status::TERMINAL.join(", ")
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::ok("edcore", true)]
    #[case::padded(" pulse ", true)]
    #[case::unknown("storefront", false)]
    #[case::prefix_not_key("EC", false)]
    fn app_key_validation(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(validate_app_key(raw).is_ok(), ok);
    }

    #[rstest]
    #[case::closed("closed", true)]
    #[case::mixed_case("Resolved", true)]
    #[case::open_status("new", false)]
    #[case::nonsense("fixed!!", false)]
    fn terminal_status_validation(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(validate_terminal_status(raw).is_ok(), ok);
    }

    #[test]
    fn empty_target_is_rejected() {
        assert!(validate_target("  ").is_err());
        assert_eq!(validate_target(" EC-4 ").unwrap(), "EC-4");
    }
}
