//! Clap-facing argument enums and their domain conversions.
//!
//! Kept separate from the domain types so clap value naming (kebab-case
//! flags) never leaks into stored data.

use crate::domain::{Classification, IssueCategory, Severity};
use clap::ValueEnum;

/// Severity argument (`s1`..`s4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    /// Critical.
    S1,
    /// High.
    S2,
    /// Medium.
    S3,
    /// Low.
    S4,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::S1 => Severity::S1,
            SeverityArg::S2 => Severity::S2,
            SeverityArg::S3 => Severity::S3,
            SeverityArg::S4 => Severity::S4,
        }
    }
}

/// Category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Sign-in and account access.
    AuthAccountAccess,
    /// User-visible flows.
    UxFlow,
    /// Assessment and scoring logic.
    AssessmentScoring,
    /// AI tutoring output.
    AiTutorOutput,
    /// Billing and subscriptions.
    BillingSubscription,
    /// Copy and static content.
    ContentCopy,
    /// Latency and resource usage.
    Performance,
    /// Uncategorized.
    Unknown,
}

impl From<CategoryArg> for IssueCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::AuthAccountAccess => IssueCategory::AuthAccountAccess,
            CategoryArg::UxFlow => IssueCategory::UxFlow,
            CategoryArg::AssessmentScoring => IssueCategory::AssessmentScoring,
            CategoryArg::AiTutorOutput => IssueCategory::AiTutorOutput,
            CategoryArg::BillingSubscription => IssueCategory::BillingSubscription,
            CategoryArg::ContentCopy => IssueCategory::ContentCopy,
            CategoryArg::Performance => IssueCategory::Performance,
            CategoryArg::Unknown => IssueCategory::Unknown,
        }
    }
}

/// Explicit classification argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassificationArg {
    /// Must be fixed before anything else.
    Blocking,
    /// Misleading output; a messaging signal.
    Misleading,
    /// Erodes tester trust.
    Trust,
    /// Cosmetic regardless of severity.
    Cosmetic,
}

impl From<ClassificationArg> for Classification {
    fn from(arg: ClassificationArg) -> Self {
        match arg {
            ClassificationArg::Blocking => Classification::Blocking,
            ClassificationArg::Misleading => Classification::Misleading,
            ClassificationArg::Trust => Classification::Trust,
            ClassificationArg::Cosmetic => Classification::Cosmetic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_args_map_one_to_one() {
        assert_eq!(Severity::from(SeverityArg::S1), Severity::S1);
        assert_eq!(Severity::from(SeverityArg::S4), Severity::S4);
    }

    #[test]
    fn category_args_cover_trust_set() {
        let category: IssueCategory = CategoryArg::BillingSubscription.into();
        assert!(category.is_trust_impacting());
        let category: IssueCategory = CategoryArg::ContentCopy.into();
        assert!(!category.is_trust_impacting());
    }
}
