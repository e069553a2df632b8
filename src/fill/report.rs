use crate::gate::VerificationGateResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStatus {
    Filled,
    SkippedEmpty,
    SkippedError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    pub field_label: String,
    pub selector: String,
    pub status: FillStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

/// Per-field fill outcomes plus the verification-gate inspection that runs
/// once all fields were attempted. Partial completion is a report, not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub outcomes: Vec<FieldOutcome>,
    pub gate: VerificationGateResult,
}

impl FillReport {
    pub fn filled_count(&self) -> usize {
        self.count(FillStatus::Filled)
    }

    pub fn skipped_empty_count(&self) -> usize {
        self.count(FillStatus::SkippedEmpty)
    }

    pub fn skipped_error_count(&self) -> usize {
        self.count(FillStatus::SkippedError)
    }

    fn count(&self, status: FillStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
