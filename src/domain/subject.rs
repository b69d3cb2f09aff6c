//! Canonical subject record flowing through the pipeline.
//!
//! A `Subject` is created once per ingestion run from a raw claims row and
//! enriched exactly once by inference and outcome labelling.

use serde::{Deserialize, Serialize};

use super::risk::RiskCategory;

/// Recorded gender of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "M"),
            Self::Female => write!(f, "F"),
        }
    }
}

/// Cohort partition assigned to an eligible subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Split {
    Train,
    Test,
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => write!(f, "TRAIN"),
            Self::Test => write!(f, "TEST"),
        }
    }
}

/// Demographic and treatment fields that raw claims extracts usually lack.
///
/// Supplied by a [`crate::ports::DemographicSource`] during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: u32,
    pub gender: Gender,
    pub current_therapy_line: u32,
    pub months_on_current_therapy: u32,
    pub specialty: String,
    pub provider_name: String,
    pub provider_id: String,
}

/// Canonical patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Identifier, unique within a run
    pub id: String,

    pub age: u32,
    pub gender: Gender,

    /// Primary diagnosis code (ICD-10 or "Unknown")
    pub diagnosis_code: String,

    /// Line of therapy, starting at 1
    pub current_therapy_line: u32,

    pub months_on_current_therapy: u32,

    /// Last visit as found in the source (or RFC 3339 ingestion time)
    pub last_visit_date: String,

    pub specialty: String,

    /// Drug or therapy procedure code
    pub drug_id: String,

    pub provider_name: String,
    pub provider_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_category: Option<RiskCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_outcome: Option<bool>,
}

/// Minimum months on the current therapy line for cohort eligibility.
pub const MIN_MONTHS_ON_THERAPY: u32 = 1;

impl Subject {
    /// Build a fresh (not yet scored) subject from claims fields and demographics.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        diagnosis_code: impl Into<String>,
        drug_id: impl Into<String>,
        last_visit_date: impl Into<String>,
        demographics: Demographics,
    ) -> Self {
        Self {
            id: id.into(),
            age: demographics.age,
            gender: demographics.gender,
            diagnosis_code: diagnosis_code.into(),
            current_therapy_line: demographics.current_therapy_line,
            months_on_current_therapy: demographics.months_on_current_therapy,
            last_visit_date: last_visit_date.into(),
            specialty: demographics.specialty,
            drug_id: drug_id.into(),
            provider_name: demographics.provider_name,
            provider_id: demographics.provider_id,
            risk_score: None,
            risk_category: None,
            split: None,
            actual_outcome: None,
        }
    }

    /// Whether the subject passes the therapy-duration gate.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.months_on_current_therapy >= MIN_MONTHS_ON_THERAPY
    }

    /// Copy of this subject with a cohort partition assigned.
    #[must_use]
    pub fn with_split(&self, split: Split) -> Self {
        Self {
            split: Some(split),
            ..self.clone()
        }
    }

    /// Copy of this subject carrying a risk score; the category is derived from it.
    #[must_use]
    pub fn with_score(&self, score: f64) -> Self {
        Self {
            risk_score: Some(score),
            risk_category: Some(RiskCategory::from_score(score)),
            ..self.clone()
        }
    }

    /// The minimal feature tuple sent to a risk scorer.
    #[must_use]
    pub fn features(&self) -> FeatureTuple {
        FeatureTuple {
            id: self.id.clone(),
            age: self.age,
            current_therapy_line: self.current_therapy_line,
            months_on_current_therapy: self.months_on_current_therapy,
            specialty: self.specialty.clone(),
            provider: self.provider_name.clone(),
        }
    }
}

/// Features disclosed to the external reasoning engine for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTuple {
    pub id: String,
    pub age: u32,
    pub current_therapy_line: u32,
    pub months_on_current_therapy: u32,
    pub specialty: String,
    pub provider: String,
}

#[cfg(test)]
pub(crate) fn sample_subject(id: &str, months: u32) -> Subject {
    Subject::new(
        id,
        "C50.911",
        "J9355",
        "2024-03-01",
        Demographics {
            age: 61,
            gender: Gender::Female,
            current_therapy_line: 1,
            months_on_current_therapy: months,
            specialty: "Oncology".to_string(),
            provider_name: "Dr. Reyes".to_string(),
            provider_id: "PRV-104".to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_floor() {
        assert!(!sample_subject("a", 0).is_eligible());
        assert!(sample_subject("b", 1).is_eligible());
        assert!(sample_subject("c", 24).is_eligible());
    }

    #[test]
    fn test_with_score_derives_category() {
        let subject = sample_subject("a", 3).with_score(0.82);
        assert_eq!(subject.risk_score, Some(0.82));
        assert_eq!(subject.risk_category, Some(RiskCategory::High));
        assert!(subject.split.is_none());
    }

    #[test]
    fn test_with_split_leaves_original_untouched() {
        let original = sample_subject("a", 3);
        let assigned = original.with_split(Split::Test);
        assert_eq!(assigned.split, Some(Split::Test));
        assert!(original.split.is_none());
    }

    #[test]
    fn test_feature_tuple_serializes_camel_case() {
        let json = serde_json::to_value(sample_subject("P-1", 4).features()).expect("Should serialize");
        assert_eq!(json["id"], "P-1");
        assert_eq!(json["monthsOnCurrentTherapy"], 4);
        assert_eq!(json["provider"], "Dr. Reyes");
    }
}
