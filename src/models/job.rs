//! Processing job state machine.
//!
//! One job tracks one pipeline run. Stages advance monotonically within a
//! run; COMPLETED and ERROR are terminal. The transition function is total,
//! so an illegal advance is rejected at the model layer instead of by
//! convention in callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cache::AnalysisKind;

/// Overall status of a processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Named phase of a job's execution, used for both state-machine control
/// and metric attribution. String values are wire-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    Uploaded,
    Preprocessing,
    ExtractingText,
    Ocr,
    Processing,
    AiAnalysis,
    Completed,
    Error,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "UPLOADED",
            Self::Preprocessing => "PREPROCESSING",
            Self::ExtractingText => "EXTRACTING_TEXT",
            Self::Ocr => "OCR",
            Self::Processing => "PROCESSING",
            Self::AiAnalysis => "AI_ANALYSIS",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UPLOADED" => Some(Self::Uploaded),
            "PREPROCESSING" => Some(Self::Preprocessing),
            "EXTRACTING_TEXT" => Some(Self::ExtractingText),
            "OCR" => Some(Self::Ocr),
            "PROCESSING" => Some(Self::Processing),
            "AI_ANALYSIS" => Some(Self::AiAnalysis),
            "COMPLETED" => Some(Self::Completed),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Monotonic position in the forward path. ERROR has no rank; it is
    /// reachable from any non-terminal stage.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Uploaded => Some(0),
            Self::Preprocessing => Some(1),
            Self::ExtractingText => Some(2),
            Self::Ocr => Some(3),
            Self::Processing => Some(4),
            Self::AiAnalysis => Some(5),
            Self::Completed => Some(6),
            Self::Error => None,
        }
    }

    /// Total transition function: forward moves must strictly increase the
    /// rank (stages may be skipped, never revisited); ERROR is legal from
    /// any non-terminal stage; nothing leaves a terminal stage.
    pub fn can_transition_to(&self, next: JobStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next.rank() {
            None => true, // ERROR
            Some(next_rank) => match self.rank() {
                Some(cur_rank) => next_rank > cur_rank,
                None => false,
            },
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tracked execution of the pipeline for a single request.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: String,
    pub content_hash: String,
    pub analysis_kind: AnalysisKind,
    pub status: JobStatus,
    pub current_stage: JobStage,
    pub error_message: Option<String>,
    pub error_trace: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set only when status becomes COMPLETED.
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(JobStage::Uploaded.can_transition_to(JobStage::Preprocessing));
        assert!(JobStage::Uploaded.can_transition_to(JobStage::ExtractingText));
        assert!(JobStage::Preprocessing.can_transition_to(JobStage::Ocr));
        assert!(JobStage::ExtractingText.can_transition_to(JobStage::AiAnalysis));
        assert!(JobStage::Ocr.can_transition_to(JobStage::Processing));
        assert!(JobStage::AiAnalysis.can_transition_to(JobStage::Completed));
    }

    #[test]
    fn test_stages_never_revisited() {
        assert!(!JobStage::Ocr.can_transition_to(JobStage::ExtractingText));
        assert!(!JobStage::AiAnalysis.can_transition_to(JobStage::Preprocessing));
        assert!(!JobStage::Processing.can_transition_to(JobStage::Processing));
    }

    #[test]
    fn test_error_reachable_from_any_non_terminal() {
        for stage in [
            JobStage::Uploaded,
            JobStage::Preprocessing,
            JobStage::ExtractingText,
            JobStage::Ocr,
            JobStage::Processing,
            JobStage::AiAnalysis,
        ] {
            assert!(stage.can_transition_to(JobStage::Error), "{stage} -> ERROR");
        }
    }

    #[test]
    fn test_terminal_stages_are_final() {
        for next in [
            JobStage::Uploaded,
            JobStage::AiAnalysis,
            JobStage::Completed,
            JobStage::Error,
        ] {
            assert!(!JobStage::Completed.can_transition_to(next));
            assert!(!JobStage::Error.can_transition_to(next));
        }
    }

    #[test]
    fn test_wire_strings_round_trip() {
        for stage in [
            JobStage::Uploaded,
            JobStage::Preprocessing,
            JobStage::ExtractingText,
            JobStage::Ocr,
            JobStage::Processing,
            JobStage::AiAnalysis,
            JobStage::Completed,
            JobStage::Error,
        ] {
            assert_eq!(JobStage::from_str(stage.as_str()), Some(stage));
        }
        for status in [JobStatus::Processing, JobStatus::Completed, JobStatus::Error] {
            assert_eq!(JobStatus::from_str(status.as_str()), Some(status));
        }
    }
}
