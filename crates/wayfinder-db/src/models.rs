use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Plan,
    Itinerary,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plan => "plan",
            Self::Itinerary => "itinerary",
        };
        f.write_str(s)
    }
}

impl FromStr for JobType {
    type Err = JobTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(Self::Plan),
            "itinerary" => Ok(Self::Itinerary),
            other => Err(JobTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`JobType`] string.
#[derive(Debug, Clone)]
pub struct JobTypeParseError(pub String);

impl fmt::Display for JobTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid job type: {:?}", self.0)
    }
}

impl std::error::Error for JobTypeParseError {}

// ---------------------------------------------------------------------------

/// Coarse status of a job, mirrored from its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for JobStatus {
    type Err = JobStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            other => Err(JobStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`JobStatus`] string.
#[derive(Debug, Clone)]
pub struct JobStatusParseError(pub String);

impl fmt::Display for JobStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid job status: {:?}", self.0)
    }
}

impl std::error::Error for JobStatusParseError {}

// ---------------------------------------------------------------------------

/// Named checkpoint within a job's execution.
///
/// A successful run walks the stages in order; any non-terminal stage may
/// instead jump to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    Queued,
    Starting,
    FetchCandidates,
    Generate,
    Validate,
    Persist,
    Complete,
    Failed,
}

impl JobStage {
    /// Progress percentage reported at this stage.
    pub fn progress(self) -> i32 {
        match self {
            Self::Queued => 0,
            Self::Starting => 5,
            Self::FetchCandidates => 20,
            Self::Generate => 45,
            Self::Validate => 65,
            Self::Persist => 80,
            Self::Complete | Self::Failed => 100,
        }
    }

    /// The coarse status a job carries while at this stage.
    pub fn status(self) -> JobStatus {
        match self {
            Self::Queued => JobStatus::Queued,
            Self::Complete => JobStatus::Succeeded,
            Self::Failed => JobStatus::Failed,
            _ => JobStatus::Running,
        }
    }

    /// Whether the stage is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Starting => "STARTING",
            Self::FetchCandidates => "FETCH_CANDIDATES",
            Self::Generate => "GENERATE",
            Self::Validate => "VALIDATE",
            Self::Persist => "PERSIST",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

impl FromStr for JobStage {
    type Err = JobStageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(Self::Queued),
            "STARTING" => Ok(Self::Starting),
            "FETCH_CANDIDATES" => Ok(Self::FetchCandidates),
            "GENERATE" => Ok(Self::Generate),
            "VALIDATE" => Ok(Self::Validate),
            "PERSIST" => Ok(Self::Persist),
            "COMPLETE" => Ok(Self::Complete),
            "FAILED" => Ok(Self::Failed),
            other => Err(JobStageParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`JobStage`] string.
#[derive(Debug, Clone)]
pub struct JobStageParseError(pub String);

impl fmt::Display for JobStageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid job stage: {:?}", self.0)
    }
}

impl std::error::Error for JobStageParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A trip -- the user-supplied search brief every job references.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: String,
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub flexible_days: i32,
    pub budget_total: f64,
    pub currency: String,
    pub travelers: i32,
    pub preferences: serde_json::Value,
    pub constraints: Option<serde_json::Value>,
    pub constraints_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A generation job.
///
/// Created `queued` by the enqueuing side and mutated exclusively by the
/// worker that claims it. `error_code`/`error_message`/`next_action` are
/// set only when the job fails.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub stage: JobStage,
    pub progress: i32,
    pub message: String,
    pub plan_index: Option<i32>,
    pub result: Option<serde_json::Value>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub next_action: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored plan artifact (three ranked options plus explanation).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanRecord {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub plans_json: serde_json::Value,
    pub explain_md: String,
    pub created_at: DateTime<Utc>,
}

/// A stored itinerary artifact for a chosen plan option.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ItineraryRecord {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub plan_index: i32,
    pub itinerary_json: serde_json::Value,
    pub itinerary_md: String,
    pub created_at: DateTime<Utc>,
}

/// Audit record for one generation run: input/output snapshots plus the
/// redacted tool-call trace. Replay/debugging only, never behavior-affecting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AgentRun {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub phase: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub tool_calls: serde_json::Value,
    pub model_info: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A price alert registered against a trip.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub alert_type: String,
    pub threshold: f64,
    pub frequency_minutes: i32,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A delivered (or at least recorded) alert notification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub alert_id: Uuid,
    pub channel: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_display_roundtrip() {
        for v in [JobType::Plan, JobType::Itinerary] {
            let s = v.to_string();
            let parsed: JobType = s.parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn job_type_invalid() {
        assert!("vacation".parse::<JobType>().is_err());
    }

    #[test]
    fn job_status_display_roundtrip() {
        for v in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Succeeded,
            JobStatus::Failed,
        ] {
            let s = v.to_string();
            let parsed: JobStatus = s.parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn job_stage_display_roundtrip() {
        for v in [
            JobStage::Queued,
            JobStage::Starting,
            JobStage::FetchCandidates,
            JobStage::Generate,
            JobStage::Validate,
            JobStage::Persist,
            JobStage::Complete,
            JobStage::Failed,
        ] {
            let s = v.to_string();
            let parsed: JobStage = s.parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn job_stage_invalid() {
        assert!("HALFWAY".parse::<JobStage>().is_err());
    }

    #[test]
    fn stage_progress_is_monotonic_on_success_path() {
        let path = [
            JobStage::Queued,
            JobStage::Starting,
            JobStage::FetchCandidates,
            JobStage::Generate,
            JobStage::Validate,
            JobStage::Persist,
            JobStage::Complete,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].progress() < pair[1].progress());
        }
        assert_eq!(JobStage::Complete.progress(), 100);
        assert_eq!(JobStage::Failed.progress(), 100);
    }

    #[test]
    fn stage_status_mirror() {
        assert_eq!(JobStage::Queued.status(), JobStatus::Queued);
        assert_eq!(JobStage::Starting.status(), JobStatus::Running);
        assert_eq!(JobStage::Persist.status(), JobStatus::Running);
        assert_eq!(JobStage::Complete.status(), JobStatus::Succeeded);
        assert_eq!(JobStage::Failed.status(), JobStatus::Failed);
    }
}
