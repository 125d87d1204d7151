//! Structured job failure taxonomy.
//!
//! Every terminal failure carries a dot-namespaced machine-readable code
//! (category.cause), a human message, and a remediation hint suitable for
//! direct display.

use std::fmt;

/// Machine-readable failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobErrorCode {
    TripNotFound,
    ConstraintsNotConfirmed,
    PlanRequired,
    PlanIndexOutOfRange,
    PlanOutputInvalid,
    ItineraryOutputInvalid,
    NoCandidates,
    WorkerException,
}

impl JobErrorCode {
    /// The dot-namespaced code string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TripNotFound => "JOB.TRIP_NOT_FOUND",
            Self::ConstraintsNotConfirmed => "JOB.CONSTRAINTS_NOT_CONFIRMED",
            Self::PlanRequired => "JOB.PLAN_REQUIRED",
            Self::PlanIndexOutOfRange => "JOB.PLAN_INDEX_OUT_OF_RANGE",
            Self::PlanOutputInvalid => "JOB.PLAN_OUTPUT_INVALID",
            Self::ItineraryOutputInvalid => "JOB.ITINERARY_OUTPUT_INVALID",
            Self::NoCandidates => "PROVIDER.NO_CANDIDATES",
            Self::WorkerException => "INTERNAL.WORKER_EXCEPTION",
        }
    }

    /// Default human message.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::TripNotFound => "The referenced trip does not exist",
            Self::ConstraintsNotConfirmed => "Trip constraints have not been confirmed",
            Self::PlanRequired => "No plan has been generated for this trip yet",
            Self::PlanIndexOutOfRange => "The requested plan option does not exist",
            Self::PlanOutputInvalid => "Plan generation produced structurally invalid output",
            Self::ItineraryOutputInvalid => {
                "Itinerary generation produced structurally invalid output"
            }
            Self::NoCandidates => "Upstream providers returned no usable candidates",
            Self::WorkerException => "An unexpected error interrupted the job",
        }
    }

    /// Remediation hint shown alongside the failure.
    pub fn next_action(self) -> &'static str {
        match self {
            Self::TripNotFound => "Create the trip again and resubmit the job",
            Self::ConstraintsNotConfirmed => {
                "Review and confirm the trip constraints, then resubmit"
            }
            Self::PlanRequired => "Generate a plan first, then request the itinerary",
            Self::PlanIndexOutOfRange => "Pick one of the three generated options",
            Self::PlanOutputInvalid | Self::ItineraryOutputInvalid => {
                "Contact support; the provider data needs investigation"
            }
            Self::NoCandidates => "Try different dates or destination, or retry later",
            Self::WorkerException => "Retry the job; contact support if it keeps failing",
        }
    }
}

impl fmt::Display for JobErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal job failure ready to be written to the job row.
#[derive(Debug, Clone)]
pub struct JobFailure {
    pub code: JobErrorCode,
    pub message: String,
    pub next_action: String,
}

impl JobFailure {
    /// Failure with the code's default message and hint.
    pub fn new(code: JobErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_owned(),
            next_action: code.next_action().to_owned(),
        }
    }

    /// Failure with a custom message.
    pub fn with_message(code: JobErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            next_action: code.next_action().to_owned(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for JobFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dot_namespaced() {
        let codes = [
            JobErrorCode::TripNotFound,
            JobErrorCode::ConstraintsNotConfirmed,
            JobErrorCode::PlanRequired,
            JobErrorCode::PlanIndexOutOfRange,
            JobErrorCode::PlanOutputInvalid,
            JobErrorCode::ItineraryOutputInvalid,
            JobErrorCode::NoCandidates,
            JobErrorCode::WorkerException,
        ];
        for code in codes {
            assert!(code.as_str().contains('.'), "{code} is not namespaced");
            assert!(!code.default_message().is_empty());
            assert!(!code.next_action().is_empty());
        }
    }

    #[test]
    fn failure_carries_defaults() {
        let failure = JobFailure::new(JobErrorCode::ConstraintsNotConfirmed);
        assert_eq!(failure.code.as_str(), "JOB.CONSTRAINTS_NOT_CONFIRMED");
        assert_eq!(
            failure.message,
            JobErrorCode::ConstraintsNotConfirmed.default_message()
        );
    }
}
