//! Generation flows: plan packages and day-by-day itineraries.

pub mod itinerary;
pub mod plans;

use thiserror::Error;

use crate::optimizer::OptimizerError;

/// Error surface of the generation flows.
///
/// Optimizer failures stay typed so the job runner can map them onto the
/// provider error taxonomy; everything else is plumbing.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
