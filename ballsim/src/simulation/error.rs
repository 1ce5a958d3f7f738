//! Error types for the simulation core.
//!
//! Only resource and configuration problems surface as errors. Numerical
//! degeneracy inside the collision response is handled in place (the contact
//! is skipped for the frame) and never reaches the caller.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised while sizing or populating a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Growing per-body or tree storage failed.
    #[error("failed to grow storage to {requested} elements")]
    Allocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// The body count exceeds what the fixed traversal stacks can address.
    #[error("{requested} bodies requested, at most {max} supported")]
    TooManyBodies { requested: usize, max: usize },

    /// Rejection sampling could not fit a body inside the container.
    #[error("could not place body {body} inside the container after {attempts} attempts")]
    Placement { body: usize, attempts: usize },

    /// Malformed configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the simulation core.
pub type SimResult<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SimError::TooManyBodies { requested: 10, max: 5 };
        assert_eq!(format!("{err}"), "10 bodies requested, at most 5 supported");

        let err = SimError::Config("x must have 3 components".into());
        assert!(format!("{err}").contains("3 components"));
    }
}
