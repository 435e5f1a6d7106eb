//! Load balancing strategies for backend selection.

mod round_robin;

pub use round_robin::RoundRobin;

use http::Uri;

/// A load balancing strategy over an ordered set of backends.
///
/// Implementations are stateful and are not internally synchronized; the
/// owning backend group serializes access through a mutex.
pub trait LoadBalancer: Send + std::fmt::Debug {
    /// Select the next backend URL.
    fn next(&mut self) -> Uri;
}

/// Identifier of a bundled load balancing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Cycle through backends in order, wrapping around.
    RoundRobin,
}

impl Strategy {
    /// Parse a strategy name from configuration.
    ///
    /// An empty name selects the default (`round_robin`); unrecognized
    /// names return `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "" | "round_robin" => Some(Self::RoundRobin),
            _ => None,
        }
    }

    /// Instantiate the strategy over the given backends.
    #[must_use]
    pub fn instantiate(self, backends: Vec<Uri>) -> Box<dyn LoadBalancer> {
        match self {
            Self::RoundRobin => Box::new(RoundRobin::new(backends)),
        }
    }
}
