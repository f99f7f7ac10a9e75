use thiserror::Error;

/// Rejections raised while resolving a topology request, before anything is generated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Not enough racks for {required} {noun}: {racks} racks × {per_rack} devices/rack = {capacity} capacity")]
    Capacity {
        required: usize,
        /// "leaves" or "access switches"
        noun: &'static str,
        racks: usize,
        per_rack: usize,
        capacity: usize,
    },
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
