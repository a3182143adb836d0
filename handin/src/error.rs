//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Core(#[from] handin_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] handin_transport::Error),
    
    #[error("Response exceeds {max} bytes")]
    ResponseTooLarge {
        max: usize,
    },
}

impl Error {
    /// Server-supplied reason text, if the server rejected a step
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Core(e) => e.rejection_reason(),
            _ => None,
        }
    }
}
