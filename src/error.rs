//! Error types.

use crate::i18n::SuspendMode;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a translation source's pending operation.
///
/// Shared by every requester of the same source, hence cheap to clone.
#[derive(Debug, Clone, Error)]
#[error("failed to load language file: {0:#}")]
pub struct LoadError(Arc<anyhow::Error>);

impl LoadError {
    pub fn new(error: anyhow::Error) -> Self {
        LoadError(Arc::new(error))
    }

    /// The underlying loader error.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for LoadError {
    fn from(error: anyhow::Error) -> Self {
        LoadError::new(error)
    }
}

#[derive(Debug, Clone, Error)]
pub enum TError {
    /// Translation requested outside of any provider scope.
    #[error("Unable to find TProvider context. Did you wrap your app in a TProvider?")]
    MissingScope,

    /// A provider's suspend mode was changed after it was created.
    #[error("Changing the suspend mode of a TProvider is not supported (was {was}, got {now})")]
    SuspendModeChanged { was: SuspendMode, now: SuspendMode },

    #[error(transparent)]
    Load(#[from] LoadError),
}
