use std::error::Error as StdError;

/// Errors that can occur while taking an integration step.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("time step must be finite and greater than zero, got {0}")]
    InvalidTimestep(f64),

    #[error("model error: {0}")]
    Model(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn model<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Model(Box::new(err))
    }
}
