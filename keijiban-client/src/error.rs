use crate::{
    api::{self, GatewayError, PostId},
    PendingOp,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected before anything was sent to the store
    #[error("invalid input: {0}")]
    Validation(#[from] api::Error),

    /// The store refused the request or could not be reached
    #[error("persistence failure: {0}")]
    Persistence(#[from] GatewayError),

    #[error("{0:?} is already in flight")]
    AlreadyPending(PendingOp),

    #[error("post {0} cannot be replied to")]
    InvalidReplyTarget(PostId),

    #[error("post {0} is not on the board")]
    NotFound(PostId),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }
}
