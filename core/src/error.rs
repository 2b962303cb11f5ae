use thiserror::Error;

/// Flat error taxonomy shared by every component in the coordination plane.
///
/// Each RPC boundary (`identity`, `gameplane`) maps these onto the status
/// codes named in the spec's error handling design: INVALID_ARGUMENT,
/// PERMISSION_DENIED/UNAUTHENTICATED, FAILED_PRECONDITION, NOT_FOUND,
/// RESOURCE_EXHAUSTED, UNAVAILABLE/INTERNAL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Numeric status code used at RPC boundaries, mirroring the
    /// grpc `codes.Code` values the original Go source returned.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => 3,
            Error::NotFound(_) => 5,
            Error::PermissionDenied(_) => 7,
            Error::ResourceExhausted(_) => 8,
            Error::FailedPrecondition(_) => 9,
            Error::Unauthenticated(_) => 16,
            Error::Internal(_) => 13,
            Error::Unavailable(_) => 14,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
