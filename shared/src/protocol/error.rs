use thiserror::Error;

/// Misuse of the `Protocol` builder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// `build()` has run; tables and classes can no longer be added
    #[error("Protocol is already built and locked; no further tables or classes can be added")]
    AlreadyLocked,

    /// Class ids and schemas only exist once `build()` has run
    #[error("Protocol has not been built; call build() before replicating with it")]
    NotBuilt,
}
