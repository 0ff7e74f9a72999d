pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Key not found")]
    KeyNotFound,

    #[error("An entry with the same key already exists")]
    DuplicateKey,

    /// Every slot of a fixed map is in use. Never raised as a panic.
    #[error("Fixed map is full")]
    TableFull,
}
