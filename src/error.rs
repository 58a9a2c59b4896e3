/// Domain failures that clients receive as `{success: false, error: "..."}`
/// bodies under a success HTTP status, never as 4xx/5xx.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Username already taken")]
    DuplicateUsername,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Session not found")]
    SessionNotFound,
}
