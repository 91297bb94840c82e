pub mod auth;
pub mod message;
pub mod user;

use crate::security::validation::MAX_MESSAGE_LEN;

/// Typed failures raised at the entity seams. Handlers translate these
/// into the wire error codes.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("login must be 3-50 characters of letters, digits, or underscore")]
    InvalidLogin,
    #[error("password must be 6-128 characters with at least one letter and one digit")]
    WeakPassword,
    #[error("message text is empty after sanitization")]
    EmptyMessageText,
    #[error("message text exceeds {MAX_MESSAGE_LEN} characters")]
    MessageTooLong,
    #[error("sender and recipient must differ")]
    SelfMessage,
}
