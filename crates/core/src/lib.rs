//! Core types shared by the backoffice crates.
//!
//! Nothing in here touches the database or the network: credential
//! generation, request validation, login identifiers and the Matrix style
//! error type that every other crate reports through.

pub mod credential;
pub mod error;
pub mod identifiers;
pub mod method;
pub mod validation;

pub use error::{ErrorKind, MatrixError};
pub use identifiers::{IdentifierType, LoginIdentifier, RoomId, UserId};

pub type JsonValue = serde_json::Value;
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Milliseconds since the unix epoch.
pub fn unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
