use std::fmt;

use http::StatusCode;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Machine readable error codes understood by Matrix clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `M_UNKNOWN`
    Unknown,
    /// `M_INVALID_USERNAME`
    InvalidUsername,
    /// `M_MISSING_TOKEN`
    MissingToken,
    /// `M_UNKNOWN_TOKEN`
    UnknownToken,
    /// `M_UNRECOGNIZED`
    Unrecognized,
    /// `M_NOT_FOUND`
    NotFound,
    /// `M_BAD_JSON`
    BadJson,
    /// `M_INVALID_PARAM`
    InvalidParam,
    /// `M_USER_IN_USE`
    UserInUse,
}

impl ErrorKind {
    pub fn errcode(&self) -> &'static str {
        match self {
            Self::Unknown => "M_UNKNOWN",
            Self::InvalidUsername => "M_INVALID_USERNAME",
            Self::MissingToken => "M_MISSING_TOKEN",
            Self::UnknownToken => "M_UNKNOWN_TOKEN",
            Self::Unrecognized => "M_UNRECOGNIZED",
            Self::NotFound => "M_NOT_FOUND",
            Self::BadJson => "M_BAD_JSON",
            Self::InvalidParam => "M_INVALID_PARAM",
            Self::UserInUse => "M_USER_IN_USE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.errcode())
    }
}

/// An error that is rendered to the client as `{"errcode": ..., "error": ...}`.
///
/// The status code travels with the error so the HTTP layer does not have to
/// guess it from the kind; the same kind is answered with different statuses
/// depending on where it is raised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct MatrixError {
    pub status_code: StatusCode,
    pub kind: ErrorKind,
    pub message: String,
}

impl MatrixError {
    pub fn new(status_code: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status_code,
            kind,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorKind::Unknown, message)
    }
    pub fn invalid_username(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::InvalidUsername, message)
    }
    pub fn missing_token(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorKind::MissingToken, message)
    }
    pub fn unknown_token(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorKind::UnknownToken, message)
    }
    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::Unrecognized, message)
    }
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::NotFound, message)
    }
    pub fn bad_json(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::BadJson, message)
    }
    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::InvalidParam, message)
    }
    pub fn user_in_use(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::UserInUse, message)
    }

    pub fn errcode(&self) -> &'static str {
        self.kind.errcode()
    }
}

impl Serialize for MatrixError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = serializer.serialize_struct("MatrixError", 2)?;
        st.serialize_field("errcode", self.kind.errcode())?;
        st.serialize_field("error", &self.message)?;
        st.end()
    }
}
