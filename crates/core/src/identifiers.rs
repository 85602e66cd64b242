use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::validation::{localpart, validate_request};
use crate::{JsonObject, MatrixError};

/// The `type` discriminator of a login identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierType {
    UserId,
    ThirdParty,
    Phone,
}

impl IdentifierType {
    pub fn parse(ty: &str) -> Option<Self> {
        match ty {
            "m.id.user" => Some(Self::UserId),
            "m.id.thirdparty" => Some(Self::ThirdParty),
            "m.id.phone" => Some(Self::Phone),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserId => "m.id.user",
            Self::ThirdParty => "m.id.thirdparty",
            Self::Phone => "m.id.phone",
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::UserId => &["user"],
            Self::ThirdParty => &["medium", "address"],
            Self::Phone => &["country", "phone"],
        }
    }
}

/// Identifies the user a login request is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoginIdentifier {
    #[serde(rename = "m.id.user")]
    User { user: String },
    #[serde(rename = "m.id.thirdparty")]
    ThirdParty { medium: String, address: String },
    #[serde(rename = "m.id.phone")]
    Phone { country: String, phone: String },
}

impl LoginIdentifier {
    /// Builds an identifier from the `identifier` object of a login body.
    pub fn from_json(identifier: &JsonObject) -> Result<Self, MatrixError> {
        let ty = identifier
            .get("type")
            .and_then(|ty| ty.as_str())
            .and_then(IdentifierType::parse)
            .ok_or_else(|| {
                MatrixError::unknown("Bad login type.").with_status(StatusCode::BAD_REQUEST)
            })?;

        validate_request(identifier, ty.required_fields())?;

        let field = |name: &str| -> Result<String, MatrixError> {
            identifier
                .get(name)
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned)
                .ok_or_else(|| MatrixError::bad_json(format!("'{name}' must be a string")))
        };
        Ok(match ty {
            IdentifierType::UserId => Self::User {
                user: field("user")?,
            },
            IdentifierType::ThirdParty => Self::ThirdParty {
                medium: field("medium")?,
                address: field("address")?,
            },
            IdentifierType::Phone => Self::Phone {
                country: field("country")?,
                phone: field("phone")?,
            },
        })
    }

    pub fn identifier_type(&self) -> IdentifierType {
        match self {
            Self::User { .. } => IdentifierType::UserId,
            Self::ThirdParty { .. } => IdentifierType::ThirdParty,
            Self::Phone { .. } => IdentifierType::Phone,
        }
    }
}

/// A user id of the form `@localpart:server`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn parse(id: impl Into<String>) -> Result<Self, MatrixError> {
        let id = id.into();
        if !id.starts_with('@') || localpart(&id).is_none_or(str::is_empty) {
            return Err(MatrixError::invalid_param(format!("Invalid user id: {id}")));
        }
        Ok(Self(id))
    }

    pub fn localpart(&self) -> &str {
        localpart(&self.0).unwrap_or_default()
    }

    pub fn server_name(&self) -> &str {
        let start = 1 + self.localpart().len() + 1;
        &self.0[start..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = MatrixError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::parse(id)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room id of the form `!opaque:host`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    const OPAQUE_LEN: usize = 18;

    /// Derives a room id from the tenant, the room name and a timestamp in
    /// seconds.
    pub fn generate(server_id: &str, room_name: &str, now_secs: i64, host: &str) -> Self {
        let digest = hex::encode(
            Sha256::digest(format!("{server_id}{room_name}{now_secs}").as_bytes()).as_slice(),
        );
        Self(format!("!{}:{host}", &digest[..Self::OPAQUE_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
