use std::sync::LazyLock;

use regex::Regex;

use crate::{JsonObject, JsonValue, MatrixError};

/// Checks that every name in `required` is present in `fields`.
///
/// Stops at the first missing field. A `user_id` field must not carry an all
/// numeric local part, those are reserved for guest users.
pub fn validate_request(fields: &JsonObject, required: &[&str]) -> Result<(), MatrixError> {
    if fields.is_empty() {
        return Err(MatrixError::unknown(format!(
            "'{}' not in content",
            required.join(", ")
        )));
    }

    for name in required {
        let Some(value) = fields.get(*name) else {
            return Err(MatrixError::unknown(format!("'{name}' not in content")));
        };

        if *name == "user_id" {
            check_user_id(value)?;
        }
    }
    Ok(())
}

/// Rejects user ids whose local part is made of digits only.
pub fn check_user_id(value: &JsonValue) -> Result<(), MatrixError> {
    let Some(localpart) = value.as_str().and_then(localpart) else {
        return Ok(());
    };
    if is_numeric(localpart) {
        return Err(MatrixError::invalid_username(
            "Numeric user IDs are reserved for guest users.",
        ));
    }
    Ok(())
}

/// The part strictly between the first `@` and the first `:` after it.
pub fn localpart(user_id: &str) -> Option<&str> {
    let start = user_id.find('@')? + 1;
    let end = user_id[start..].find(':')? + start;
    Some(&user_id[start..end])
}

/// Decimal number text: optional surrounding whitespace and sign, an integer
/// or fractional mantissa and an optional exponent.
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\n\r\v\f]*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?[ \t\n\r\v\f]*$")
        .expect("numeric pattern is valid")
});

fn is_numeric(s: &str) -> bool {
    NUMERIC.is_match(s)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn object(value: JsonValue) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn empty_content_lists_every_required_field() {
        let err = validate_request(&JsonObject::new(), &["a", "b"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, "'a, b' not in content");
    }

    #[test]
    fn stops_at_first_missing_field() {
        let err = validate_request(&object(json!({"a": 1})), &["a", "b", "c"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, "'b' not in content");
    }

    #[test]
    fn numeric_user_id_is_reserved() {
        let err = validate_request(
            &object(json!({"user_id": "@12345:example.org"})),
            &["user_id"],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUsername);
        assert_eq!(err.message, "Numeric user IDs are reserved for guest users.");
    }

    #[test]
    fn number_shaped_localparts_are_reserved() {
        for user_id in [
            "@-42:example.org",
            "@+7:example.org",
            "@1.5:example.org",
            "@.5:example.org",
            "@1e3:example.org",
            "@2E-4:example.org",
            "@ 12:example.org",
            "@12 :example.org",
        ] {
            let err = check_user_id(&json!(user_id)).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidUsername, "{user_id}");
        }
    }

    #[test]
    fn almost_numbers_are_regular_names() {
        for user_id in [
            "@1e:example.org",
            "@.:example.org",
            "@0x1A:example.org",
            "@1_000:example.org",
            "@--1:example.org",
            "@:example.org",
        ] {
            assert!(check_user_id(&json!(user_id)).is_ok(), "{user_id}");
        }
    }

    #[test]
    fn regular_user_id_passes() {
        assert!(
            validate_request(
                &object(json!({"user_id": "@alice:example.org"})),
                &["user_id"]
            )
            .is_ok()
        );
        assert!(
            validate_request(&object(json!({"user_id": "@4lice:example.org"})), &["user_id"])
                .is_ok()
        );
    }

    #[test]
    fn user_id_is_only_checked_when_required() {
        assert!(
            validate_request(
                &object(json!({"user_id": "@123:example.org", "name": "x"})),
                &["name"]
            )
            .is_ok()
        );
    }

    #[test]
    fn extracts_localpart() {
        assert_eq!(localpart("@alice:example.org"), Some("alice"));
        assert_eq!(localpart("x@bob:host:8448"), Some("bob"));
        assert_eq!(localpart("alice:example.org"), None);
        assert_eq!(localpart("@alice"), None);
    }
}
