use salvo::http::header::AUTHORIZATION;
use salvo::prelude::*;

use crate::routing::server_id;
use crate::{AppResult, MatrixError, state};

/// Lets the request through only when it carries an access token issued by
/// the tenant named in the path.
#[handler]
pub async fn auth_by_access_token(req: &mut Request) -> AppResult<()> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if header.is_empty() {
        return Err(MatrixError::missing_token("Missing access token").into());
    }
    let token = bearer_token(header);
    let server_id = server_id(req)?;
    if !state()?.store.is_valid_access_token(&server_id, token)? {
        tracing::debug!(%server_id, path = req.uri().path(), "rejected unknown access token");
        return Err(MatrixError::unknown_token("Invalid access token passed.").into());
    }
    Ok(())
}

/// The credential after the `Bearer ` scheme.
fn bearer_token(header: &str) -> &str {
    header.get("Bearer ".len()..).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_prefix_is_dropped() {
        assert_eq!(bearer_token("Bearer abc-123"), "abc-123");
        assert_eq!(bearer_token("Bearer "), "");
        assert_eq!(bearer_token("short"), "");
    }
}
