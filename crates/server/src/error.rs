use salvo::http::StatusCode;
use salvo::prelude::*;
use salvo::writing::Scribe;

use crate::MatrixError;
use crate::core::credential::CredentialError;
use crate::data::DataError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Matrix(#[from] MatrixError),
    #[error("credential: `{0}`")]
    Credential(#[from] CredentialError),
    #[error("data: `{0}`")]
    Data(#[from] DataError),
    #[error("json: `{0}`")]
    Json(#[from] serde_json::Error),
    #[error("internal: `{0}`")]
    Internal(String),
}

impl AppError {
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// The error as it is shown to the client.
    ///
    /// Storage, credential and other internal failures are logged in full and
    /// reported with a generic message.
    pub fn to_matrix(&self) -> MatrixError {
        match self {
            Self::Matrix(e) => e.clone(),
            Self::Json(e) => MatrixError::bad_json(e.to_string()),
            Self::Credential(_) | Self::Data(_) | Self::Internal(_) => {
                MatrixError::unknown("Internal server error")
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl Scribe for AppError {
    fn render(self, res: &mut Response) {
        let matrix = self.to_matrix();
        if matrix.status_code.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        res.status_code(matrix.status_code);
        res.render(Json(matrix));
    }
}
