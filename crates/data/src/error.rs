#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("public: `{0}`")]
    Public(String),
    #[error("database pool is not initialized")]
    NotInitialized,
    #[error("diesel: `{0}`")]
    Diesel(#[from] diesel::result::Error),
    #[error("pool: `{0}`")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("migration: `{0}`")]
    Migration(String),
}

impl DataError {
    pub fn public<S: Into<String>>(msg: S) -> Self {
        Self::Public(msg.into())
    }
}
