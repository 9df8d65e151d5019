#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid range encoding: {0:?}")]
    InvalidRange(String),
    #[error("Invalid function reference encoding: {0:?}")]
    InvalidFuncRef(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
