use soil_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("xml parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),
}
