pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("upstream returned HTTP {0}")]
    Http(reqwest::StatusCode),
    #[error("error sending consumption request")]
    Request(#[from] reqwest::Error),
    #[error("unexpected consumption data: {0}")]
    Data(String),
    #[error("invalid meter configuration: {0}")]
    Config(String),
}
