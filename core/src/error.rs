use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid engine: {0}")]
    InvalidEngine(String),

    #[error("unknown stemmer: {0}")]
    UnknownStemmer(String),

    #[error("unknown tokenizer: {0}")]
    UnknownTokenizer(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("invalid value {value:?} for info key {key}")]
    InvalidInfo { key: String, value: String },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}
