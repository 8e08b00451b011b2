use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum EqtlMapError {
    /// A payload or model field violates the data contract, e.g. a cell
    /// referencing an unknown tissue or variant key.
    DataIntegrity(String),
    /// The query returned zero eQTL records. Expected and recoverable,
    /// unlike a malformed payload.
    EmptyResult(String),
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl Error for EqtlMapError {}

impl fmt::Display for EqtlMapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EqtlMapError::DataIntegrity(msg) => write!(f, "Data integrity error: {msg}"),
            EqtlMapError::EmptyResult(msg) => write!(f, "Empty result: {msg}"),
            EqtlMapError::Io(err) => write!(f, "{err}"),
            EqtlMapError::Serde(err) => write!(f, "{err}"),
        }
    }
}

impl From<String> for EqtlMapError {
    fn from(err: String) -> Self {
        EqtlMapError::DataIntegrity(err)
    }
}

impl From<std::io::Error> for EqtlMapError {
    fn from(err: std::io::Error) -> Self {
        EqtlMapError::Io(err)
    }
}

impl From<serde_json::Error> for EqtlMapError {
    fn from(err: serde_json::Error) -> Self {
        EqtlMapError::Serde(err)
    }
}
