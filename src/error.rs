use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Table data whose shape cannot be laid out (empty, ragged rows).
    Configuration(String),
    /// A region with zero width or height.
    DegenerateRegion,
    InvalidAnnotation(String),
    MissingResource(String),
    /// Translation or logo collaborator failure. Always recovered by the composer.
    ExternalService(String),
    Image(image::ImageError),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "invalid table configuration: {msg}"),
            Error::DegenerateRegion => write!(f, "region has zero area"),
            Error::InvalidAnnotation(msg) => write!(f, "invalid annotation: {msg}"),
            Error::MissingResource(msg) => write!(f, "missing resource: {msg}"),
            Error::ExternalService(msg) => write!(f, "external service failed: {msg}"),
            Error::Image(e) => write!(f, "image error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Image(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
