use crate::validator::Issue;

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for route compilation, document generation and dispatch
#[derive(Debug)]
pub enum Error {
    /// No route in the map carries the requested route key
    RouteNotFound(String),
    /// The request envelope did not match the route's request schema
    RequestValidation(Vec<Issue>),
    /// The route handler failed; the inner error is passed through untouched
    Handler(anyhow::Error),
    /// A route or schema is malformed; raised at startup, never per request
    Compilation(String),
    SerializationError(String),
    IoError(std::io::Error),
}

impl Error {
    /// HTTP status a wrapping transport layer would typically answer with.
    pub fn status_hint(&self) -> u16 {
        match self {
            Error::RouteNotFound(_) => 404,
            Error::RequestValidation(_) => 400,
            Error::Handler(_)
            | Error::Compilation(_)
            | Error::SerializationError(_)
            | Error::IoError(_) => 500,
        }
    }

    /// Field-level issues carried by a validation failure, empty otherwise.
    pub fn issues(&self) -> &[Issue] {
        match self {
            Error::RequestValidation(issues) => issues,
            _ => &[],
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::RouteNotFound(key) => write!(f, "Route not found: {}", key),
            Error::RequestValidation(issues) => {
                write!(f, "Request validation failed with {} issue(s)", issues.len())?;
                for issue in issues {
                    write!(f, "; {}", issue)?;
                }
                Ok(())
            }
            Error::Handler(e) => write!(f, "Handler error: {}", e),
            Error::Compilation(msg) => write!(f, "Compilation error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::Handler(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}
