//! Error types for dimfilters

use std::collections::BTreeMap;
use std::fmt;

/// Result type alias for dimfilters operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dimfilters
#[derive(Debug)]
pub enum Error {
    /// No dataset descriptor is registered under this name
    DatasetNotFound(String),
    /// Metadata store failure while resolving a descriptor
    Metadata(String),
    /// Sub-query execution failure reported by the data source
    Query(String),
    /// The gather was cancelled before every dimension was collected.
    ///
    /// `partial` holds the values collected before cancellation.
    Interrupted {
        dataset: String,
        partial: BTreeMap<String, Vec<String>>,
    },
    /// Configuration errors
    Config(String),
    /// IO errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
    /// Internal error
    Internal(String),
}

impl Error {
    /// True when the whole lookup was cut short by cancellation.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted { .. })
    }

    /// Partial result carried by an interrupted lookup.
    pub fn partial_filters(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Error::Interrupted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DatasetNotFound(name) => write!(f, "Dataset not found: {}", name),
            Error::Metadata(msg) => write!(f, "Metadata error: {}", msg),
            Error::Query(msg) => write!(f, "Query error: {}", msg),
            Error::Interrupted { dataset, partial } => write!(
                f,
                "Dimension filter lookup for dataset '{}' interrupted after {} dimension(s)",
                dataset,
                partial.len()
            ),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_is_distinct_from_other_errors() {
        let mut partial = BTreeMap::new();
        partial.insert("country".to_string(), vec!["us".to_string()]);
        let err = Error::Interrupted {
            dataset: "pageviews".to_string(),
            partial,
        };

        assert!(err.is_interrupted());
        assert_eq!(err.partial_filters().map(|p| p.len()), Some(1));
        assert!(format!("{err}").contains("pageviews"));

        let other = Error::DatasetNotFound("pageviews".to_string());
        assert!(!other.is_interrupted());
        assert!(other.partial_filters().is_none());
    }
}
