//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("Invalid manifest {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Package not found: {name}. Available packages: {available}")]
    PackageNotFound { name: String, available: String },

    #[error("Package {0} is declared more than once")]
    DuplicatePackage(String),

    #[error("Package {0} depends on itself")]
    SelfDependency(String),

    #[error("Circular dependency detected: {}. Use 'meshpack graph' to inspect dependencies.", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Path {0} does not exist")]
    PathNotFound(PathBuf),

    #[error("Invalid package pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("No packages match the given filters (include: [{include}], exclude: [{exclude}])")]
    NoMatchingPackages { include: String, exclude: String },

    #[error("Failed to link {package} at {}: {source}", .path.display())]
    Link {
        package: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task execution failed for {package}: {message}")]
    TaskExecution { package: String, message: String },
}

/// Coarse classification used when reporting fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Graph,
    Selection,
    Link,
    Task,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PackageNotFound { .. }
            | Error::DuplicatePackage(_)
            | Error::SelfDependency(_)
            | Error::CircularDependency { .. } => ErrorKind::Graph,
            Error::PathNotFound(_)
            | Error::InvalidPattern { .. }
            | Error::NoMatchingPackages { .. } => ErrorKind::Selection,
            Error::Link { .. } => ErrorKind::Link,
            Error::TaskExecution { .. } => ErrorKind::Task,
            Error::Io(_) | Error::Toml { .. } | Error::Manifest { .. } => ErrorKind::Config,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Toml {
            error,
            context: "meshpack.toml".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
