//! Result and Error types for the crate.
use miette::Diagnostic;
use thiserror::Error;

/// Result containing an error variant from this module.
pub type Result<T> = std::result::Result<T, Error>;

/// Which of the two files of a configuration an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Main,
    Overlay,
}

impl std::fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigKind::Main => f.write_str("main"),
            ConfigKind::Overlay => f.write_str("overlay"),
        }
    }
}

/// Configuration error, tagged with the [`Config::PATH`](crate::Config::PATH) of the config
/// that caused it.
#[derive(Error, Diagnostic, Debug)]
#[error("config `{name}`: {kind}")]
pub struct Error {
    pub name: &'static str,
    #[source]
    pub kind: ErrorKind,
}

/// Configuration error variants
#[derive(Error, Debug)]
pub enum ErrorKind {
    /// The file could not be read.
    #[error("failed to read {config_kind} config from `{path}`")]
    Load {
        path: String,
        config_kind: ConfigKind,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML.
    #[error("failed to parse {config_kind} config `{path}`")]
    Parse {
        path: String,
        config_kind: ConfigKind,
        #[source]
        source: toml::de::Error,
    },

    /// The merged table does not match the config struct.
    #[error("merged config does not match its type")]
    Deserialize(#[source] toml::de::Error),

    /// The config could not be turned into TOML.
    #[error("failed to serialize config")]
    Serialize(#[source] toml::ser::Error),

    /// The file could not be written.
    #[error("failed to store config at `{path}`")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
