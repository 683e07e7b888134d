use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported operating system: {os}")]
    UnsupportedPlatform { os: String },

    #[error("{var} environment variable not found")]
    MissingEnv { var: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    #[must_use]
    pub fn unsupported_platform(os: impl Into<String>) -> Self {
        Self::UnsupportedPlatform { os: os.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
