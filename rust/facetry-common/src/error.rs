use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if the error was raised by document or label validation.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation { .. })
    }

    /// Returns `true` if the error reports a missing or unusable collaborator.
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration { .. })
    }

    pub fn validation(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Validation {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn configuration(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Configuration {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// Wraps a failure raised inside a taxonomy implementation.
    pub fn taxonomy<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Taxonomy {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("taxonomy error: {context}")]
    Taxonomy {
        context: String,
        source: StdErrorBoxed,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
