use std::fmt::Display;

/// Index errors.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Invalid data, typically a malformed or truncated save stream:
    /// wrong magic, unknown compression code, or an intern index out of range.
    InvalidData(String),
    /// Invalid user input, typically a bad argument such as an empty path.
    InvalidInput(String),
    /// A user-supplied key codec failed to parse an interned key string.
    KeyCodec(String),
    /// An IO error on the underlying stream.
    IO(String),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::KeyCodec(msg) => write!(f, "key codec: {msg}"),
            Error::IO(msg) => write!(f, "io error: {msg}"),
        }
    }
}

/// Constructs an Error::InvalidData for the given format string.
#[macro_export]
macro_rules! errdata {
    ($($args:tt)*) => { $crate::error::Error::InvalidData(format!($($args)*)).into() };
}

/// Constructs an Error::InvalidInput for the given format string.
#[macro_export]
macro_rules! errinput {
    ($($args:tt)*) => { $crate::error::Error::InvalidInput(format!($($args)*)).into() };
}

/// A radixfts Result returning Error.
pub type Result<T> = std::result::Result<T, Error>;

impl<T> From<Error> for Result<T> {
    fn from(error: Error) -> Self {
        Err(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
