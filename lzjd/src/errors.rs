//! Error definitions.
use std::error::Error;
use std::path::{Path, PathBuf};
use std::{fmt, io, result};

/// A specialized Result type for this library.
pub type Result<T, E = LzjdError> = result::Result<T, E>;

/// Errors in this library.
#[derive(Debug)]
pub enum LzjdError {
    /// Contains [`InputError`].
    Input(InputError),
    /// I/O failure on a specific file.
    Io {
        /// Path of the file being read or written.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Contains [`DecodeError`].
    Decode(DecodeError),
    /// Failure while writing results.
    Output(io::Error),
    /// The worker pool could not be built.
    ThreadPool(String),
}

impl fmt::Display for LzjdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Input(e) => e.fmt(f),
            Self::Io { path, source } => write!(f, "IoError: {}: {source}", path.display()),
            Self::Decode(e) => e.fmt(f),
            Self::Output(e) => write!(f, "OutputError: {e}"),
            Self::ThreadPool(msg) => write!(f, "ThreadPoolError: {msg}"),
        }
    }
}

impl Error for LzjdError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } | Self::Output(source) => Some(source),
            _ => None,
        }
    }
}

impl LzjdError {
    pub(crate) fn input<S: Into<String>>(msg: S) -> Self {
        Self::Input(InputError { msg: msg.into() })
    }

    pub(crate) fn io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn decode<S: Into<String>>(line: usize, msg: S) -> Self {
        Self::Decode(DecodeError {
            line,
            msg: msg.into(),
        })
    }
}

/// Error used when the input argument is invalid.
#[derive(Debug)]
pub struct InputError {
    msg: String,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InputError: {}", self.msg)
    }
}

/// Error used when a digest line cannot be parsed.
#[derive(Debug)]
pub struct DecodeError {
    line: usize,
    msg: String,
}

impl DecodeError {
    /// Gets the 1-based line number of the rejected line (0 if unknown).
    pub const fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DecodeError: line {}: {}", self.line, self.msg)
    }
}
