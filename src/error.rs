use std::{error, fmt, result};

/// Error variants that can be returned by this package's api.
///
/// Each variant carries a prefix, typically identifying the
/// error location.
pub enum Error {
    Fatal(String, String),
    FailConvert(String, String),
    DecodeFail(String, String),
    InvalidInput(String, String),
    Unsupported(String, String),
    Canceled(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, msg) => write!(f, "{} Fatal: {}", p, msg),
            FailConvert(p, msg) => write!(f, "{} FailConvert: {}", p, msg),
            DecodeFail(p, msg) => write!(f, "{} DecodeFail: {}", p, msg),
            InvalidInput(p, msg) => write!(f, "{} InvalidInput: {}", p, msg),
            Unsupported(p, msg) => write!(f, "{} Unsupported: {}", p, msg),
            Canceled(p, msg) => write!(f, "{} Canceled: {}", p, msg),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}
