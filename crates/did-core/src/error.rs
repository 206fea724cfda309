//! # DID Core Errors
//!
//! This module defines the error types used by the SDK, including for traits that are implemented
//! in other crates (key managers, registry client, wallet).

use std::fmt::Display;

use thiserror::Error;

/// Simplify creation of errors with tracing.
///
/// # Example
/// ```
/// use did_core::error::Err;
/// use did_core::{tracerr, Result};
///
/// fn with_msg() -> Result<()> {
///     tracerr!(Err::InvalidInput, "message: {}", "some message")
/// }
///
/// fn no_msg() -> Result<()> {
///     tracerr!(Err::InvalidInput)
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($code:expr, $($msg:tt)*) => {
        {
        use $crate::error::Context as _;
        tracing::error!($($msg)*);
        return Err($code).context(format!($($msg)*));
        }
    };
    // no context
    ($code:expr) => {
        {
        tracing::error!("{}", $code);
        return Err($code.into());
        }
    }
}

/// Public error type for the SDK.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

impl Error {
    /// Transfer the error to `OAuth2` compatible format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.0.root_cause().to_string(),
            "error_description": self.to_string(),
        })
    }

    /// Returns true if `err` is the code held by this error object.
    #[must_use]
    pub fn is(&self, err: Err) -> bool {
        self.code() == Some(err)
    }

    /// The typed error code, if the error was raised with one.
    #[must_use]
    pub fn code(&self) -> Option<Err> {
        self.0.downcast_ref::<Err>().copied()
    }
}

/// Typed errors for the SDK.
#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum Err {
    /// A caller-supplied value violates a precondition (empty data, malformed identifier, bad hex,
    /// duplicate key ID and the like). See context for details.
    #[error("invalid_input")]
    InvalidInput,

    /// Key material could not be parsed, or does not match the requested algorithm.
    #[error("invalid_key")]
    InvalidKey,

    /// The requested algorithm or key type is not supported.
    #[error("unsupported_algorithm")]
    UnsupportedAlgorithm,

    /// The backend does not support the requested operation (eg. exporting keys from a remote key
    /// service).
    #[error("unsupported_operation")]
    UnsupportedOperation,

    /// A key manager has no key with the requested identifier.
    #[error("key_not_found")]
    KeyNotFound,

    /// A requested wallet entry (user, credential, key or collection) does not exist.
    #[error("not_found")]
    NotFound,

    /// A signature is too short or its components are out of range.
    #[error("invalid_signature_format")]
    InvalidSignatureFormat,

    /// An error occurred trying to serialize or parse a DID document.
    #[error("serialization_error")]
    SerializationError,

    /// An error occurred trying to deserialize data returned by a remote service.
    #[error("deserialization_error")]
    DeserializationError,

    /// Key material could not be encoded (DER, PEM, JWK).
    #[error("encoding_error")]
    EncodingError,

    /// Failure to sign a message.
    #[error("signing_error")]
    SigningError,

    /// Failure to encrypt or decrypt a message.
    #[error("encryption_error")]
    EncryptionError,

    /// A remote call did not complete before the caller-supplied deadline.
    #[error("timeout")]
    Timeout,

    /// A remote service rejected the request.
    #[error("provider_error")]
    ProviderError,

    /// Request failed. This is used when a request to a downstream API fails to connect or get a
    /// response.
    #[error("request_error")]
    RequestError,

    /// Authentication failed.
    #[error("auth_error")]
    AuthError,

    /// Configuration could not be resolved or is invalid.
    #[error("invalid_config")]
    InvalidConfig,

    /// An unspecified error occurred (see context for information)
    #[error("unknown")]
    Unknown,
}

/// Context is used to decorate errors with useful context information.
pub trait Context<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Adds context to the error.
    ///
    /// # Errors
    ///
    /// * Original error with context appended.
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> Context<T, E> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(Error(anyhow::Error::from(e).context(context))),
        }
    }
}

impl From<Err> for Error {
    fn from(error: Err) -> Self {
        Self(error.into())
    }
}

impl From<ecdsa::Error> for Error {
    fn from(err: ecdsa::Error) -> Self {
        Self(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self(err.into())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    use super::*;
    use crate::Result;

    #[test]
    fn base_err() {
        let err: Error = Err::InvalidInput.into();

        assert_eq!(
            err.to_json(),
            json!({"error":"invalid_input","error_description":"invalid_input"})
        );
        assert!(err.is(Err::InvalidInput));
        assert!(!err.is(Err::InvalidKey));
    }

    #[test]
    fn context_err() {
        let res: Result<()> = Err(Err::KeyNotFound).context("no key with id abc");
        let err = res.expect_err("expected error");

        assert_eq!(
            err.to_json(),
            json!({"error":"key_not_found","error_description":"no key with id abc"})
        );
        assert_eq!(err.code(), Some(Err::KeyNotFound));
    }

    #[test]
    fn foreign_err_has_no_code() {
        let err: Error =
            serde_json::from_str::<serde_json::Value>("{").expect_err("bad json").into();
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_macro() {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::ERROR).finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let Err(e) = run_macro() else {
            panic!("expected error");
        };

        assert_eq!(e.to_string(), "test me");
        assert!(e.is(Err::Timeout));
    }

    fn run_macro() -> Result<()> {
        tracerr!(Err::Timeout, "test {}", "me")
    }
}
