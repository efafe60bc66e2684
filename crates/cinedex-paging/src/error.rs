//! Failure taxonomy shared by page sources and mediators.

use thiserror::Error;

/// Boxed error source carried by the taxonomy variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// No connectivity or timeout.
    Network,
    /// Unexpected HTTP status or malformed envelope.
    Protocol,
    /// Payload did not match the expected shape.
    Decode,
}

/// A failed network fetch.
///
/// All variants are retryable by user action. Cancellation is not modelled
/// here: a dropped fetch future never turns into a `FetchError`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connectivity failure or timeout.
    #[error("network error: {context}")]
    Network {
        /// What was being attempted.
        context: String,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
    /// Non-success status or unusable response envelope.
    #[error("protocol error (HTTP {status}): {message}")]
    Protocol {
        /// HTTP status code.
        status: u16,
        /// Message reported by the server, or the raw body.
        message: String,
    },
    /// The request could not be built locally, so nothing was sent.
    #[error("invalid request: {context}")]
    InvalidRequest {
        /// What was being built.
        context: String,
        /// Underlying URL or request builder error.
        #[source]
        source: BoxError,
    },
    /// Response body did not match the expected shape.
    #[error("decode error: {context}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// Underlying deserialization error.
        #[source]
        source: BoxError,
    },
}

impl FetchError {
    /// Builds a [`FetchError::Network`].
    pub fn network(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Network {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Builds a [`FetchError::Protocol`].
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }

    /// Builds a [`FetchError::InvalidRequest`].
    pub fn invalid_request(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::InvalidRequest {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Builds a [`FetchError::Decode`].
    pub fn decode(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network { .. } => FetchErrorKind::Network,
            Self::Protocol { .. } | Self::InvalidRequest { .. } => FetchErrorKind::Protocol,
            Self::Decode { .. } => FetchErrorKind::Decode,
        }
    }

    /// Returns `true` for payload shape mismatches.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// A failed local cache operation.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store rejected an operation. Any open transaction was rolled back.
    #[error("cache storage error: {context}")]
    Storage {
        /// What was being attempted.
        context: String,
        /// Underlying store error.
        #[source]
        source: BoxError,
    },
    /// A thread panicked while holding the cache lock.
    #[error("cache lock poisoned")]
    Poisoned,
}

impl CacheError {
    /// Builds a [`CacheError::Storage`].
    pub fn storage(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Failure returned by a mediator load.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum MediatorError {
    /// The network fetch failed; the cache was not touched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The cache transaction failed and was rolled back.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl MediatorError {
    /// Classification of the fetch failure, if this is one.
    #[must_use]
    pub const fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Fetch(err) => Some(err.kind()),
            Self::Cache(_) => None,
        }
    }

    /// Returns `true` for a decode failure, the only kind sent to diagnostics.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_decode())
    }
}
