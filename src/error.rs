// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{convert::Infallible, fmt, io, result};

use serde_json::Value;
use thiserror::Error;

use crate::session::Role;

pub type Result<T, E = Error> = result::Result<T, E>;

/// The message carried by every error raised when no response reached us.
pub const UNREACHABLE_MESSAGE: &str = "cannot reach the backend; check that the server is running";

/// The category an [`Error`] belongs to. Callers branch on this rather than
/// on the error's message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    TransportUnreachable,
    Http(u16),
    NotAuthenticated,
    ForbiddenRole,
    Validation,
    /// A failure on the client side that never involved the backend, such as
    /// a session write to a persistent backend or a local file operation.
    Local,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TransportUnreachable => f.write_str("TRANSPORT_UNREACHABLE"),
            Self::Http(status) => write!(f, "HTTP_{status}"),
            Self::NotAuthenticated => f.write_str("NOT_AUTHENTICATED"),
            Self::ForbiddenRole => f.write_str("FORBIDDEN_ROLE"),
            Self::Validation => f.write_str("VALIDATION"),
            Self::Local => f.write_str("LOCAL"),
        }
    }
}

/// A classified failure. The `Display` form of every variant is suitable for
/// showing directly to the person using the portal.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", UNREACHABLE_MESSAGE)]
    TransportUnreachable(#[source] Transport),
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        payload: Option<Value>,
    },
    #[error("no active session; please log in again")]
    NotAuthenticated,
    #[error("access denied ({required} role required)")]
    ForbiddenRole { required: Role },
    #[error("{0}")]
    Validation(String),
    #[error("session storage error: {0}")]
    Storage(#[from] Storage),
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Setup(#[source] Transport),
}

impl Error {
    pub(crate) fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation(message.into())
    }

    pub const fn kind(&self) -> Kind {
        match *self {
            Self::TransportUnreachable(_) => Kind::TransportUnreachable,
            Self::Http { status, .. } => Kind::Http(status),
            Self::NotAuthenticated => Kind::NotAuthenticated,
            Self::ForbiddenRole { .. } => Kind::ForbiddenRole,
            Self::Validation(_) => Kind::Validation,
            Self::Storage(_) | Self::Io(_) | Self::Setup(_) => Kind::Local,
        }
    }

    /// The HTTP status the backend answered with. Only errors that came back
    /// from the backend carry one.
    pub const fn status_code(&self) -> Option<u16> {
        match *self {
            Self::Http { status, .. } => Some(status),
            Self::TransportUnreachable(_)
            | Self::NotAuthenticated
            | Self::ForbiddenRole { .. }
            | Self::Validation(_)
            | Self::Storage(_)
            | Self::Io(_)
            | Self::Setup(_) => None,
        }
    }

    /// The decoded error body, if the backend sent one we could decode.
    pub fn payload(&self) -> Option<&Value> {
        match *self {
            Self::Http {
                payload: Some(ref payload),
                ..
            } => Some(payload),
            Self::Http { payload: None, .. }
            | Self::TransportUnreachable(_)
            | Self::NotAuthenticated
            | Self::ForbiddenRole { .. }
            | Self::Validation(_)
            | Self::Storage(_)
            | Self::Io(_)
            | Self::Setup(_) => None,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<Infallible> for Error {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

#[derive(Error, Debug)]
pub enum Transport {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("connection closed before a response arrived")]
    Disconnected,
    /// The request could not be encoded, so nothing was sent.
    #[error("the request cannot be encoded: {0}")]
    Malformed(#[source] reqwest::Error),
    #[error("the HTTP client cannot be built: {0}")]
    Client(#[source] reqwest::Error),
}

impl From<Transport> for Error {
    fn from(value: Transport) -> Self {
        match value {
            Transport::Malformed(_) => Self::Validation(value.to_string()),
            Transport::Client(_) => Self::Setup(value),
            Transport::Http(_) | Transport::Disconnected => Self::TransportUnreachable(value),
        }
    }
}

#[derive(Error, Debug)]
pub enum Storage {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(#[from] serde_json::Error),
}
