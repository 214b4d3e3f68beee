// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! One request type per backend operation. Each converts into a
//! [`Request`] without side effects and is run with [`Executor::execute`].

pub mod auth;
pub mod doctors;
pub mod property;
pub mod registrations;
pub mod user;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    guard,
    request::{Client, Payload, Request},
    session::{Role, Session},
    snapshot::Snapshots,
};

/// Who may run an operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// Login and registration, which establish the session in the first
    /// place.
    Public,
    Role(Role),
}

/// Converts a decoded response into what an operation returns.
pub trait FromPayload: Sized {
    fn from_payload(payload: Payload) -> Result<Self>;
}

impl FromPayload for Value {
    fn from_payload(payload: Payload) -> Result<Self> {
        Ok(payload.into_json())
    }
}

impl FromPayload for Vec<u8> {
    fn from_payload(payload: Payload) -> Result<Self> {
        Ok(payload.into_bytes())
    }
}

impl FromPayload for String {
    fn from_payload(payload: Payload) -> Result<Self> {
        Ok(match payload {
            Payload::Text(text) | Payload::Json(Value::String(text)) => text,
            Payload::Json(value) => value.to_string(),
            Payload::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Payload::Null => String::new(),
        })
    }
}

/// Everything a façade call needs: where the backend is and who is asking.
#[derive(Clone)]
pub struct Portal {
    client: Client,
    session: Session,
    snapshots: Snapshots,
}

impl Portal {
    pub fn new(client: Client, session: Session, snapshots: Snapshots) -> Self {
        Self {
            client,
            session,
            snapshots,
        }
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    pub async fn current_role(&self) -> Option<Role> {
        self.session.current_role().await
    }

    pub async fn has_active_session(&self) -> bool {
        self.session.has_active_session().await
    }

    pub async fn navigate(&self, location: &str, allowed: &[Role]) -> guard::Decision {
        guard::navigate(&self.session, location, allowed).await
    }
}

#[async_trait]
pub trait Executor: Send + Sized {
    type Response;
    const ACCESS: Access;

    async fn execute(self, portal: &Portal) -> Result<Self::Response>
    where
        Self: TryInto<Request>,
        Error: From<<Self as TryInto<Request>>::Error>,
        Self::Response: FromPayload,
    {
        let authorization = match Self::ACCESS {
            Access::Public => None,
            Access::Role(role) => {
                guard::require_role(&portal.session, role).await?;
                portal.session.authorization_header_value().await
            }
        };

        let req = self.try_into()?;
        let payload = portal.client.execute(req, authorization.as_ref()).await?;
        <Self::Response as FromPayload>::from_payload(payload)
    }
}

/// Trims and percent-encodes one path segment, rejecting blank values.
pub(crate) fn segment(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("the {what} is missing")));
    }
    Ok(urlencoding::encode(value).into_owned())
}
