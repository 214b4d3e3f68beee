// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, str::FromStr, sync::Arc};

use clap::ValueEnum;
use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    storage::{self, Storage},
};

/// The kinds of principal the portal knows about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Administrator,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#"unknown role "{}""#, self.0.escape_default())
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Self::Citizen),
            "administrator" => Ok(Self::Administrator),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

/// The stored form of a session. Kept stringly typed so that a damaged or
/// foreign record can still be read and then rejected.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Data {
    pub role: String,
    pub credential: String,
}

/// A validated, active session.
#[derive(Clone, Debug)]
pub struct Record {
    role: Role,
    credential: SecretString,
}

impl Record {
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The opaque token derived from the identifier and secret at login.
    pub const fn credential(&self) -> &SecretString {
        &self.credential
    }

    fn authorization(&self) -> SecretString {
        SecretString::new(format!("Basic {}", self.credential.expose_secret()))
    }
}

impl TryFrom<Data> for Record {
    type Error = UnknownRole;

    fn try_from(value: Data) -> Result<Self, Self::Error> {
        Ok(Self {
            role: value.role.parse()?,
            credential: SecretString::new(value.credential),
        })
    }
}

fn credential_token(identifier: &str, secret: &SecretString) -> String {
    base64::encode(format!("{}:{}", identifier, secret.expose_secret()))
}

/// Holds the one active principal of this client, if any.
///
/// Every write replaces the whole record, so concurrent readers observe
/// either the old session or the new one, never a mix.
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn Storage<Data>>,
}

impl Session {
    pub fn new<S: Storage<Data> + 'static>(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// A session that is forgotten when the process exits.
    pub fn ephemeral() -> Self {
        Self::new(storage::Memory::new())
    }

    pub async fn set_session(
        &self,
        role: Role,
        identifier: &str,
        secret: &SecretString,
    ) -> Result<Record> {
        if identifier.is_empty() {
            return Err(Error::validation("an identifier is required"));
        }
        if secret.expose_secret().is_empty() {
            return Err(Error::validation("a password is required"));
        }

        let data = Data {
            role: role.as_str().to_owned(),
            credential: credential_token(identifier, secret),
        };
        self.storage.update(&data).await?;
        debug!("Started a {} session", role);

        Ok(Record {
            role,
            credential: SecretString::new(data.credential),
        })
    }

    pub async fn clear_session(&self) -> Result<()> {
        self.storage.clear().await?;
        debug!("Cleared the session");
        Ok(())
    }

    async fn record(&self) -> Option<Record> {
        let data = match self.storage.get().await {
            Ok(data) => data?,
            Err(e) => {
                warn!("Treating unreadable session storage as logged out: {}", e);
                return None;
            }
        };
        if data.role.is_empty() || data.credential.is_empty() {
            warn!("Treating an incomplete session record as logged out");
            return None;
        }

        match Record::try_from(data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Treating a session record with an {} as logged out", e);
                None
            }
        }
    }

    pub async fn current_role(&self) -> Option<Role> {
        self.record().await.map(|record| record.role())
    }

    pub async fn has_active_session(&self) -> bool {
        self.record().await.is_some()
    }

    /// The value to send in the `Authorization` header, or `None` when
    /// nobody is logged in.
    pub async fn authorization_header_value(&self) -> Option<SecretString> {
        self.record().await.map(|record| record.authorization())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::ephemeral()
    }
}
