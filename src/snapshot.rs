// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Display copies of the last login response. Nothing reads these to decide
//! who is logged in.

use std::sync::Arc;

use log::warn;
use serde_json::{Map, Value};

use crate::{
    session::Role,
    storage::{self, IsPersistent, Storage},
};

pub const CITIZEN_SNAPSHOT: &str = "current_user.json";
pub const ADMINISTRATOR_SNAPSHOT: &str = "current_admin.json";

#[derive(Clone)]
pub struct Snapshots {
    citizen: Arc<dyn Storage<Value>>,
    administrator: Arc<dyn Storage<Value>>,
}

impl Snapshots {
    pub fn new<C, A>(citizen: C, administrator: A) -> Self
    where
        C: Storage<Value> + 'static,
        A: Storage<Value> + 'static,
    {
        Self {
            citizen: Arc::new(citizen),
            administrator: Arc::new(administrator),
        }
    }

    /// Snapshots that survive the process, kept in the project data
    /// directory.
    pub fn on_disk() -> Option<Self> {
        Some(Self::new(
            storage::File::new(CITIZEN_SNAPSHOT)?,
            storage::File::new(ADMINISTRATOR_SNAPSHOT)?,
        ))
    }

    pub fn in_memory() -> Self {
        Self::new(storage::Memory::new(), storage::Memory::new())
    }

    /// Whether the snapshots outlive this process.
    pub fn is_persistent(&self) -> bool {
        self.citizen.is_persistent() && self.administrator.is_persistent()
    }

    fn slot(&self, role: Role) -> &dyn Storage<Value> {
        match role {
            Role::Citizen => self.citizen.as_ref(),
            Role::Administrator => self.administrator.as_ref(),
        }
    }

    /// Stores `response` decorated with who logged in. Failures are logged
    /// and otherwise ignored.
    pub async fn record(&self, role: Role, identifier: &str, response: &Value) {
        let mut snapshot = match *response {
            Value::Object(ref fields) => fields.clone(),
            _ => Map::new(),
        };
        let identifier_field = match role {
            Role::Citizen => "egn",
            Role::Administrator => "username",
        };
        let _ = snapshot.insert(identifier_field.to_owned(), identifier.into());
        let _ = snapshot.insert("role".to_owned(), role.as_str().into());

        if let Err(e) = self.slot(role).update(&Value::Object(snapshot)).await {
            warn!("Could not save the {} profile snapshot: {}", role, e);
        }
    }

    pub async fn get(&self, role: Role) -> Option<Value> {
        match self.slot(role).get().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Ignoring an unreadable {} profile snapshot: {}", role, e);
                None
            }
        }
    }

    pub async fn clear(&self) {
        for role in [Role::Citizen, Role::Administrator] {
            if let Err(e) = self.slot(role).clear().await {
                warn!("Could not remove the {} profile snapshot: {}", role, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn snapshots_are_tagged_with_the_principal() {
        let snapshots = Snapshots::in_memory();
        snapshots
            .record(Role::Citizen, "1234567890", &json!({"fullName": "Ivan Petrov"}))
            .await;
        snapshots
            .record(Role::Administrator, "root", &Value::Null)
            .await;

        assert_eq!(
            snapshots.get(Role::Citizen).await,
            Some(json!({"fullName": "Ivan Petrov", "egn": "1234567890", "role": "citizen"}))
        );
        assert_eq!(
            snapshots.get(Role::Administrator).await,
            Some(json!({"username": "root", "role": "administrator"}))
        );

        assert!(!snapshots.is_persistent());
        snapshots.clear().await;
        assert_eq!(snapshots.get(Role::Citizen).await, None);
        assert_eq!(snapshots.get(Role::Administrator).await, None);
    }

    #[test]
    fn file_snapshots_are_persistent() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = Snapshots::new(
            storage::File::at(dir.path().join(CITIZEN_SNAPSHOT)),
            storage::File::at(dir.path().join(ADMINISTRATOR_SNAPSHOT)),
        );
        assert!(snapshots.is_persistent());
    }
}
