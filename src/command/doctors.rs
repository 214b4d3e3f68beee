// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Subcommand;
use serde_json::Value;

use egov_portal::{
    api::doctors::{CreateDoctor, DeleteDoctor, ListDoctors},
    Error, Executor, Portal, Result,
};

/// Maintain the registry of personal doctors (administrators only).
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    List,
    /// Add a doctor described by a JSON object.
    Create { doctor: String },
    Delete { id: String },
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, portal: &Portal) -> Result<()> {
        let response = match self {
            Self::List => ListDoctors.execute(portal).await?,
            Self::Create { doctor } => {
                let body: Value = serde_json::from_str(&doctor)
                    .map_err(|e| Error::Validation(format!("the doctor is not valid JSON: {e}")))?;
                CreateDoctor { body }.execute(portal).await?
            }
            Self::Delete { id } => DeleteDoctor { id }.execute(portal).await?,
        };
        super::print_json(&response)
    }
}
