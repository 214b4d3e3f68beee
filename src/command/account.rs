// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fs, path::PathBuf};

use async_trait::async_trait;
use clap::Parser;
use serde_json::{json, Value};

use egov_portal::{
    api::{
        auth::{Image, Register as RegisterRequest},
        user::Me,
    },
    guard::Decision,
    Error, Executor, Portal, Result, Role,
};

/// Show who this invocation is logged in as, and the last saved profiles.
#[derive(Debug, Parser)]
pub(crate) struct Whoami {}

#[async_trait]
impl super::Command for Whoami {
    async fn execute(self, portal: &Portal) -> Result<()> {
        let role = portal.current_role().await;
        let mut snapshots = serde_json::Map::new();
        for snapshot_role in [Role::Citizen, Role::Administrator] {
            if let Some(snapshot) = portal.snapshots().get(snapshot_role).await {
                let _ = snapshots.insert(snapshot_role.as_str().to_owned(), snapshot);
            }
        }

        super::print_json(&json!({
            "role": role.map(Role::as_str),
            "snapshots": snapshots,
            "snapshotsPersistent": portal.snapshots().is_persistent(),
        }))
    }
}

/// Show the logged-in citizen's profile.
#[derive(Debug, Parser)]
pub(crate) struct Profile {}

#[async_trait]
impl super::Command for Profile {
    async fn execute(self, portal: &Portal) -> Result<()> {
        super::print_json(&Me.execute(portal).await?)
    }
}

/// Decide whether a screen may be shown to the current principal.
#[derive(Debug, Parser)]
pub(crate) struct Navigate {
    /// The roles the screen admits. Any logged-in role when omitted.
    #[arg(long = "allow", value_enum)]
    allowed: Vec<Role>,

    /// The screen being requested.
    location: String,
}

#[async_trait]
impl super::Command for Navigate {
    async fn execute(self, portal: &Portal) -> Result<()> {
        let decision = portal.navigate(&self.location, &self.allowed).await;
        let action = match decision {
            Decision::Render => "render",
            Decision::RedirectToLogin { .. } => "redirect-to-login",
            Decision::RedirectToLanding(_) => "redirect-to-landing",
        };
        super::print_json(&json!({
            "decision": action,
            "target": decision.target(),
        }))
    }
}

/// Submit a registration for administrator approval.
#[derive(Debug, Parser)]
pub(crate) struct Register {
    /// A JSON file with the applicant's details.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    data: PathBuf,

    /// A photo of the front of the identity card.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    front: PathBuf,

    /// A photo of the back of the identity card.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    back: PathBuf,
}

fn image(path: PathBuf) -> Result<Image> {
    let content_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(Image {
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content_type: content_type.to_owned(),
        bytes: fs::read(&path)?,
    })
}

#[async_trait]
impl super::Command for Register {
    async fn execute(self, portal: &Portal) -> Result<()> {
        let data: Value = serde_json::from_slice(&fs::read(&self.data)?)
            .map_err(|e| Error::Validation(format!("{}: {}", self.data.display(), e)))?;

        let response = RegisterRequest {
            data,
            id_front: image(self.front)?,
            id_back: image(self.back)?,
        }
        .execute(portal)
        .await?;
        super::print_json(&response)
    }
}
