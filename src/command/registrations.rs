// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Subcommand;
use futures_util::future::try_join;
use serde_json::{json, Value};

use egov_portal::{
    api::registrations::{
        ApproveRegistration, IdCardImage, ListRegistrations, RejectRegistration, Side, Status,
    },
    Executor, Portal, Result,
};

/// Review citizen registrations (administrators only).
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List registrations in a given state.
    List {
        #[arg(long, value_enum, default_value_t = Status::Pending)]
        status: Status,
    },
    /// Count pending and active registrations.
    Summary,
    /// Approve a pending registration.
    Approve { user_id: String },
    /// Reject (and delete) a pending registration.
    Reject { user_id: String },
    /// Download one side of the identity card submitted with a registration.
    IdCard {
        user_id: String,
        #[arg(value_enum)]
        side: Side,
        /// Where to write the image.
        #[arg(long, short, value_hint = clap::ValueHint::FilePath)]
        output: PathBuf,
    },
}

fn count(list: &Value) -> usize {
    list.as_array().map_or(0, Vec::len)
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, portal: &Portal) -> Result<()> {
        match self {
            Self::List { status } => {
                super::print_json(&ListRegistrations { status }.execute(portal).await?)
            }
            Self::Summary => {
                let (pending, active) = try_join(
                    ListRegistrations {
                        status: Status::Pending,
                    }
                    .execute(portal),
                    ListRegistrations {
                        status: Status::Active,
                    }
                    .execute(portal),
                )
                .await?;
                super::print_json(&json!({
                    "pending": count(&pending),
                    "active": count(&active),
                }))
            }
            Self::Approve { user_id } => {
                super::print_json(&ApproveRegistration { user_id }.execute(portal).await?)
            }
            Self::Reject { user_id } => {
                super::print_json(&RejectRegistration { user_id }.execute(portal).await?)
            }
            Self::IdCard {
                user_id,
                side,
                output,
            } => {
                let bytes = IdCardImage { user_id, side }.execute(portal).await?;
                super::write_file(&output, &bytes)
            }
        }
    }
}
