// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Subcommand;
use serde_json::json;

use egov_portal::{
    api::property::{
        has_sketch, has_tax_assessment, DebtKind, DebtSchedule, Debts, GetProperty,
        ListProperties, OwnershipDoc, PayDebt, SketchPdf, TaxAssessment,
    },
    Executor, Portal, Result,
};

/// Look after the logged-in citizen's properties.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    List,
    Show {
        id: String,
    },
    /// Show which documents have been issued for a property.
    Documents {
        id: String,
    },
    TaxAssessment {
        id: String,
    },
    Debts {
        id: String,
    },
    Pay {
        id: String,
        year: u16,
        #[arg(value_enum)]
        kind: DebtKind,
    },
    /// Download the cadastral sketch as a PDF.
    Sketch {
        id: String,
        #[arg(long, short, value_hint = clap::ValueHint::FilePath)]
        output: PathBuf,
    },
    /// Download the ownership document.
    OwnershipDoc {
        id: String,
        #[arg(long, short, value_hint = clap::ValueHint::FilePath)]
        output: PathBuf,
    },
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, portal: &Portal) -> Result<()> {
        match self {
            Self::List => super::print_json(&ListProperties.execute(portal).await?),
            Self::Show { id } => super::print_json(&GetProperty { id }.execute(portal).await?),
            Self::Documents { id } => super::print_json(&json!({
                "taxAssessment": has_tax_assessment(portal, &id).await?,
                "sketch": has_sketch(portal, &id).await?,
            })),
            Self::TaxAssessment { id } => {
                super::print_json(&TaxAssessment { id }.execute(portal).await?)
            }
            Self::Debts { id } => {
                let DebtSchedule(debts) = Debts { id }.execute(portal).await?;
                super::print_json(&debts)
            }
            Self::Pay { id, year, kind } => {
                let confirmation = PayDebt { id, year, kind }.execute(portal).await?;
                println!("{confirmation}");
                Ok(())
            }
            Self::Sketch { id, output } => {
                super::write_file(&output, &SketchPdf { id }.execute(portal).await?)
            }
            Self::OwnershipDoc { id, output } => {
                super::write_file(&output, &OwnershipDoc { id }.execute(portal).await?)
            }
        }
    }
}
