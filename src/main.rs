// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod command;
mod password;

use std::process;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::{error, info};
use secrecy::SecretString;
use url::Url;

use egov_portal::{
    request::Client, snapshot::Snapshots, transport::Reqwest, Error, Portal, Result, Role,
    Session,
};
use command::Command as _;
use password::Prompt as _;

#[derive(Debug, Subcommand)]
enum Command {
    Whoami(command::account::Whoami),
    Profile(command::account::Profile),
    Navigate(command::account::Navigate),
    Register(command::account::Register),
    /// End the session and forget the saved profiles.
    Logout,
    #[clap(subcommand)]
    Registrations(command::registrations::Command),
    #[clap(subcommand)]
    Doctors(command::doctors::Command),
    #[clap(subcommand)]
    Property(command::property::Command),
}

impl Command {
    /// Whether the command is meant for someone who has no account yet.
    const fn is_anonymous(&self) -> bool {
        matches!(*self, Self::Register(_))
    }
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, portal: &Portal) -> Result<()> {
        match self {
            Self::Whoami(cmd) => cmd.execute(portal).await,
            Self::Profile(cmd) => cmd.execute(portal).await,
            Self::Navigate(cmd) => cmd.execute(portal).await,
            Self::Register(cmd) => cmd.execute(portal).await,
            Self::Logout => portal.logout().await,
            Self::Registrations(cmd) => cmd.execute(portal).await,
            Self::Doctors(cmd) => cmd.execute(portal).await,
            Self::Property(cmd) => cmd.execute(portal).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The root URL of the portal backend.
    #[arg(long, env = "EGOV_BASE_URL", default_value = "http://localhost:8080", value_parser = Url::parse)]
    base_url: Url,

    /// Who to log in as.
    #[arg(long, value_enum, default_value_t = Role::Citizen)]
    role: Role,

    /// The EGN of a citizen or the username of an administrator. Without
    /// one, commands run without a session.
    #[arg(long, env = "EGOV_IDENTIFIER")]
    identifier: Option<String>,

    /// The password to log in with. Prompted for when unset.
    #[arg(long = "password", env = "EGOV_PASSWORD", hide_env_values = true, hide = true)]
    password: Option<String>,

    /// Keep the profiles returned at login in memory only.
    #[arg(long)]
    no_profile_snapshot: bool,

    #[clap(subcommand)]
    command: Command,
}

fn snapshots(args: &Args) -> Snapshots {
    if !args.no_profile_snapshot {
        if let Some(snapshots) = Snapshots::on_disk() {
            return snapshots;
        }
        info!("No data directory is available, so profiles are kept in memory");
    }

    Snapshots::in_memory()
}

async fn login(portal: &Portal, args: &mut Args) -> Result<()> {
    let Some(identifier) = args.identifier.clone() else {
        return Ok(());
    };

    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(password::Preset(args.password.take().map(SecretString::new))),
        Box::new(password::RpasswordPrompt),
    ];
    let secret = prompt
        .prompt(&identifier)
        .await?
        .ok_or_else(|| Error::Validation("a password is required".to_owned()))?;

    let _ = portal.login(args.role, &identifier, &secret).await?;
    Ok(())
}

async fn run(mut args: Args) -> Result<()> {
    let portal = Portal::new(
        Client::new(args.base_url.clone(), Reqwest::new()?),
        Session::ephemeral(),
        snapshots(&args),
    );

    if !args.command.is_anonymous() {
        login(&portal, &mut args).await?;
    }

    command::Command::execute(args.command, &portal).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("EGOV_LOG", "warn")
        .write_style("EGOV_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error ({}): {}", e.kind(), e);
        process::exit(1);
    };
}
