// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task;

use egov_portal::Result;

#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    async fn prompt(&self, label: &str) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, label: &str) -> Result<Option<SecretString>> {
        (**self).prompt(label).await
    }
}

#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, label: &str) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(label).await {
                return r;
            }
        }

        Ok(None)
    }
}

/// A password handed to us up front, for example through the environment.
pub(crate) struct Preset(pub(crate) Option<SecretString>);

#[async_trait]
impl Prompt for Preset {
    async fn prompt(&self, _: &str) -> Result<Option<SecretString>> {
        Ok(self.0.clone())
    }
}

pub(crate) struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, label: &str) -> Result<Option<SecretString>> {
        let label = format!("Password for {label}: ");
        Ok(Some(
            task::spawn_blocking(move || rpassword::prompt_password(label).map(SecretString::new))
                .await
                .map_err(std::io::Error::from)??,
        ))
    }
}
