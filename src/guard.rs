// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Access checks for façade calls and for screens.

use log::debug;

use crate::{
    error::{Error, Result},
    session::{Role, Session},
};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

impl Role {
    /// The screen a principal of this role lands on after login, and the one
    /// they are bounced to when they wander into the other role's screens.
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Citizen => "/user",
            Self::Administrator => "/admin",
        }
    }
}

pub async fn require_any_session(session: &Session) -> Result<()> {
    if session.has_active_session().await {
        Ok(())
    } else {
        Err(Error::NotAuthenticated)
    }
}

pub async fn require_role(session: &Session, role: Role) -> Result<()> {
    require_any_session(session).await?;
    match session.current_role().await {
        Some(current) if current == role => Ok(()),
        Some(_) => Err(Error::ForbiddenRole { required: role }),
        // The session ended between the two reads.
        None => Err(Error::NotAuthenticated),
    }
}

/// What the presentation layer should do with a navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Render,
    /// Send the visitor to [`LOGIN_PATH`], remembering where they wanted to go.
    RedirectToLogin { from: String },
    /// Send the principal to their own role's landing page. The session is
    /// left untouched.
    RedirectToLanding(Role),
}

impl Decision {
    pub fn target(&self) -> Option<&str> {
        match *self {
            Self::Render => None,
            Self::RedirectToLogin { .. } => Some(LOGIN_PATH),
            Self::RedirectToLanding(role) => Some(role.landing_path()),
        }
    }
}

/// Decides whether `location` may be shown. An empty `allowed` set admits
/// any logged-in principal.
pub async fn navigate(session: &Session, location: &str, allowed: &[Role]) -> Decision {
    let role = match session.current_role().await {
        Some(role) => role,
        None => {
            debug!("Sending an anonymous visitor from {} to log in", location);
            return Decision::RedirectToLogin {
                from: location.to_owned(),
            };
        }
    };

    if allowed.is_empty() || allowed.contains(&role) {
        Decision::Render
    } else {
        debug!("A {} may not view {}", role, location);
        Decision::RedirectToLanding(role)
    }
}
