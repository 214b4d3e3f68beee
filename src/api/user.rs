// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

use crate::{request::Request, session::Role};

use super::{Access, Executor};

/// The logged-in citizen's own profile.
pub struct Me;

impl From<Me> for Request {
    fn from(_: Me) -> Self {
        Self::get("/api/users/me")
    }
}

impl Executor for Me {
    type Response = Value;
    const ACCESS: Access = Access::Role(Role::Citizen);
}
