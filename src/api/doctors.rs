// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The administrator-maintained registry of personal doctors.

use serde_json::Value;

use crate::{error::Error, request::Request, session::Role};

use super::{segment, Access, Executor};

pub struct ListDoctors;

impl From<ListDoctors> for Request {
    fn from(_: ListDoctors) -> Self {
        Self::get("/api/admin/health-doctors")
    }
}

impl Executor for ListDoctors {
    type Response = Value;
    const ACCESS: Access = Access::Role(Role::Administrator);
}

/// Adds a doctor. The body is passed through to the backend untouched.
pub struct CreateDoctor {
    pub body: Value,
}

impl TryFrom<CreateDoctor> for Request {
    type Error = Error;

    fn try_from(value: CreateDoctor) -> Result<Self, Self::Error> {
        if !value.body.is_object() {
            return Err(Error::validation("a doctor must be described by a JSON object"));
        }
        Ok(Self::post("/api/admin/health-doctors").with_json(value.body))
    }
}

impl Executor for CreateDoctor {
    type Response = Value;
    const ACCESS: Access = Access::Role(Role::Administrator);
}

pub struct DeleteDoctor {
    pub id: String,
}

impl TryFrom<DeleteDoctor> for Request {
    type Error = Error;

    fn try_from(value: DeleteDoctor) -> Result<Self, Self::Error> {
        Ok(Self::delete(format!(
            "/api/admin/health-doctors/{}",
            segment(&value.id, "doctor id")?
        )))
    }
}

impl Executor for DeleteDoctor {
    type Response = Value;
    const ACCESS: Access = Access::Role(Role::Administrator);
}
