// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Administrator review of citizen registrations.

use clap::ValueEnum;
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;

use crate::{
    error::Error,
    request::{Decoding, Request},
    session::Role,
};

use super::{segment, Access, Executor};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Status {
    #[default]
    Pending,
    Active,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
        }
    }
}

#[derive(Default)]
pub struct ListRegistrations {
    pub status: Status,
}

impl From<ListRegistrations> for Request {
    fn from(value: ListRegistrations) -> Self {
        Self::get("/api/admin/registrations").with_query("status", value.status.as_str())
    }
}

impl Executor for ListRegistrations {
    type Response = Value;
    const ACCESS: Access = Access::Role(Role::Administrator);
}

pub struct ApproveRegistration {
    pub user_id: String,
}

impl TryFrom<ApproveRegistration> for Request {
    type Error = Error;

    fn try_from(value: ApproveRegistration) -> Result<Self, Self::Error> {
        Ok(Self::patch(format!(
            "/api/admin/registrations/{}/approve",
            segment(&value.user_id, "user id")?
        )))
    }
}

impl Executor for ApproveRegistration {
    type Response = Value;
    const ACCESS: Access = Access::Role(Role::Administrator);
}

/// Rejecting a registration deletes it.
pub struct RejectRegistration {
    pub user_id: String,
}

impl TryFrom<RejectRegistration> for Request {
    type Error = Error;

    fn try_from(value: RejectRegistration) -> Result<Self, Self::Error> {
        Ok(Self::delete(format!(
            "/api/admin/registrations/{}",
            segment(&value.user_id, "user id")?
        )))
    }
}

impl Executor for RejectRegistration {
    type Response = Value;
    const ACCESS: Access = Access::Role(Role::Administrator);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

/// A photo of the identity card a registration was submitted with.
pub struct IdCardImage {
    pub user_id: String,
    pub side: Side,
}

impl TryFrom<IdCardImage> for Request {
    type Error = Error;

    fn try_from(value: IdCardImage) -> Result<Self, Self::Error> {
        Ok(Self::get(format!(
            "/api/admin/registrations/{}/id-card/{}",
            segment(&value.user_id, "user id")?,
            value.side.as_str()
        ))
        .with_header(ACCEPT, HeaderValue::from_static("image/*"))
        .decode_as(Decoding::Binary))
    }
}

impl Executor for IdCardImage {
    type Response = Vec<u8>;
    const ACCESS: Access = Access::Role(Role::Administrator);
}
