// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Single-slot storage backends. Each backend holds at most one value; the
//! slot's identity (a file name, or the memory cell itself) plays the role of
//! the storage key.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::Storage as Error;

pub use file::File;
pub use memory::Memory;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub trait IsPersistent {
    fn is_persistent(&self) -> bool;
}

#[async_trait]
pub trait Storage<T>: Send + Sync + IsPersistent {
    async fn get(&self) -> Result<Option<T>>;
    async fn update(&self, data: &T) -> Result<()>;
    /// Empties the slot. Clearing an empty slot succeeds.
    async fn clear(&self) -> Result<()>;
}
