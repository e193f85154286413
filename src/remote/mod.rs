// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote document store backends.

pub mod memory;
pub mod notion;
pub mod traits;

pub use memory::InMemoryRemoteStore;
pub use notion::NotionStore;
pub use traits::{QueryPage, RemoteError, RemoteStore};
