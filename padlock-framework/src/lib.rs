#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![deny(clippy::get_unwrap)]
#![allow(clippy::module_name_repetitions)]

pub mod extract;
mod handler;
mod method_router;
mod router;
mod sync_service;

pub use method_router::*;
pub use router::Router;
pub use sync_service::SyncService;
