//! # acsync remote transport
//!
//! REST/XML client for the remote access-control service, implementing the
//! engine's [`RemoteSyncClient`](acsync_core::RemoteSyncClient) trait.
//!
//! - [`config`] - connection settings and credential validation
//! - [`wire`] - XML request/response documents
//! - [`client`] - the HTTP client

pub mod client;
pub mod config;
pub mod wire;

pub use client::RestRemote;
pub use config::{RemoteConfig, RemoteError};
