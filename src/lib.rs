//! Client-side quote manager with remote synchronization.
//!
//! Quotes live in a write-through local store. Local mutations are queued durably and delivered to
//! a remote endpoint, while periodic sync cycles pull the remote record set and merge it with
//! remote-wins semantics.

pub mod config;
pub mod quotes;
pub mod remote;
pub mod storage;
pub mod sync;

pub use config::{AppConfig, RemoteConfig, SyncConfig};
