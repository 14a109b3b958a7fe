#![doc = "docs-sync-core: core logic library for docs-sync."]

//! This crate holds the domain side of docs-sync: the contracts for the remote
//! documentation API and the bulk-upload tool, the synchronisation config, the
//! version synchroniser and the index-table generator.
//! Transport (HTTP, subprocesses) lives in the `docs-sync` crate.
//!
//! # Usage
//! Build a [`synchronise::VersionSynchroniser`] from a [`config::SyncConfig`]
//! and concrete [`contract::DocsApi`] / [`contract::BulkUploader`] implementations.

pub mod config;
pub mod contract;
pub mod error;
pub mod synchronise;
pub mod tables;
