//! Registry Store (§4.1): loads Measure Specs and Form Binding Specs from a
//! directory layout, validating each document against its JSON Schema and
//! the in-memory invariants in `mq_core::spec_validate` before it becomes
//! servable.
//!
//! No network I/O, no interpretation of submission content — this crate's
//! only job is turning files on disk into validated, indexed, immutable
//! `MeasureSpec`/`FormBindingSpec` values.

#![forbid(unsafe_code)]

pub mod canonical_json;
pub mod item_map;
pub mod schema;
pub mod store;

pub use store::{FormBindingRegistry, MeasureRegistry};

use thiserror::Error;

/// Startup-time failure: a registry document could not be loaded or did not
/// pass schema/invariant validation. The driver treats any `RegistryError`
/// as fatal and exits before processing a single submission.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} failed schema validation: {detail}")]
    SchemaViolation { path: String, detail: String },

    #[error("registry path does not exist: {path}")]
    RegistryPathMissing { path: String },

    #[error("{path} failed invariant validation:\n{detail}")]
    InvariantViolation { path: String, detail: String },

    #[error("duplicate (id, version) in registry: {id} {version} found at both {first} and {second}")]
    Duplicate {
        id: String,
        version: String,
        first: String,
        second: String,
    },

    #[error("measure_id/binding_id in {path} ({in_file}) does not match its directory name ({in_dir})")]
    IdMismatch {
        path: String,
        in_file: String,
        in_dir: String,
    },

    #[error("invalid semver '{version}' in {path}")]
    BadVersion { path: String, version: String },

    #[error("unknown id '{id}'")]
    NotFound { id: String },

    #[error("unknown (id, version) pair: {id} {version}")]
    VersionNotFound { id: String, version: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
