//! Orchestration: resolve binding, recode, validate, score, route by
//! domain, build the measurement event — one call per submission.

#![forbid(unsafe_code)]

pub mod event_builder;
pub mod pipeline;
pub mod router;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] mq_registry::RegistryError),

    #[error(transparent)]
    Resolve(#[from] mq_algo::ResolveError),

    #[error("measure '{0}' has no registered processor for its kind")]
    UnknownDomain(String),

    #[error("domain '{0}' is not implemented")]
    NotImplemented(String),

    #[error("no binding available for (form_id='{form_id}', measure_id='{measure_id}'): no matching binding-spec section and no item-map on disk")]
    MissingItemMap { form_id: String, measure_id: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

pub use pipeline::Pipeline;
