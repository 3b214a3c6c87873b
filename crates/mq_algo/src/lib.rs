//! Algorithm layer: Field-to-Item Resolver, Recoder, Validator, and Scoring
//! Engine. Pure functions over `mq_core` types — no I/O, no knowledge of
//! the registry or the CLI.

#![forbid(unsafe_code)]

pub mod recode;
pub mod resolve;
pub mod score;
pub mod validate;

pub use recode::{normalize_text, recode_value, RecodeOutcome};
pub use resolve::{resolve, BindingSource, ResolveError};
pub use score::{score_scale, ScaleScore};
pub use validate::validate_submission;
