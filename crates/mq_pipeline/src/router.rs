//! Domain Router (§4.7): a static `kind -> processor` table. Non-
//! questionnaire kinds are explicit stubs, not an absent match arm — a
//! measure accidentally declared `kind: lab` fails loudly at dispatch
//! time rather than silently falling through to the questionnaire path.

use mq_core::MeasureKind;

use crate::{EngineError, EngineResult};

pub enum Processor {
    Questionnaire,
}

pub fn route(kind: MeasureKind) -> EngineResult<Processor> {
    match kind {
        MeasureKind::Questionnaire => Ok(Processor::Questionnaire),
        MeasureKind::Lab => Err(EngineError::NotImplemented("lab".to_string())),
        MeasureKind::Vital => Err(EngineError::NotImplemented("vital".to_string())),
        MeasureKind::Wearable => Err(EngineError::NotImplemented("wearable".to_string())),
    }
}
