//! Match outcome prediction: form summaries, a bounded heuristic, an optional
//! reasoning-provider path with heuristic fallback, and a normalizer that
//! every result passes through.

pub mod ai_predict;
pub mod config;
pub mod engine;
pub mod evaluation;
pub mod form;
pub mod heuristic;
pub mod normalize;
pub mod prediction;
pub mod prompt;
pub mod provider;
pub mod reply_parse;

pub use engine::PredictionEngine;
pub use prediction::{PredictedScore, PredictionRequest, PredictionResult, PredictionSource};
