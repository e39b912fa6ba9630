use crate::heuristic::HeuristicPredictor;
use crate::prediction::{MatchContext, PredictionResult, PredictionSource};
use crate::prompt::build_messages;
use crate::provider::ReasoningProvider;
use crate::reply_parse::parse_prediction_reply;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 600;

/// Asks a reasoning provider first and swaps in the heuristic whenever the
/// provider fails or its reply cannot be decoded. One attempt per call.
pub struct AiPredictor {
    provider: Box<dyn ReasoningProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl AiPredictor {
    pub fn new(provider: Box<dyn ReasoningProvider>) -> Self {
        Self {
            provider,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Candidate result plus where it came from. Not normalized yet.
    pub fn predict(
        &self,
        ctx: &MatchContext,
        fallback: &HeuristicPredictor,
    ) -> (PredictionResult, PredictionSource) {
        let messages = build_messages(ctx);
        let reply = match self
            .provider
            .complete(&messages, self.temperature, self.max_tokens)
        {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!(
                    "provider failed for {} vs {}, using heuristic: {err:#}",
                    ctx.home_team,
                    ctx.away_team
                );
                return (fallback.predict(ctx), PredictionSource::Heuristic);
            }
        };

        match parse_prediction_reply(&reply) {
            Ok(candidate) => {
                log::info!(
                    "provider prediction for {} vs {}: {}/{}/{}",
                    ctx.home_team,
                    ctx.away_team,
                    candidate.home_win,
                    candidate.draw,
                    candidate.away_win
                );
                (candidate, PredictionSource::Ai)
            }
            Err(err) => {
                log::warn!(
                    "unusable provider reply for {} vs {}, using heuristic: {err:#}",
                    ctx.home_team,
                    ctx.away_team
                );
                log::debug!("raw provider reply: {reply}");
                (fallback.predict(ctx), PredictionSource::Heuristic)
            }
        }
    }
}
