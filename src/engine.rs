use anyhow::Result;
use rayon::prelude::*;

use crate::ai_predict::AiPredictor;
use crate::config::EngineConfig;
use crate::heuristic::HeuristicPredictor;
use crate::normalize::{NormalizerConfig, normalize_result};
use crate::prediction::{MatchContext, PredictionRequest, PredictionResult, PredictionSource};
use crate::provider::ChatCompletionsProvider;

/// Entry point for callers: validates, predicts, normalizes.
pub struct PredictionEngine {
    heuristic: HeuristicPredictor,
    ai: Option<AiPredictor>,
    normalizer: NormalizerConfig,
    parallelism: usize,
}

impl PredictionEngine {
    pub fn new(
        heuristic: HeuristicPredictor,
        ai: Option<AiPredictor>,
        normalizer: NormalizerConfig,
    ) -> Self {
        Self {
            heuristic,
            ai,
            normalizer,
            parallelism: 4,
        }
    }

    pub fn heuristic_only() -> Self {
        Self::new(
            HeuristicPredictor::default(),
            None,
            NormalizerConfig::default(),
        )
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        let ai = match &cfg.provider {
            Some(settings) if cfg.uses_provider() => {
                log::info!(
                    "reasoning provider enabled: {} ({})",
                    settings.model,
                    settings.base_url
                );
                Some(
                    AiPredictor::new(Box::new(ChatCompletionsProvider::new(settings.clone())))
                        .with_sampling(cfg.temperature, cfg.max_tokens),
                )
            }
            Some(_) => {
                log::info!("reasoning provider disabled, heuristic only");
                None
            }
            None => {
                log::info!("no reasoning provider configured, heuristic only");
                None
            }
        };
        let normalizer = NormalizerConfig {
            sum_tolerance: cfg.sum_tolerance,
            ..NormalizerConfig::default()
        };
        Self::new(HeuristicPredictor::default(), ai, normalizer).with_parallelism(cfg.parallelism)
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.max(1);
        self
    }

    pub fn has_provider(&self) -> bool {
        self.ai.is_some()
    }

    /// Fails only when the request does not name a fixture.
    pub fn predict(&self, req: &PredictionRequest) -> Result<PredictionResult> {
        self.predict_with_source(req).map(|(result, _)| result)
    }

    pub fn predict_with_source(
        &self,
        req: &PredictionRequest,
    ) -> Result<(PredictionResult, PredictionSource)> {
        req.validate()?;
        let ctx = MatchContext::from_request(req);

        let (candidate, source) = match &self.ai {
            Some(ai) => ai.predict(&ctx, &self.heuristic),
            None => (self.heuristic.predict(&ctx), PredictionSource::Heuristic),
        };
        Ok((normalize_result(candidate, &ctx, &self.normalizer), source))
    }

    /// Each request is predicted independently; results keep input order.
    pub fn predict_batch(&self, reqs: &[PredictionRequest]) -> Vec<Result<PredictionResult>> {
        self.predict_batch_with_source(reqs)
            .into_iter()
            .map(|res| res.map(|(result, _)| result))
            .collect()
    }

    pub fn predict_batch_with_source(
        &self,
        reqs: &[PredictionRequest],
    ) -> Vec<Result<(PredictionResult, PredictionSource)>> {
        let run = || {
            reqs.par_iter()
                .map(|req| self.predict_with_source(req))
                .collect::<Vec<_>>()
        };
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(_) => run(),
        }
    }
}
