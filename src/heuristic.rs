use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::prediction::{
    MAX_AWAY_GOALS, MAX_HOME_GOALS, MatchContext, PredictedScore, PredictionResult,
};

pub const DEFAULT_KEY_FACTORS: [&str; 4] =
    ["Home advantage", "Recent form", "League position", "Momentum"];

/// Where the heuristic gets its per-call noise from.
pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[-spread, spread]`.
    fn perturbation(&self, spread: f64) -> f64;
    /// Uniform draw in `[0, 1)`.
    fn unit(&self) -> f64;
}

/// Fresh thread-local draws on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn perturbation(&self, spread: f64) -> f64 {
        if spread <= 0.0 {
            return 0.0;
        }
        rand::thread_rng().gen_range(-spread..=spread)
    }

    fn unit(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Reproducible sequence of draws, for backtests.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn perturbation(&self, spread: f64) -> f64 {
        if spread <= 0.0 {
            return 0.0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(-spread..=spread)
    }

    fn unit(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(0.0..1.0)
    }
}

// Largest f64 below 1.0.
const MAX_UNIT: f64 = 1.0 - f64::EPSILON / 2.0;

/// Always returns the same values. `factor` is clamped into the requested spread.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    pub factor: f64,
    pub unit: f64,
}

impl FixedRandom {
    pub fn new(factor: f64, unit: f64) -> Self {
        Self { factor, unit }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl RandomSource for FixedRandom {
    fn perturbation(&self, spread: f64) -> f64 {
        self.factor.clamp(-spread.abs(), spread.abs())
    }

    fn unit(&self) -> f64 {
        self.unit.clamp(0.0, MAX_UNIT)
    }
}

#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    pub home_advantage: f64,
    pub streak_threshold: u32,
    pub streak_bonus: f64,
    pub random_spread: f64,
    // Reserved mass that keeps draws alive in lopsided matchups.
    pub draw_mass: f64,
    pub home_win_range: (i32, i32),
    pub away_win_range: (i32, i32),
    pub home_goal_scale: f64,
    pub away_goal_scale: f64,
    pub confidence: u32,
    pub key_factors: Vec<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            home_advantage: 10.0,
            streak_threshold: 3,
            streak_bonus: 8.0,
            random_spread: 5.0,
            draw_mass: 35.0,
            home_win_range: (15, 70),
            away_win_range: (10, 60),
            home_goal_scale: 3.0,
            away_goal_scale: 2.5,
            confidence: 55,
            key_factors: DEFAULT_KEY_FACTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct HeuristicPredictor {
    config: HeuristicConfig,
    random: Box<dyn RandomSource>,
}

impl Default for HeuristicPredictor {
    fn default() -> Self {
        Self::new(HeuristicConfig::default(), Box::new(ThreadRandom))
    }
}

impl HeuristicPredictor {
    pub fn new(config: HeuristicConfig, random: Box<dyn RandomSource>) -> Self {
        Self { config, random }
    }

    pub fn with_random(random: Box<dyn RandomSource>) -> Self {
        Self::new(HeuristicConfig::default(), random)
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Raw candidate; `draw` can come out negative for extreme inputs and is
    /// left for the normalizer.
    pub fn predict(&self, ctx: &MatchContext) -> PredictionResult {
        let cfg = &self.config;

        let mut home_strength = ctx.home_form.form_score + cfg.home_advantage;
        let mut away_strength = ctx.away_form.form_score;
        if ctx.home_form.win_streak >= cfg.streak_threshold {
            home_strength += cfg.streak_bonus;
        }
        if ctx.away_form.win_streak >= cfg.streak_threshold {
            away_strength += cfg.streak_bonus;
        }

        let random_factor = self.random.perturbation(cfg.random_spread);
        let total = home_strength + away_strength + cfg.draw_mass;

        let home_win = clamp_pct(
            (home_strength + random_factor) / total * 100.0,
            cfg.home_win_range,
        );
        let away_win = clamp_pct(
            (away_strength - random_factor) / total * 100.0,
            cfg.away_win_range,
        );
        let draw = 100 - home_win - away_win;

        let predicted_score = PredictedScore {
            home: goals(
                home_win as f64 / 100.0 * cfg.home_goal_scale + self.random.unit(),
                MAX_HOME_GOALS,
            ),
            away: goals(
                away_win as f64 / 100.0 * cfg.away_goal_scale + self.random.unit(),
                MAX_AWAY_GOALS,
            ),
        };

        log::debug!(
            "heuristic {} vs {}: strength {:.1}/{:.1}, factor {:+.2} -> {}/{}/{}",
            ctx.home_team,
            ctx.away_team,
            home_strength,
            away_strength,
            random_factor,
            home_win,
            draw,
            away_win
        );

        PredictionResult {
            home_win,
            draw,
            away_win,
            predicted_score,
            confidence: cfg.confidence,
            analysis: templated_analysis(ctx, home_win, away_win),
            key_factors: cfg.key_factors.clone(),
        }
    }
}

pub fn templated_analysis(ctx: &MatchContext, home_win: i32, away_win: i32) -> String {
    let venue = match ctx.competition.as_deref() {
        Some(comp) => format!("{} host {} in the {}.", ctx.home_team, ctx.away_team, comp),
        None => format!("{} host {}.", ctx.home_team, ctx.away_team),
    };
    let lean = if home_win > away_win {
        format!(
            "Home advantage and recent form tilt this towards {}, but {} have enough to make it close.",
            ctx.home_team, ctx.away_team
        )
    } else if away_win > home_win {
        format!(
            "{} arrive in the stronger form and are slight favourites despite playing away.",
            ctx.away_team
        )
    } else {
        "There is little to separate the sides on recent form.".to_string()
    };
    format!("{venue} {lean}")
}

fn clamp_pct(raw: f64, (lo, hi): (i32, i32)) -> i32 {
    if !raw.is_finite() {
        return lo;
    }
    (raw.round() as i32).clamp(lo, hi)
}

fn goals(raw: f64, cap: u32) -> u32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    (raw.round() as u32).min(cap)
}
