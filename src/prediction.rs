use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::form::{FormInput, FormSummary};

pub const MAX_HOME_GOALS: u32 = 5;
pub const MAX_AWAY_GOALS: u32 = 4;
pub const MIN_CONFIDENCE: u32 = 55;
pub const MAX_CONFIDENCE: u32 = 85;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default)]
    pub home_form: Option<FormInput>,
    #[serde(default)]
    pub away_form: Option<FormInput>,
    #[serde(default)]
    pub home_rank: Option<u32>,
    #[serde(default)]
    pub away_rank: Option<u32>,
}

impl PredictionRequest {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            ..Self::default()
        }
    }

    /// Rejects requests that do not name a real fixture. Everything else has
    /// a neutral default.
    pub fn validate(&self) -> Result<()> {
        let home = self.home_team.trim();
        let away = self.away_team.trim();
        match (home.is_empty(), away.is_empty()) {
            (true, true) => return Err(anyhow::anyhow!("home_team and away_team are required")),
            (true, false) => return Err(anyhow::anyhow!("home_team is required")),
            (false, true) => return Err(anyhow::anyhow!("away_team is required")),
            (false, false) => {}
        }
        if home.eq_ignore_ascii_case(away) {
            return Err(anyhow::anyhow!(
                "home_team and away_team must differ (got `{home}` twice)"
            ));
        }
        Ok(())
    }

    pub fn competition(&self) -> Option<&str> {
        self.competition
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Inputs every predictor works from once missing form has been neutralized.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub home_team: String,
    pub away_team: String,
    pub competition: Option<String>,
    pub home_form: FormSummary,
    pub away_form: FormSummary,
    pub home_rank: Option<u32>,
    pub away_rank: Option<u32>,
}

impl MatchContext {
    pub fn from_request(req: &PredictionRequest) -> Self {
        let form = |input: Option<&FormInput>| {
            input
                .map(FormSummary::from_input)
                .unwrap_or_else(FormSummary::neutral)
        };
        Self {
            home_team: req.home_team.trim().to_string(),
            away_team: req.away_team.trim().to_string(),
            competition: req.competition().map(str::to_string),
            home_form: form(req.home_form.as_ref()),
            away_form: form(req.away_form.as_ref()),
            home_rank: req.home_rank,
            away_rank: req.away_rank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedScore {
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub home_win: i32,
    pub draw: i32,
    pub away_win: i32,
    pub predicted_score: PredictedScore,
    pub confidence: u32,
    pub analysis: String,
    pub key_factors: Vec<String>,
}

impl PredictionResult {
    /// Widened so replies with absurd shares cannot overflow.
    pub fn total(&self) -> i64 {
        i64::from(self.home_win) + i64::from(self.draw) + i64::from(self.away_win)
    }
}

/// Which predictor produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Ai,
    Heuristic,
}
