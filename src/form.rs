use std::fmt;

use serde::{Deserialize, Serialize};

pub const NEUTRAL_FORM_SCORE: f64 = 50.0;
pub const MAX_RECENT_RESULTS: usize = 5;

const RECENCY_DECAY: f64 = 0.85;
const GOAL_DIFF_CAP: f64 = 3.0;
const GOAL_DIFF_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl MatchOutcome {
    pub fn marker(self) -> char {
        match self {
            MatchOutcome::Win => 'W',
            MatchOutcome::Draw => 'D',
            MatchOutcome::Loss => 'L',
        }
    }

    fn points(self) -> f64 {
        match self {
            MatchOutcome::Win => 3.0,
            MatchOutcome::Draw => 1.0,
            MatchOutcome::Loss => 0.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "w" | "win" | "won" => Some(MatchOutcome::Win),
            "d" | "draw" | "drew" | "tie" => Some(MatchOutcome::Draw),
            "l" | "loss" | "lost" | "lose" => Some(MatchOutcome::Loss),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for MatchOutcome {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        MatchOutcome::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown match outcome `{raw}`")))
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub outcome: MatchOutcome,
    #[serde(default)]
    pub goals_for: u32,
    #[serde(default)]
    pub goals_against: u32,
}

impl MatchResult {
    pub fn new(outcome: MatchOutcome, goals_for: u32, goals_against: u32) -> Self {
        Self {
            outcome,
            goals_for,
            goals_against,
        }
    }
}

/// What a caller knows about one side's recent form. Either part may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub form_score: Option<f64>,
    #[serde(default)]
    pub last_results: Vec<MatchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    pub form_score: f64,
    /// Most recent first.
    pub last_results: Vec<MatchResult>,
    pub win_streak: u32,
    pub unbeaten_streak: u32,
}

impl FormSummary {
    pub fn neutral() -> Self {
        Self {
            form_score: NEUTRAL_FORM_SCORE,
            last_results: Vec::new(),
            win_streak: 0,
            unbeaten_streak: 0,
        }
    }

    pub fn from_input(input: &FormInput) -> Self {
        let mut summary = summarize_form(&input.last_results);
        if let Some(score) = input.form_score {
            summary.form_score = clamp_form_score(score);
        }
        summary
    }

    /// Space separated result markers, e.g. `W W D L W`.
    pub fn results_string(&self) -> String {
        self.last_results
            .iter()
            .map(|r| r.outcome.marker().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_known(&self) -> bool {
        !self.last_results.is_empty() || self.form_score != NEUTRAL_FORM_SCORE
    }
}

/// Builds a summary from results ordered most recent first. Only the
/// `MAX_RECENT_RESULTS` newest matches are kept.
pub fn summarize_form(results: &[MatchResult]) -> FormSummary {
    let recent: Vec<MatchResult> = results.iter().take(MAX_RECENT_RESULTS).copied().collect();

    let win_streak = recent
        .iter()
        .take_while(|r| r.outcome == MatchOutcome::Win)
        .count() as u32;
    let unbeaten_streak = recent
        .iter()
        .take_while(|r| r.outcome != MatchOutcome::Loss)
        .count() as u32;

    FormSummary {
        form_score: derived_form_score(&recent),
        last_results: recent,
        win_streak,
        unbeaten_streak,
    }
}

fn derived_form_score(results: &[MatchResult]) -> f64 {
    if results.is_empty() {
        return NEUTRAL_FORM_SCORE;
    }

    let mut points = 0.0;
    let mut max_points = 0.0;
    let mut goal_diff = 0.0;
    let mut weight_sum = 0.0;

    for (k, r) in results.iter().enumerate() {
        let w = RECENCY_DECAY.powi(k as i32);
        points += w * r.outcome.points();
        max_points += w * 3.0;
        goal_diff += w * (r.goals_for as f64 - r.goals_against as f64);
        weight_sum += w;
    }

    let ratio = points / max_points;
    let gd = (goal_diff / weight_sum).clamp(-GOAL_DIFF_CAP, GOAL_DIFF_CAP);
    let raw = (ratio * 100.0 + gd / GOAL_DIFF_CAP * GOAL_DIFF_WEIGHT).clamp(0.0, 100.0);

    // A single result says little; lean on the neutral score until we have a full run.
    let shrink = (results.len() as f64 / MAX_RECENT_RESULTS as f64).min(1.0);
    shrink * raw + (1.0 - shrink) * NEUTRAL_FORM_SCORE
}

fn clamp_form_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        NEUTRAL_FORM_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(outcome: MatchOutcome) -> MatchResult {
        MatchResult::new(outcome, 1, 1)
    }

    #[test]
    fn streaks_stop_at_first_disqualifying_result() {
        use MatchOutcome::*;
        let s = summarize_form(&[r(Win), r(Win), r(Draw), r(Win), r(Loss)]);
        assert_eq!(s.win_streak, 2);
        assert_eq!(s.unbeaten_streak, 4);
    }

    #[test]
    fn win_streak_is_zero_when_latest_is_not_a_win() {
        use MatchOutcome::*;
        let s = summarize_form(&[r(Draw), r(Win), r(Win)]);
        assert_eq!(s.win_streak, 0);
        assert_eq!(s.unbeaten_streak, 3);

        let s = summarize_form(&[r(Loss), r(Win)]);
        assert_eq!(s.win_streak, 0);
        assert_eq!(s.unbeaten_streak, 0);
    }

    #[test]
    fn streak_invariant_holds() {
        use MatchOutcome::*;
        let runs = [
            vec![],
            vec![r(Win)],
            vec![r(Win), r(Win), r(Win), r(Win), r(Win), r(Win), r(Win)],
            vec![r(Draw), r(Draw), r(Loss)],
            vec![r(Win), r(Draw), r(Win), r(Draw), r(Win)],
        ];
        for run in runs {
            let s = summarize_form(&run);
            assert!(s.win_streak <= s.unbeaten_streak);
            assert!(s.unbeaten_streak as usize <= s.last_results.len());
            assert!(s.last_results.len() <= MAX_RECENT_RESULTS);
        }
    }

    #[test]
    fn empty_results_are_neutral() {
        assert_eq!(summarize_form(&[]), FormSummary::neutral());
    }

    #[test]
    fn winning_run_scores_above_losing_run() {
        use MatchOutcome::*;
        let hot = summarize_form(&[
            MatchResult::new(Win, 3, 0),
            MatchResult::new(Win, 2, 1),
            MatchResult::new(Win, 1, 0),
            MatchResult::new(Draw, 1, 1),
            MatchResult::new(Win, 2, 0),
        ]);
        let cold = summarize_form(&[
            MatchResult::new(Loss, 0, 2),
            MatchResult::new(Loss, 1, 3),
            MatchResult::new(Draw, 0, 0),
            MatchResult::new(Loss, 0, 1),
            MatchResult::new(Win, 1, 0),
        ]);
        assert!(hot.form_score > 75.0);
        assert!(cold.form_score < 30.0);
        assert!((0.0..=100.0).contains(&hot.form_score));
        assert!((0.0..=100.0).contains(&cold.form_score));
    }

    #[test]
    fn explicit_score_overrides_and_is_clamped() {
        let input = FormInput {
            form_score: Some(140.0),
            last_results: vec![r(MatchOutcome::Win)],
        };
        let s = FormSummary::from_input(&input);
        assert_eq!(s.form_score, 100.0);
        assert_eq!(s.win_streak, 1);

        let nan = FormInput {
            form_score: Some(f64::NAN),
            last_results: Vec::new(),
        };
        assert_eq!(FormSummary::from_input(&nan).form_score, NEUTRAL_FORM_SCORE);
    }

    #[test]
    fn outcome_parsing_accepts_words_and_markers() {
        assert_eq!(MatchOutcome::parse("W"), Some(MatchOutcome::Win));
        assert_eq!(MatchOutcome::parse(" draw "), Some(MatchOutcome::Draw));
        assert_eq!(MatchOutcome::parse("LOSS"), Some(MatchOutcome::Loss));
        assert_eq!(MatchOutcome::parse("?"), None);

        let parsed: MatchResult =
            serde_json::from_str(r#"{"outcome":"win","goals_for":2,"goals_against":0}"#).unwrap();
        assert_eq!(parsed.outcome, MatchOutcome::Win);
    }

    #[test]
    fn results_string_renders_markers_in_order() {
        use MatchOutcome::*;
        let s = summarize_form(&[r(Win), r(Draw), r(Loss)]);
        assert_eq!(s.results_string(), "W D L");
    }
}
