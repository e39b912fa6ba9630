use crate::heuristic::{DEFAULT_KEY_FACTORS, templated_analysis};
use crate::prediction::{
    MAX_AWAY_GOALS, MAX_CONFIDENCE, MAX_HOME_GOALS, MIN_CONFIDENCE, MatchContext, PredictedScore,
    PredictionResult,
};

const NEUTRAL_SPLIT: (i32, i32, i32) = (34, 33, 33);
const MAX_ANALYSIS_SENTENCES: usize = 3;

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Largest drift of `home + draw + away` from 100 accepted without rescaling.
    pub sum_tolerance: i32,
    pub min_key_factors: usize,
    pub max_key_factors: usize,
    pub default_key_factors: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            sum_tolerance: 5,
            min_key_factors: 3,
            max_key_factors: 4,
            default_key_factors: DEFAULT_KEY_FACTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Brings any candidate in line with the output contract. Never fails, and
/// leaves an already valid result untouched.
pub fn normalize_result(
    candidate: PredictionResult,
    ctx: &MatchContext,
    cfg: &NormalizerConfig,
) -> PredictionResult {
    let (home_win, draw, away_win) = normalize_split(
        candidate.home_win,
        candidate.draw,
        candidate.away_win,
        cfg.sum_tolerance,
    );
    if (home_win, draw, away_win) != (candidate.home_win, candidate.draw, candidate.away_win) {
        log::debug!(
            "normalized {}/{}/{} (sum {}) to {}/{}/{}",
            candidate.home_win,
            candidate.draw,
            candidate.away_win,
            candidate.total(),
            home_win,
            draw,
            away_win
        );
    }

    let analysis = normalize_analysis(&candidate.analysis)
        .unwrap_or_else(|| templated_analysis(ctx, home_win, away_win));

    PredictionResult {
        home_win,
        draw,
        away_win,
        predicted_score: PredictedScore {
            home: candidate.predicted_score.home.min(MAX_HOME_GOALS),
            away: candidate.predicted_score.away.min(MAX_AWAY_GOALS),
        },
        confidence: candidate.confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
        analysis,
        key_factors: normalize_key_factors(&candidate.key_factors, cfg),
    }
}

/// Returns a split summing to exactly 100 with every share in `[0, 100]`.
/// The away share absorbs rounding.
pub fn normalize_split(home: i32, draw: i32, away: i32, tolerance: i32) -> (i32, i32, i32) {
    let home = home.max(0);
    let draw = draw.max(0);
    let away = away.max(0);
    let total = home as i64 + draw as i64 + away as i64;
    if total == 0 {
        return NEUTRAL_SPLIT;
    }

    let (mut home, mut draw) = if (total - 100).abs() > tolerance.max(0) as i64 {
        let scale = 100.0 / total as f64;
        (
            (home as f64 * scale).round() as i32,
            (draw as f64 * scale).round() as i32,
        )
    } else {
        (home, draw)
    };
    home = home.min(100);
    draw = draw.min(100);

    let mut away = 100 - home - draw;
    if away < 0 {
        let mut deficit = -away;
        let from_draw = deficit.min(draw);
        draw -= from_draw;
        deficit -= from_draw;
        home -= deficit;
        away = 0;
    }
    (home, draw, away)
}

fn normalize_analysis(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }

    let mut sentences = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            sentences += 1;
            if sentences == MAX_ANALYSIS_SENTENCES {
                return Some(text[..idx + c.len_utf8()].to_string());
            }
        }
    }
    Some(text)
}

fn normalize_key_factors(raw: &[String], cfg: &NormalizerConfig) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(cfg.max_key_factors);
    let push = |out: &mut Vec<String>, label: &str| {
        let label = label.trim();
        if label.is_empty() || out.iter().any(|f| f.eq_ignore_ascii_case(label)) {
            return;
        }
        out.push(label.to_string());
    };

    for label in raw {
        if out.len() == cfg.max_key_factors {
            break;
        }
        push(&mut out, label);
    }
    for label in &cfg.default_key_factors {
        if out.len() >= cfg.min_key_factors {
            break;
        }
        push(&mut out, label);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::PredictionRequest;

    fn ctx() -> MatchContext {
        MatchContext::from_request(&PredictionRequest::new("Celtic", "Rangers"))
    }

    fn candidate(home_win: i32, draw: i32, away_win: i32) -> PredictionResult {
        PredictionResult {
            home_win,
            draw,
            away_win,
            predicted_score: PredictedScore { home: 2, away: 1 },
            confidence: 70,
            analysis: "Celtic look sharper. Rangers have travelled well.".to_string(),
            key_factors: vec![
                "Home advantage".to_string(),
                "Recent form".to_string(),
                "Derby intensity".to_string(),
            ],
        }
    }

    #[test]
    fn valid_result_is_unchanged() {
        let c = candidate(45, 30, 25);
        let out = normalize_result(c.clone(), &ctx(), &NormalizerConfig::default());
        assert_eq!(out, c);
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let cfg = NormalizerConfig::default();
        for c in [candidate(80, 50, 40), candidate(-10, 20, 200), candidate(0, 0, 0)] {
            let once = normalize_result(c, &ctx(), &cfg);
            let twice = normalize_result(once.clone(), &ctx(), &cfg);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn large_drift_is_rescaled() {
        let (h, d, a) = normalize_split(60, 30, 30, 5);
        // 60 * 100/120 = 50, 30 * 100/120 = 25
        assert_eq!((h, d, a), (50, 25, 25));
    }

    #[test]
    fn small_drift_keeps_home_and_draw() {
        assert_eq!(normalize_split(46, 31, 26, 5), (46, 31, 23));
        assert_eq!(normalize_split(44, 29, 24, 5), (44, 29, 27));
    }

    #[test]
    fn drift_of_exactly_tolerance_is_kept() {
        assert_eq!(normalize_split(50, 30, 25, 5), (50, 30, 20));
        assert_eq!(normalize_split(50, 30, 15, 5), (50, 30, 20));
    }

    #[test]
    fn drift_just_past_tolerance_is_rescaled() {
        // 50 * 100/106 = 47.2, 30 * 100/106 = 28.3
        assert_eq!(normalize_split(50, 30, 26, 5), (47, 28, 25));
        // 50 * 100/94 = 53.2, 30 * 100/94 = 31.9
        assert_eq!(normalize_split(50, 30, 14, 5), (53, 32, 15));
    }

    #[test]
    fn extreme_shares_do_not_overflow() {
        log::set_max_level(log::LevelFilter::Debug);
        let out = normalize_result(
            candidate(i32::MAX, i32::MAX, 1),
            &ctx(),
            &NormalizerConfig::default(),
        );
        assert_eq!(out.total(), 100);
        assert_eq!((out.home_win, out.draw, out.away_win), (50, 50, 0));
    }

    #[test]
    fn tolerance_is_configurable() {
        assert_eq!(normalize_split(46, 31, 26, 0), (45, 30, 25));
    }

    #[test]
    fn away_absorbs_rounding() {
        // 1/3 each: 33.33 rounds down twice, away picks up the remainder.
        assert_eq!(normalize_split(1, 1, 1, 5), (33, 33, 34));
    }

    #[test]
    fn negative_draw_from_heuristic_is_repaired() {
        let (h, d, a) = normalize_split(70, -30, 60, 5);
        assert!(h >= 0 && d >= 0 && a >= 0);
        assert_eq!(h + d + a, 100);
        assert_eq!((h, d, a), (54, 0, 46));
    }

    #[test]
    fn rounding_overflow_never_goes_negative() {
        // 50.5 + 49.5 both round up; the deficit comes out of the draw.
        let (h, d, a) = normalize_split(101, 99, 0, 5);
        assert_eq!(h + d + a, 100);
        assert!(a >= 0 && d >= 0);

        let (h, d, a) = normalize_split(103, 0, 0, 5);
        assert_eq!((h, d, a), (100, 0, 0));
    }

    #[test]
    fn all_zero_gets_neutral_split() {
        assert_eq!(normalize_split(0, 0, 0, 5), (34, 33, 33));
        assert_eq!(normalize_split(-5, -5, 0, 5), (34, 33, 33));
    }

    #[test]
    fn confidence_and_score_are_clamped() {
        let mut c = candidate(45, 30, 25);
        c.confidence = 99;
        c.predicted_score = PredictedScore { home: 9, away: 7 };
        let out = normalize_result(c, &ctx(), &NormalizerConfig::default());
        assert_eq!(out.confidence, 85);
        assert_eq!(out.predicted_score, PredictedScore { home: 5, away: 4 });

        let mut c = candidate(45, 30, 25);
        c.confidence = 10;
        let out = normalize_result(c, &ctx(), &NormalizerConfig::default());
        assert_eq!(out.confidence, 55);
    }

    #[test]
    fn key_factors_are_bounded_and_deduplicated() {
        let cfg = NormalizerConfig::default();

        let mut c = candidate(45, 30, 25);
        c.key_factors = vec!["Set pieces".to_string(), " ".to_string(), "set pieces".to_string()];
        let out = normalize_result(c, &ctx(), &cfg);
        assert_eq!(
            out.key_factors,
            vec!["Set pieces", "Home advantage", "Recent form"]
        );

        let mut c = candidate(45, 30, 25);
        c.key_factors = (1..=6).map(|i| format!("Factor {i}")).collect();
        let out = normalize_result(c, &ctx(), &cfg);
        assert_eq!(out.key_factors.len(), 4);
        assert_eq!(out.key_factors[0], "Factor 1");
    }

    #[test]
    fn blank_analysis_is_templated() {
        let mut c = candidate(45, 30, 25);
        c.analysis = "   ".to_string();
        let out = normalize_result(c, &ctx(), &NormalizerConfig::default());
        assert!(out.analysis.contains("Celtic"));
        assert!(out.analysis.contains("Rangers"));
    }

    #[test]
    fn long_analysis_is_cut_to_three_sentences() {
        let text = "One. Two at 2.5 goals! Three? Four. Five.";
        assert_eq!(
            normalize_analysis(text).as_deref(),
            Some("One. Two at 2.5 goals! Three?")
        );
        assert_eq!(normalize_analysis("No terminator").as_deref(), Some("No terminator"));
    }
}
