use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use matchday_oracle::evaluation::evaluate_predictions;
use matchday_oracle::heuristic::{HeuristicConfig, HeuristicPredictor, SeededRandom};
use matchday_oracle::normalize::NormalizerConfig;
use matchday_oracle::{PredictedScore, PredictionEngine, PredictionRequest};

#[derive(Debug, serde::Deserialize)]
struct BacktestCase {
    #[serde(flatten)]
    request: PredictionRequest,
    final_score: PredictedScore,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/backtest_cases.json"));
    let seed = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(26);

    let raw = fs::read_to_string(&path).with_context(|| format!("failed reading {}", path.display()))?;
    let cases: Vec<BacktestCase> = serde_json::from_str(&raw).context("invalid backtest cases")?;

    // Heuristic only, seeded so repeated runs print the same numbers.
    let engine = PredictionEngine::new(
        HeuristicPredictor::new(HeuristicConfig::default(), Box::new(SeededRandom::new(seed))),
        None,
        NormalizerConfig::default(),
    );

    let mut predictions = Vec::with_capacity(cases.len());
    let mut finals = Vec::with_capacity(cases.len());
    for case in &cases {
        match engine.predict(&case.request) {
            Ok(result) => {
                predictions.push(result);
                finals.push(case.final_score);
            }
            Err(err) => eprintln!(
                "skipping {} vs {}: {err:#}",
                case.request.home_team, case.request.away_team
            ),
        }
    }

    let m = evaluate_predictions(&predictions, &finals);
    println!("Cases: {}", m.samples);
    println!("Brier: {:.4}", m.brier);
    println!("Log loss: {:.4}", m.log_loss);
    println!("Accuracy: {:.1}%", m.accuracy * 100.0);
    println!("Exact score: {:.1}%", m.exact_score_rate * 100.0);

    Ok(())
}
