use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use serde_json::{Value, json};

use matchday_oracle::config::EngineConfig;
use matchday_oracle::{PredictionEngine, PredictionRequest, PredictionResult, PredictionSource};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let mut with_source = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--source" => with_source = true,
            _ => path = Some(arg),
        }
    }

    let raw = match path.as_deref() {
        Some("-") | None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed reading request from stdin")?;
            buf
        }
        Some(p) => fs::read_to_string(p).with_context(|| format!("failed reading {p}"))?,
    };
    let input: Value = serde_json::from_str(raw.trim()).context("invalid request json")?;

    let cfg = EngineConfig::from_env();
    let engine = PredictionEngine::from_config(&cfg);

    let output = if input.is_array() {
        let reqs: Vec<PredictionRequest> =
            serde_json::from_value(input).context("invalid request list")?;
        let rows = engine
            .predict_batch_with_source(&reqs)
            .into_iter()
            .zip(&reqs)
            .map(|(res, req)| match res {
                Ok((result, source)) => prediction_json(result, source, with_source),
                Err(err) => {
                    log::warn!("{} vs {}: {err:#}", req.home_team, req.away_team);
                    json!({ "error": format!("{err:#}") })
                }
            })
            .collect::<Vec<_>>();
        Value::Array(rows)
    } else {
        let req: PredictionRequest = serde_json::from_value(input).context("invalid request")?;
        let (result, source) = engine.predict_with_source(&req)?;
        prediction_json(result, source, with_source)
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn prediction_json(result: PredictionResult, source: PredictionSource, with_source: bool) -> Value {
    if with_source {
        json!({ "source": source, "result": result })
    } else {
        json!(result)
    }
}
