use anyhow::Result;
use serde_json::Value;

use crate::prediction::{PredictedScore, PredictionResult};

pub const DEFAULT_AI_CONFIDENCE: u32 = 70;

const MAX_SHARE: f64 = 1000.0;
// Failed brace scans allowed before giving up on a reply.
const MAX_UNBALANCED_STARTS: usize = 32;

/// Decodes a provider reply into a candidate result. The reply may be bare
/// JSON, fenced JSON, or JSON buried in prose; the first object that carries
/// the three percentages and a score wins.
pub fn parse_prediction_reply(raw: &str) -> Result<PredictionResult> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("empty reply"));
    }

    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        if let Some(result) = prediction_from_value(&v) {
            return Ok(result);
        }
    }

    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(fenced.trim()) {
            if let Some(result) = prediction_from_value(&v) {
                return Ok(result);
            }
        }
    }

    for candidate in json_object_spans(trimmed) {
        let Ok(v) = serde_json::from_str::<Value>(candidate) else {
            continue;
        };
        if let Some(result) = prediction_from_value(&v) {
            return Ok(result);
        }
    }

    Err(anyhow::anyhow!("no prediction object found in reply"))
}

fn prediction_from_value(v: &Value) -> Option<PredictionResult> {
    if !v.is_object() {
        return None;
    }
    // Some models wrap the object as `{"prediction": {...}}`.
    let obj = ["prediction", "result"]
        .iter()
        .find_map(|k| v.get(*k).filter(|inner| inner.is_object()))
        .unwrap_or(v);

    let mut home_win = pick_number(obj, &["homeWin", "home_win", "homeWinProbability"])?;
    let mut draw = pick_number(obj, &["draw", "drawProbability", "draw_pct"])?;
    let mut away_win = pick_number(obj, &["awayWin", "away_win", "awayWinProbability"])?;
    if looks_like_fractions(home_win, draw, away_win) {
        home_win *= 100.0;
        draw *= 100.0;
        away_win *= 100.0;
    }
    let predicted_score = pick(obj, &["predictedScore", "predicted_score", "score"])
        .and_then(parse_score)?;

    let confidence = pick_number(obj, &["confidence"])
        .map(|c| c.round().clamp(0.0, u32::MAX as f64) as u32)
        .unwrap_or(DEFAULT_AI_CONFIDENCE);
    let analysis = pick(obj, &["analysis", "rationale", "summary"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let key_factors = pick(obj, &["keyFactors", "key_factors", "factors"])
        .map(parse_factors)
        .unwrap_or_default();

    Some(PredictionResult {
        home_win: pct(home_win),
        draw: pct(draw),
        away_win: pct(away_win),
        predicted_score,
        confidence,
        analysis,
        key_factors,
    })
}

fn pick<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .filter(|v| !v.is_null())
}

fn pick_number(obj: &Value, keys: &[&str]) -> Option<f64> {
    pick(obj, keys).and_then(value_to_f64)
}

fn value_to_f64(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

// 0.45 / 0.30 / 0.25 style replies.
fn looks_like_fractions(home: f64, draw: f64, away: f64) -> bool {
    let all_unit = [home, draw, away].iter().all(|p| (0.0..=1.0).contains(p));
    all_unit && (0.9..=1.1).contains(&(home + draw + away))
}

fn pct(v: f64) -> i32 {
    v.round().clamp(0.0, MAX_SHARE) as i32
}

fn parse_score(v: &Value) -> Option<PredictedScore> {
    match v {
        Value::Object(_) => {
            let home = pick_number(v, &["home", "homeGoals", "home_goals"])?;
            let away = pick_number(v, &["away", "awayGoals", "away_goals"])?;
            Some(PredictedScore {
                home: goals(home),
                away: goals(away),
            })
        }
        Value::String(s) => {
            let (h, a) = s.split_once(['-', ':', '–'])?;
            Some(PredictedScore {
                home: h.trim().parse().ok()?,
                away: a.trim().parse().ok()?,
            })
        }
        Value::Array(items) if items.len() == 2 => Some(PredictedScore {
            home: goals(value_to_f64(&items[0])?),
            away: goals(value_to_f64(&items[1])?),
        }),
        _ => None,
    }
}

fn goals(v: f64) -> u32 {
    v.round().clamp(0.0, u32::MAX as f64) as u32
}

fn parse_factors(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s.split([',', ';']).map(|p| p.trim().to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Body of the first ``` fenced block, with any language tag dropped.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Balanced `{...}` spans in document order, skipping braces inside strings.
fn json_object_spans(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut search_from = 0;
    let mut unbalanced = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        match balanced_end(bytes, start) {
            Some(end) => {
                spans.push(&text[start..=end]);
                search_from = end + 1;
            }
            None => {
                unbalanced += 1;
                if unbalanced == MAX_UNBALANCED_STARTS {
                    break;
                }
                search_from = start + 1;
            }
        }
    }
    spans
}

fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
