use crate::prediction::{PredictedScore, PredictionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, Copy)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
    pub exact_score_rate: f64,
}

impl Metrics {
    fn empty() -> Self {
        Self {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
            exact_score_rate: 0.0,
        }
    }
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }
}

pub fn classify_outcome(home_goals: u32, away_goals: u32) -> Outcome {
    if home_goals > away_goals {
        Outcome::Home
    } else if home_goals < away_goals {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

pub fn prob3_from_result(result: &PredictionResult) -> Prob3 {
    let home = result.home_win.max(0) as f64;
    let draw = result.draw.max(0) as f64;
    let away = result.away_win.max(0) as f64;
    let sum = home + draw + away;
    if sum <= 0.0 {
        return Prob3::uniform();
    }
    Prob3 {
        home: home / sum,
        draw: draw / sum,
        away: away / sum,
    }
}

/// Scores predictions against final scores, pairwise and in order.
pub fn evaluate_predictions(predictions: &[PredictionResult], finals: &[PredictedScore]) -> Metrics {
    if predictions.is_empty() || predictions.len() != finals.len() {
        return Metrics::empty();
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;
    let mut exact = 0usize;

    for (prediction, score) in predictions.iter().zip(finals) {
        let p = prob3_from_result(prediction);
        let outcome = classify_outcome(score.home, score.away);
        let y = one_hot(outcome);
        brier_sum +=
            (p.home - y.home).powi(2) + (p.draw - y.draw).powi(2) + (p.away - y.away).powi(2);

        let actual_prob = match outcome {
            Outcome::Home => p.home,
            Outcome::Draw => p.draw,
            Outcome::Away => p.away,
        };
        log_loss_sum += -actual_prob.clamp(1e-12, 1.0).ln();

        if argmax(p) == outcome {
            correct += 1;
        }
        if prediction.predicted_score == *score {
            exact += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
        exact_score_rate: exact as f64 / n,
    }
}

fn argmax(p: Prob3) -> Outcome {
    if p.home >= p.draw && p.home >= p.away {
        Outcome::Home
    } else if p.away >= p.draw {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

fn one_hot(outcome: Outcome) -> Prob3 {
    match outcome {
        Outcome::Home => Prob3 {
            home: 1.0,
            draw: 0.0,
            away: 0.0,
        },
        Outcome::Draw => Prob3 {
            home: 0.0,
            draw: 1.0,
            away: 0.0,
        },
        Outcome::Away => Prob3 {
            home: 0.0,
            draw: 0.0,
            away: 1.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(home_win: i32, draw: i32, away_win: i32, home: u32, away: u32) -> PredictionResult {
        PredictionResult {
            home_win,
            draw,
            away_win,
            predicted_score: PredictedScore { home, away },
            confidence: 55,
            analysis: String::new(),
            key_factors: Vec::new(),
        }
    }

    #[test]
    fn certain_and_correct_predictions_have_zero_brier() {
        let preds = vec![
            result(100, 0, 0, 2, 0),
            result(0, 100, 0, 1, 1),
            result(0, 0, 100, 0, 3),
        ];
        let finals = vec![
            PredictedScore { home: 2, away: 0 },
            PredictedScore { home: 0, away: 0 },
            PredictedScore { home: 1, away: 3 },
        ];
        let m = evaluate_predictions(&preds, &finals);
        assert_eq!(m.samples, 3);
        assert!(m.brier < 1e-12);
        assert!((m.accuracy - 1.0).abs() < 1e-12);
        assert!((m.exact_score_rate - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_score_nothing() {
        let m = evaluate_predictions(&[result(40, 30, 30, 1, 1)], &[]);
        assert_eq!(m.samples, 0);
    }

    #[test]
    fn result_percentages_become_probabilities() {
        let p = prob3_from_result(&result(50, 30, 20, 1, 0));
        assert!((p.home - 0.5).abs() < 1e-12);
        assert!((p.home + p.draw + p.away - 1.0).abs() < 1e-12);

        let p = prob3_from_result(&result(0, 0, 0, 0, 0));
        assert!((p.draw - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn outcomes_from_scores() {
        assert_eq!(classify_outcome(2, 2), Outcome::Draw);
        assert_eq!(classify_outcome(0, 1), Outcome::Away);
        assert_eq!(classify_outcome(3, 1), Outcome::Home);
    }
}
