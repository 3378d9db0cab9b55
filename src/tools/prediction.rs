use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::teams::{self, Ratings};
use super::{parse_args, schema_of, Tool};

fn default_context() -> String {
    "regular".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PredictionParams {
    /// First NFL team name
    pub team1: String,
    /// Second NFL team name
    pub team2: String,
    /// Game context: 'regular', 'playoff', or 'superbowl'
    #[serde(default = "default_context")]
    pub context: String,
}

pub struct PredictWinner;

#[async_trait]
impl Tool for PredictWinner {
    fn name(&self) -> &'static str {
        "predict_winner"
    }

    fn description(&self) -> &'static str {
        "Make a fun, data-driven prediction for an NFL matchup. Uses weighted factors \
         like offense, defense, experience, and momentum."
    }

    fn parameters(&self) -> Value {
        schema_of::<PredictionParams>()
    }

    async fn invoke(&self, args: Value) -> anyhow::Result<String> {
        let params: PredictionParams = parse_args(args)?;
        Ok(predict(&params.team1, &params.team2, &params.context))
    }
}

/// Factor weights in `Ratings` field order
fn weights(context: &str) -> [f64; 8] {
    match context {
        "superbowl" => [0.15, 0.15, 0.15, 0.15, 0.20, 0.10, 0.05, 0.05],
        "playoff" => [0.15, 0.15, 0.15, 0.15, 0.15, 0.10, 0.05, 0.10],
        _ => [0.20, 0.20, 0.20, 0.10, 0.05, 0.05, 0.10, 0.10],
    }
}

fn composite(r: &Ratings, weights: &[f64; 8]) -> f64 {
    let factors = [
        r.overall,
        r.offense,
        r.defense,
        r.coaching,
        r.playoff_exp,
        r.clutch,
        r.momentum,
        r.qb_factor,
    ];
    factors
        .iter()
        .zip(weights)
        .map(|(f, w)| f64::from(*f) * w)
        .sum()
}

/// Deterministic base score in 17..=30 for a pairing and context
fn base_score(key1: &str, key2: &str, context: &str) -> u32 {
    let digest = Sha256::digest(format!("{}{}{}", key1, key2, context).as_bytes());
    u32::from(digest[0]) % 14 + 17
}

fn predict(team1: &str, team2: &str, context: &str) -> String {
    let (t1, t2) = match (teams::lookup(team1), teams::lookup(team2)) {
        (None, _) => return missing(team1),
        (_, None) => return missing(team2),
        (Some(t1), Some(t2)) => (t1, t2),
    };

    let weights = weights(context);
    let score1 = composite(&t1.ratings, &weights);
    let score2 = composite(&t2.ratings, &weights);
    let diff = (score1 - score2).abs();
    let (winner, loser) = if score1 > score2 { (t1, t2) } else { (t2, t1) };

    let (confidence, verdict) = if diff > 5.0 {
        ("HIGH 🔥", format!("{} should handle this one", winner.full_name))
    } else if diff > 2.0 {
        (
            "MEDIUM 🤔",
            format!(
                "{} has the edge, but don't sleep on {}",
                winner.full_name, loser.full_name
            ),
        )
    } else {
        ("COIN FLIP 😬", "This is anybody's game, buckle up".to_string())
    };

    let loser_score = base_score(t1.key, t2.key, context);
    let winner_score = loser_score + diff as u32;

    let label = match context {
        "superbowl" => "🏆 SUPER BOWL",
        "playoff" => "🏈 PLAYOFF",
        _ => "📺 REGULAR SEASON",
    };

    let (r1, r2) = (&t1.ratings, &t2.ratings);
    let (n1, n2) = (t1.full_name, t2.full_name);
    let factor = |label: &str, a: u32, b: u32| format!("  {:<14}{} {} | {} {}\n", label, n1, a, n2, b);

    let mut out = format!("{} PREDICTION: {} vs {}\n{}\n\n", label, n1, n2, "=".repeat(55));
    out.push_str(&format!(
        "📊 COMPOSITE RATINGS (weighted for {} context):\n  {}: {:.1}\n  {}: {:.1}\n\n",
        context, n1, score1, n2, score2
    ));
    out.push_str("🔍 FACTOR BREAKDOWN:\n");
    out.push_str(&factor("Offense:", r1.offense, r2.offense));
    out.push_str(&factor("Defense:", r1.defense, r2.defense));
    out.push_str(&factor("Coaching:", r1.coaching, r2.coaching));
    out.push_str(&factor("Playoff Exp:", r1.playoff_exp, r2.playoff_exp));
    out.push_str(&factor("Clutch:", r1.clutch, r2.clutch));
    out.push_str(&factor("QB Factor:", r1.qb_factor, r2.qb_factor));
    out.push_str(&format!(
        "\n🎯 PREDICTION:\n  Winner: {}\n  Confidence: {}\n  Projected Score: {} {} - {} {}\n\n💬 THE TAKE: {}",
        winner.full_name,
        confidence,
        winner.full_name,
        winner_score,
        loser.full_name,
        loser_score,
        verdict
    ));
    out
}

fn missing(name: &str) -> String {
    format!("❌ No ratings for '{}'. Available: {}", name, teams::available())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_is_deterministic() {
        let first = predict("Chiefs", "Lions", "superbowl");
        let second = predict("Kansas City Chiefs", "Detroit Lions", "superbowl");
        assert_eq!(first, second);
        assert!(first.starts_with("🏆 SUPER BOWL PREDICTION: Kansas City Chiefs vs Detroit Lions"));
        assert!(first.contains("Winner: Kansas City Chiefs"));
    }

    #[test]
    fn test_weights_sum_to_one() {
        for context in ["regular", "playoff", "superbowl"] {
            let total: f64 = weights(context).iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "{}", context);
        }
    }

    #[test]
    fn test_base_score_range() {
        for (a, b) in [("chiefs", "eagles"), ("bills", "ravens"), ("49ers", "lions")] {
            let score = base_score(a, b, "regular");
            assert!((17..=30).contains(&score));
        }
    }

    #[test]
    fn test_unknown_context_uses_regular_label() {
        let out = predict("Bills", "Ravens", "preseason");
        assert!(out.starts_with("📺 REGULAR SEASON PREDICTION"));
    }

    #[test]
    fn test_unknown_team() {
        assert!(predict("Bills", "Jets", "regular").starts_with("❌ No ratings for 'Jets'"));
    }
}
