use std::fmt::Write as _;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::teams::{self, Team};
use super::{parse_args, schema_of, Tool};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MatchupParams {
    /// First NFL team name (e.g., 'Kansas City Chiefs')
    pub team1: String,
    /// Second NFL team name (e.g., 'Philadelphia Eagles')
    pub team2: String,
}

/// Head-to-head comparison across offense, defense and key stats
pub struct MatchupAnalyzer;

#[async_trait]
impl Tool for MatchupAnalyzer {
    fn name(&self) -> &'static str {
        "matchup_analyzer"
    }

    fn description(&self) -> &'static str {
        "Compare two NFL teams head-to-head across key categories. Returns a structured \
         breakdown of offensive, defensive, and special teams matchups."
    }

    fn parameters(&self) -> Value {
        schema_of::<MatchupParams>()
    }

    async fn invoke(&self, args: Value) -> anyhow::Result<String> {
        let params: MatchupParams = parse_args(args)?;
        Ok(analyze(&params.team1, &params.team2))
    }
}

fn analyze(team1: &str, team2: &str) -> String {
    let (t1, t2) = match (teams::lookup(team1), teams::lookup(team2)) {
        (None, _) => return missing(team1),
        (_, None) => return missing(team2),
        (Some(t1), Some(t2)) => (t1, t2),
    };

    let edge = |first_better: bool| {
        if first_better {
            format!("🔴 {}", t1.full_name)
        } else {
            format!("🟢 {}", t2.full_name)
        }
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "🏈 HEAD-TO-HEAD MATCHUP: {} vs {}",
        t1.full_name, t2.full_name
    );
    let _ = writeln!(out, "{}\n", "=".repeat(60));

    let _ = writeln!(out, "📊 OFFENSE");
    for t in [t1, t2] {
        let _ = writeln!(out, "  {}", offense_line(t));
    }
    let _ = writeln!(out, "  Edge: {}\n", edge(t1.offense_rank < t2.offense_rank));

    let _ = writeln!(out, "🛡️ DEFENSE");
    for t in [t1, t2] {
        let _ = writeln!(
            out,
            "  {}: #{} overall | {:.1} PPG allowed",
            t.full_name, t.defense_rank, t.ppg_allowed
        );
    }
    let _ = writeln!(out, "  Edge: {}\n", edge(t1.defense_rank < t2.defense_rank));

    let _ = writeln!(out, "🔑 KEY STATS");
    let _ = writeln!(
        out,
        "  Turnover Diff: {} {} | {} {}",
        t1.full_name, t1.turnover_diff, t2.full_name, t2.turnover_diff
    );
    let _ = writeln!(
        out,
        "  3rd Down: {} {} | {} {}",
        t1.full_name, t1.third_down_pct, t2.full_name, t2.third_down_pct
    );
    let _ = writeln!(
        out,
        "  Red Zone: {} {} | {} {}\n",
        t1.full_name, t1.red_zone_pct, t2.full_name, t2.red_zone_pct
    );

    let _ = writeln!(out, "💪 STRENGTHS");
    for t in [t1, t2] {
        let _ = writeln!(out, "  {}: {}", t.full_name, t.strengths.join(", "));
    }

    let _ = writeln!(out, "\n⚠️ WEAKNESSES");
    let _ = writeln!(out, "  {}: {}", t1.full_name, t1.weaknesses.join(", "));
    let _ = write!(out, "  {}: {}", t2.full_name, t2.weaknesses.join(", "));
    out
}

fn offense_line(t: &Team) -> String {
    format!(
        "{}: #{} overall | {:.1} PPG | {:.1} rush YPG | {:.1} pass YPG",
        t.full_name, t.offense_rank, t.ppg, t.rush_ypg, t.pass_ypg
    )
}

fn missing(name: &str) -> String {
    format!(
        "❌ Don't have detailed stats for '{}'. Available: {}",
        name,
        teams::available()
    )
}
