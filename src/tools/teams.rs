//! Static NFL team data shared by the matchup and prediction tools

pub(crate) struct Ratings {
    pub overall: u32,
    pub offense: u32,
    pub defense: u32,
    pub coaching: u32,
    pub playoff_exp: u32,
    pub clutch: u32,
    pub momentum: u32,
    pub qb_factor: u32,
}

pub(crate) struct Team {
    pub key: &'static str,
    pub full_name: &'static str,
    pub offense_rank: u32,
    pub defense_rank: u32,
    pub ppg: f64,
    pub ppg_allowed: f64,
    pub rush_ypg: f64,
    pub pass_ypg: f64,
    pub turnover_diff: &'static str,
    pub third_down_pct: &'static str,
    pub red_zone_pct: &'static str,
    pub strengths: &'static [&'static str],
    pub weaknesses: &'static [&'static str],
    pub ratings: Ratings,
}

pub(crate) static TEAMS: &[Team] = &[
    Team {
        key: "chiefs",
        full_name: "Kansas City Chiefs",
        offense_rank: 7,
        defense_rank: 8,
        ppg: 25.4,
        ppg_allowed: 19.2,
        rush_ypg: 118.5,
        pass_ypg: 245.3,
        turnover_diff: "+9",
        third_down_pct: "43.2%",
        red_zone_pct: "61.5%",
        strengths: &["QB play (Mahomes)", "Playoff experience", "Coaching", "Late-game execution"],
        weaknesses: &["WR depth", "Offensive line consistency"],
        ratings: Ratings {
            overall: 92,
            offense: 87,
            defense: 88,
            coaching: 98,
            playoff_exp: 99,
            clutch: 97,
            momentum: 85,
            qb_factor: 99,
        },
    },
    Team {
        key: "eagles",
        full_name: "Philadelphia Eagles",
        offense_rank: 3,
        defense_rank: 5,
        ppg: 27.8,
        ppg_allowed: 18.6,
        rush_ypg: 162.3,
        pass_ypg: 218.7,
        turnover_diff: "+12",
        third_down_pct: "45.1%",
        red_zone_pct: "65.8%",
        strengths: &[
            "Dominant run game (Barkley)",
            "Defensive line",
            "Turnover creation",
            "Red zone efficiency",
        ],
        weaknesses: &["Pass defense vs elite QBs", "Playoff composure"],
        ratings: Ratings {
            overall: 91,
            offense: 92,
            defense: 89,
            coaching: 88,
            playoff_exp: 80,
            clutch: 82,
            momentum: 90,
            qb_factor: 85,
        },
    },
    Team {
        key: "lions",
        full_name: "Detroit Lions",
        offense_rank: 1,
        defense_rank: 15,
        ppg: 30.1,
        ppg_allowed: 22.1,
        rush_ypg: 145.2,
        pass_ypg: 262.8,
        turnover_diff: "+6",
        third_down_pct: "47.3%",
        red_zone_pct: "68.2%",
        strengths: &["Explosive offense", "Offensive line", "Goff efficiency", "Play-action game"],
        weaknesses: &["Defensive secondary", "Injury depth"],
        ratings: Ratings {
            overall: 89,
            offense: 95,
            defense: 78,
            coaching: 90,
            playoff_exp: 65,
            clutch: 75,
            momentum: 93,
            qb_factor: 86,
        },
    },
    Team {
        key: "bills",
        full_name: "Buffalo Bills",
        offense_rank: 2,
        defense_rank: 10,
        ppg: 28.9,
        ppg_allowed: 20.5,
        rush_ypg: 135.1,
        pass_ypg: 250.4,
        turnover_diff: "+7",
        third_down_pct: "44.8%",
        red_zone_pct: "63.1%",
        strengths: &["Josh Allen dual-threat", "Big-play ability", "Home-field advantage"],
        weaknesses: &["Playoff history", "Defensive consistency"],
        ratings: Ratings {
            overall: 90,
            offense: 91,
            defense: 83,
            coaching: 85,
            playoff_exp: 75,
            clutch: 78,
            momentum: 88,
            qb_factor: 94,
        },
    },
    Team {
        key: "49ers",
        full_name: "San Francisco 49ers",
        offense_rank: 5,
        defense_rank: 3,
        ppg: 26.5,
        ppg_allowed: 17.8,
        rush_ypg: 140.7,
        pass_ypg: 230.1,
        turnover_diff: "+8",
        third_down_pct: "42.9%",
        red_zone_pct: "59.4%",
        strengths: &["Scheme versatility", "Defensive front", "Run game", "Coaching"],
        weaknesses: &["QB durability", "Super Bowl heartbreak"],
        ratings: Ratings {
            overall: 89,
            offense: 88,
            defense: 91,
            coaching: 92,
            playoff_exp: 85,
            clutch: 80,
            momentum: 82,
            qb_factor: 80,
        },
    },
    Team {
        key: "ravens",
        full_name: "Baltimore Ravens",
        offense_rank: 4,
        defense_rank: 6,
        ppg: 27.1,
        ppg_allowed: 19.0,
        rush_ypg: 175.6,
        pass_ypg: 198.4,
        turnover_diff: "+5",
        third_down_pct: "41.8%",
        red_zone_pct: "62.3%",
        strengths: &["Lamar Jackson running", "Ground game dominance", "Defense"],
        weaknesses: &["Passing in playoffs", "WR corps"],
        ratings: Ratings {
            overall: 90,
            offense: 89,
            defense: 87,
            coaching: 88,
            playoff_exp: 72,
            clutch: 75,
            momentum: 86,
            qb_factor: 92,
        },
    },
];

/// Find a team by nickname or full name appearing anywhere in `name`
pub(crate) fn lookup(name: &str) -> Option<&'static Team> {
    let name = name.trim().to_lowercase();
    TEAMS.iter().find(|team| {
        name == team.key
            || name.contains(team.key)
            || name.contains(&team.full_name.to_lowercase())
    })
}

/// Comma separated list of every known team
pub(crate) fn available() -> String {
    TEAMS
        .iter()
        .map(|t| t.full_name)
        .collect::<Vec<_>>()
        .join(", ")
}
