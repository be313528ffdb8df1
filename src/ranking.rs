use uuid::Uuid;

/// All recorded scores for one approved team, across every round and mentor.
#[derive(Debug, Clone)]
pub struct TeamScores {
    pub team_id: Uuid,
    pub name: String,
    pub scores: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTeam {
    pub team_id: Uuid,
    pub name: String,
    pub average_score: f64,
    pub total_score: i64,
    pub score_count: i64,
    pub rank: i64,
}

/// Computes the leaderboard from scratch. Teams without any score are left
/// out entirely rather than ranked at zero. Ordering is average descending,
/// then total descending, then name ascending; teams with identical
/// (average, total) share a rank, and the next distinct group's rank is its
/// 1-based position in the sorted list (competition ranking).
///
/// Averages are carried as integer hundredths so that the two-decimal
/// rounding the callers see is also what tie comparison uses.
pub fn rank_teams(teams: Vec<TeamScores>) -> Vec<RankedTeam> {
    let mut aggregated: Vec<(i64, i64, i64, Uuid, String)> = teams
        .into_iter()
        .filter(|team| !team.scores.is_empty())
        .map(|team| {
            let total: i64 = team.scores.iter().map(|&s| i64::from(s)).sum();
            let count = team.scores.len() as i64;
            let average_centi = ((total * 100) as f64 / count as f64).round() as i64;
            (average_centi, total, count, team.team_id, team.name)
        })
        .collect();

    aggregated.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.cmp(&a.1))
            .then_with(|| a.4.cmp(&b.4))
    });

    let mut ranked = Vec::with_capacity(aggregated.len());
    let mut current_key: Option<(i64, i64)> = None;
    let mut current_rank = 0i64;

    for (position, (average_centi, total, count, team_id, name)) in
        aggregated.into_iter().enumerate()
    {
        let key = (average_centi, total);
        if current_key != Some(key) {
            current_key = Some(key);
            current_rank = position as i64 + 1;
        }
        ranked.push(RankedTeam {
            team_id,
            name,
            average_score: average_centi as f64 / 100.0,
            total_score: total,
            score_count: count,
            rank: current_rank,
        });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str, scores: &[i32]) -> TeamScores {
        TeamScores {
            team_id: Uuid::new_v4(),
            name: name.to_string(),
            scores: scores.to_vec(),
        }
    }

    #[test]
    fn averages_across_mentors() {
        let ranked = rank_teams(vec![team("alpha", &[80, 90])]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].average_score, 85.0);
        assert_eq!(ranked[0].total_score, 170);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn single_score_round_trip() {
        let ranked = rank_teams(vec![team("solo", &[72])]);
        assert_eq!(ranked[0].average_score, 72.0);
        assert_eq!(ranked[0].total_score, 72);
    }

    #[test]
    fn unscored_teams_are_excluded() {
        let ranked = rank_teams(vec![team("scored", &[50]), team("silent", &[])]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "scored");
    }

    #[test]
    fn ties_share_rank_and_consume_slots() {
        let ranked = rank_teams(vec![
            team("bravo", &[80, 90]),
            team("alpha", &[85, 85]),
            team("charlie", &[80]),
        ]);
        assert_eq!(ranked[0].name, "alpha");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].name, "bravo");
        assert_eq!(ranked[1].rank, 1);
        assert_eq!(ranked[2].name, "charlie");
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn equal_average_different_total_breaks_tie() {
        let ranked = rank_teams(vec![team("one-round", &[85]), team("two-rounds", &[85, 85])]);
        assert_eq!(ranked[0].name, "two-rounds");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].name, "one-round");
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn equal_keys_order_by_name() {
        let ranked = rank_teams(vec![team("zeta", &[70]), team("acme", &[70])]);
        assert_eq!(ranked[0].name, "acme");
        assert_eq!(ranked[1].name, "zeta");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 1);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let build = || {
            vec![
                TeamScores {
                    team_id: Uuid::nil(),
                    name: "fixed".to_string(),
                    scores: vec![60, 70, 80],
                },
                TeamScores {
                    team_id: Uuid::max(),
                    name: "other".to_string(),
                    scores: vec![90],
                },
            ]
        };
        assert_eq!(rank_teams(build()), rank_teams(build()));
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        // 100 / 3 = 33.333... -> 33.33
        let ranked = rank_teams(vec![team("thirds", &[33, 33, 34])]);
        assert_eq!(ranked[0].average_score, 33.33);
    }
}
