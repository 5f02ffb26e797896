//! Decision chart: per-yardline coach tendencies next to the model's
//! recommended play and expected points.

use serde::Serialize;

use super::state::PlayChoice;
use crate::error::SimError;
use crate::feed::types::{ChartQuery, CoachProbs, ExpectedPoints, MAX_LOOKUP_DISTANCE};
use crate::feed::PlayData;

/// Tendency sums further than this from one are rescaled.
const NORMALIZE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub yardline: i32,
    #[serde(flatten)]
    pub probs: CoachProbs,
    pub opt_choice: PlayChoice,
    pub ep: Option<f64>,
}

impl ChartQuery {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(2..=3).contains(&self.team.chars().count()) {
            return Err(SimError::InvalidQuery("Invalid team format".to_string()));
        }
        if !(1..=4).contains(&self.down) {
            return Err(SimError::InvalidQuery("Invalid down. Must be 1-4".to_string()));
        }
        if !(1..=MAX_LOOKUP_DISTANCE).contains(&self.distance) {
            return Err(SimError::InvalidQuery("Invalid distance. Must be 1-20".to_string()));
        }
        Ok(())
    }

    /// Tendency tables only hold 10 yards to go on first down.
    fn normalized(&self) -> ChartQuery {
        let distance = if self.down == 1 { 10 } else { self.distance.clamp(1, MAX_LOOKUP_DISTANCE) };
        ChartQuery { distance, ..self.clone() }
    }
}

/// Play with the largest tendency; earlier plays win ties.
fn most_likely(probs: &CoachProbs) -> PlayChoice {
    let ordered = [
        (probs.pass_prob, PlayChoice::Pass),
        (probs.kick_prob, PlayChoice::FieldGoal),
        (probs.punt_prob, PlayChoice::Punt),
    ];
    let mut best = (probs.run_prob, PlayChoice::Run);
    for candidate in ordered {
        if candidate.0 > best.0 {
            best = candidate;
        }
    }
    best.1
}

fn normalize(probs: CoachProbs) -> CoachProbs {
    let sum = probs.run_prob + probs.pass_prob + probs.kick_prob + probs.punt_prob;
    if sum <= 0.0 || (sum - 1.0).abs() <= NORMALIZE_TOLERANCE {
        return probs;
    }
    CoachProbs {
        run_prob: probs.run_prob / sum,
        pass_prob: probs.pass_prob / sum,
        kick_prob: probs.kick_prob / sum,
        punt_prob: probs.punt_prob / sum,
    }
}

pub async fn decision_chart(data: &dyn PlayData, query: &ChartQuery) -> Result<Vec<ChartPoint>, SimError> {
    query.validate()?;
    let query = query.normalized();

    let tendencies = data.coach_probs_by_yardline(&query).await?;
    if tendencies.is_empty() {
        return Err(SimError::SituationNotFound(format!(
            "no coach decision data for {} {} {}&{}",
            query.team, query.year, query.down, query.distance
        )));
    }

    let points: Vec<ExpectedPoints> = match data.expected_points(&query).await {
        Ok(rows) => rows.into_iter().filter(|r| r.distance == query.distance).collect(),
        Err(e) => {
            tracing::warn!(error = %e, team = %query.team, "expected points unavailable, using tendencies");
            Vec::new()
        }
    };

    let chart = tendencies
        .into_iter()
        .map(|row| {
            let entry = points.iter().find(|p| p.yardline == row.yardline);
            let opt_choice = entry
                .and_then(|p| p.opt_choice)
                .and_then(|c| PlayChoice::from_action(i64::from(c) + 1))
                .unwrap_or_else(|| most_likely(&row.probs));
            ChartPoint {
                yardline: row.yardline,
                probs: normalize(row.probs),
                opt_choice,
                ep: entry.and_then(|p| p.ep),
            }
        })
        .collect();
    Ok(chart)
}

pub async fn expected_points(data: &dyn PlayData, query: &ChartQuery) -> Result<Vec<ExpectedPoints>, SimError> {
    query.validate()?;
    data.expected_points(query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::snapshot::{Snapshot, SnapshotStore};

    fn probs(run: f64, pass: f64, kick: f64, punt: f64) -> CoachProbs {
        CoachProbs { run_prob: run, pass_prob: pass, kick_prob: kick, punt_prob: punt }
    }

    fn query(down: i32, distance: i32) -> ChartQuery {
        ChartQuery { team: "PHI".to_string(), year: 2022, is_defense: false, down, distance }
    }

    fn store() -> SnapshotStore {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
            "coach_decision_probs": [
                {"team": "PHI", "year": 2022, "down": 4, "distance": 3, "yardline": 30,
                 "is_defense": false, "run_prob": 0.2, "pass_prob": 0.2,
                 "kick_prob": 0.6, "punt_prob": 0.0},
                {"team": "PHI", "year": 2022, "down": 4, "distance": 3, "yardline": 70,
                 "is_defense": false, "run_prob": 0.1, "pass_prob": 0.1,
                 "kick_prob": 0.0, "punt_prob": 1.8},
                {"team": "PHI", "year": 2022, "down": 1, "distance": 10, "yardline": 75,
                 "is_defense": false, "run_prob": 0.5, "pass_prob": 0.5,
                 "kick_prob": 0.0, "punt_prob": 0.0}
            ],
            "expected_points": [
                {"team": "PHI", "year": 2022, "is_defense": false, "down": 4,
                 "distance": 3, "yardline": 30, "ep": 2.1, "opt_choice": 0}
            ]
        }"#,
        )
        .unwrap();
        SnapshotStore::new(snapshot)
    }

    #[test]
    fn test_most_likely_prefers_earlier_on_tie() {
        assert_eq!(most_likely(&probs(0.4, 0.4, 0.1, 0.1)), PlayChoice::Run);
        assert_eq!(most_likely(&probs(0.1, 0.2, 0.2, 0.5)), PlayChoice::Punt);
    }

    #[test]
    fn test_normalize_only_when_off() {
        assert_eq!(normalize(probs(0.5, 0.495, 0.0, 0.0)), probs(0.5, 0.495, 0.0, 0.0));
        let n = normalize(probs(1.0, 1.0, 0.0, 0.0));
        assert_eq!(n.run_prob, 0.5);
        assert_eq!(n.pass_prob, 0.5);
    }

    #[test]
    fn test_validation_messages() {
        let mut q = query(2, 5);
        q.team = "PHIL".to_string();
        assert!(matches!(q.validate(), Err(SimError::InvalidQuery(m)) if m == "Invalid team format"));
        assert!(query(5, 5).validate().is_err());
        assert!(query(2, 0).validate().is_err());
        assert!(query(2, 21).validate().is_err());
        assert!(query(2, 20).validate().is_ok());
    }

    #[tokio::test]
    async fn test_chart_merges_model_choice_and_falls_back() {
        let chart = decision_chart(&store(), &query(4, 3)).await.unwrap();
        assert_eq!(chart.len(), 2);

        assert_eq!(chart[0].yardline, 30);
        assert_eq!(chart[0].opt_choice, PlayChoice::Run);
        assert_eq!(chart[0].ep, Some(2.1));

        assert_eq!(chart[1].yardline, 70);
        assert_eq!(chart[1].opt_choice, PlayChoice::Punt);
        assert_eq!(chart[1].ep, None);
        assert!((chart[1].probs.punt_prob - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_first_down_uses_ten_yards() {
        let chart = decision_chart(&store(), &query(1, 4)).await.unwrap();
        assert_eq!(chart.len(), 1);
        assert_eq!(chart[0].yardline, 75);
    }

    #[tokio::test]
    async fn test_empty_chart_is_not_found() {
        let err = decision_chart(&store(), &query(3, 7)).await.unwrap_err();
        assert!(matches!(err, SimError::SituationNotFound(_)));
    }
}
