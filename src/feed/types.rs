use serde::{Deserialize, Deserializer, Serialize};

/// Lookups cap distance at this many yards.
pub const MAX_LOOKUP_DISTANCE: i32 = 20;

/// Coach tendency row (`coach_decision_probs`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CoachProbs {
    pub run_prob: f64,
    pub pass_prob: f64,
    pub kick_prob: f64,
    pub punt_prob: f64,
}

/// Empirical cumulative distribution (`play_cdf`), parallel arrays.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Distribution {
    #[serde(deserialize_with = "whole_yards")]
    pub values: Vec<i32>,
    pub cdf: Vec<f64>,
}

impl Distribution {
    /// Shape check shared by every store.
    pub fn validate(&self) -> Result<(), String> {
        if self.values.len() != self.cdf.len() {
            return Err(format!(
                "values/cdf length mismatch ({} vs {})",
                self.values.len(),
                self.cdf.len()
            ));
        }
        if self.values.is_empty() {
            return Err("empty distribution".to_string());
        }
        Ok(())
    }
}

/// Outcome values are whole yards, but some exports write them as floats.
pub fn whole_yards<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i32>, D::Error> {
    let raw = Vec::<f64>::deserialize(d)?;
    Ok(raw.into_iter().map(|v| v.round() as i32).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayType {
    Rush,
    Pass,
}

impl PlayType {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayType::Rush => "rush",
            PlayType::Pass => "pass",
        }
    }
}

/// Key for a coach tendency lookup. `distance` is already capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachKey {
    pub team: String,
    pub year: i32,
    pub down: i32,
    pub distance: i32,
    pub yardline: i32,
    pub is_defense: bool,
}

/// Key for an outcome distribution lookup. `distance` is already capped and
/// `yardline_bin` already bucketed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionKey {
    pub team: String,
    pub year: i32,
    pub down: i32,
    pub distance: i32,
    pub yardline_bin: String,
    pub is_defense: bool,
    pub play_type: PlayType,
}

impl std::fmt::Display for DistributionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}&{} at {} ({})",
            self.team,
            self.year,
            self.play_type.as_str(),
            self.down,
            self.distance,
            self.yardline_bin,
            if self.is_defense { "defense" } else { "offense" }
        )
    }
}

pub fn capped_distance(distance: i32) -> i32 {
    distance.min(MAX_LOOKUP_DISTANCE)
}

/// Field-position bucket used by `play_cdf`.
///
/// Exact yardline for 1-20, fixed bins from 21 to 99, midfield for anything
/// else.
pub fn yardline_bin(loc: i32) -> String {
    let bin = match loc {
        1..=20 => return loc.to_string(),
        21..=23 => "21-23",
        24..=27 => "24-27",
        28..=32 => "28-32",
        33..=38 => "33-38",
        39..=44 => "39-44",
        45..=50 => "45-50",
        51..=70 => "51-70",
        71..=85 => "71-85",
        86..=99 => "86-99",
        _ => {
            tracing::warn!(yardline = loc, "unexpected yardline, using midfield bin");
            "45-50"
        }
    };
    bin.to_string()
}

/// Decision chart request. Field names follow the client's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartQuery {
    pub team: String,
    pub year: i32,
    #[serde(rename = "isDefense")]
    pub is_defense: bool,
    pub down: i32,
    pub distance: i32,
}

/// Tendency row for one yardline of a chart situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YardlineProbs {
    pub yardline: i32,
    #[serde(flatten)]
    pub probs: CoachProbs,
}

/// `expected_points` row. `opt_choice` is stored 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedPoints {
    pub yardline: i32,
    pub distance: i32,
    pub ep: Option<f64>,
    #[serde(default)]
    pub opt_choice: Option<i32>,
}

/// Situational features sent to the strategy model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Situation {
    pub down: i32,
    pub distance: i32,
    pub loc: i32,
    pub time: i32,
    pub score_diff: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yardline_bin_exact_near_goal() {
        assert_eq!(yardline_bin(1), "1");
        assert_eq!(yardline_bin(20), "20");
    }

    #[test]
    fn test_yardline_bin_ranges() {
        assert_eq!(yardline_bin(21), "21-23");
        assert_eq!(yardline_bin(27), "24-27");
        assert_eq!(yardline_bin(28), "28-32");
        assert_eq!(yardline_bin(38), "33-38");
        assert_eq!(yardline_bin(44), "39-44");
        assert_eq!(yardline_bin(50), "45-50");
        assert_eq!(yardline_bin(66), "51-70");
        assert_eq!(yardline_bin(85), "71-85");
        assert_eq!(yardline_bin(99), "86-99");
    }

    #[test]
    fn test_yardline_bin_out_of_range_is_midfield() {
        assert_eq!(yardline_bin(0), "45-50");
        assert_eq!(yardline_bin(100), "45-50");
        assert_eq!(yardline_bin(-7), "45-50");
    }

    #[test]
    fn test_distance_capped_at_twenty() {
        assert_eq!(capped_distance(35), 20);
        assert_eq!(capped_distance(7), 7);
    }

    #[test]
    fn test_distribution_accepts_float_yards() {
        let d: Distribution =
            serde_json::from_str(r#"{"values": [-2.0, 0, 5.0], "cdf": [0.2, 0.5, 1.0]}"#).unwrap();
        assert_eq!(d.values, vec![-2, 0, 5]);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_distribution_shape_mismatch_rejected() {
        let d = Distribution { values: vec![1, 2], cdf: vec![1.0] };
        assert!(d.validate().is_err());
    }
}
