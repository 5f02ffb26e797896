//! Offense/defense distribution blending.
//!
//! A play result is drawn from a mixture of "how this offense does on this
//! play" and "what this defense allows on it":
//!
//!   mass(v) = (1 - w) * offense_mass(v) + w * defense_mass(v)
//!
//! Stored distributions are cumulative; they are turned back into point
//! masses, mixed over the union of outcome values, renormalised and summed
//! again (rounded to 6 places) before a single uniform draw picks the value.
use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;

use super::draws;
use crate::feed::types::Distribution;

/// Blended cumulative distribution over the union of outcome values.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedCdf {
    pub values: Vec<i32>,
    pub cdf: Vec<f64>,
}

impl BlendedCdf {
    /// Smallest value whose cumulative probability reaches `u`; the largest
    /// value when none does (only possible with unnormalised masses).
    pub fn sample(&self, u: f64) -> Option<i32> {
        self.values
            .iter()
            .zip(&self.cdf)
            .find(|(_, c)| u <= **c)
            .map(|(&v, _)| v)
            .or_else(|| self.values.last().copied())
    }
}

/// Point masses keyed by value. A repeated value keeps its last mass.
fn point_masses(dist: &Distribution) -> BTreeMap<i32, f64> {
    let mut masses = BTreeMap::new();
    let mut prev = 0.0;
    for (&v, &c) in dist.values.iter().zip(&dist.cdf) {
        masses.insert(v, c - prev);
        prev = c;
    }
    masses
}

/// Mixed and normalised masses over the sorted union of values.
///
/// When every mass is zero the masses are returned as-is.
pub fn blended_masses(
    offense: &Distribution,
    defense: &Distribution,
    defense_weight: f64,
) -> (Vec<i32>, Vec<f64>) {
    let off = point_masses(offense);
    let def = point_masses(defense);

    let values: Vec<i32> = off
        .keys()
        .chain(def.keys())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut masses: Vec<f64> = values
        .iter()
        .map(|v| {
            let po = off.get(v).copied().unwrap_or(0.0);
            let pd = def.get(v).copied().unwrap_or(0.0);
            (1.0 - defense_weight) * po + defense_weight * pd
        })
        .collect();

    let total: f64 = masses.iter().sum();
    if total > 0.0 {
        for m in &mut masses {
            *m /= total;
        }
    }

    (values, masses)
}

pub fn blended_cdf(offense: &Distribution, defense: &Distribution, defense_weight: f64) -> BlendedCdf {
    let (values, masses) = blended_masses(offense, defense, defense_weight);
    let mut cum = 0.0;
    let cdf = masses
        .iter()
        .map(|m| {
            cum += m;
            (cum * 1_000_000.0).round() / 1_000_000.0
        })
        .collect();
    BlendedCdf { values, cdf }
}

/// Draw one outcome value. `None` only when both distributions are empty.
pub fn blend<R: Rng + ?Sized>(
    offense: &Distribution,
    defense: &Distribution,
    defense_weight: f64,
    rng: &mut R,
) -> Option<i32> {
    let blended = blended_cdf(offense, defense, defense_weight);
    let u = draws::uniform(rng);
    blended.sample(u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::draws::ReplayDraws;

    fn dist(values: &[i32], cdf: &[f64]) -> Distribution {
        Distribution { values: values.to_vec(), cdf: cdf.to_vec() }
    }

    #[test]
    fn test_masses_sum_to_one() {
        let off = dist(&[-2, 0, 3, 8, 25], &[0.1, 0.3, 0.6, 0.9, 1.0]);
        let def = dist(&[-5, 0, 4, 8], &[0.05, 0.4, 0.8, 1.0]);
        for w in [0.0, 0.3, 0.5, 1.0] {
            let (_, masses) = blended_masses(&off, &def, w);
            let total: f64 = masses.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "w={w} total={total}");
        }
    }

    #[test]
    fn test_union_is_sorted_and_distinct() {
        let off = dist(&[5, -1, 3], &[0.2, 0.5, 1.0]);
        let def = dist(&[3, 10], &[0.5, 1.0]);
        let (values, _) = blended_masses(&off, &def, 0.3);
        assert_eq!(values, vec![-1, 3, 5, 10]);
    }

    #[test]
    fn test_weighting_favours_defense() {
        let off = dist(&[10], &[1.0]);
        let def = dist(&[2], &[1.0]);
        let (values, masses) = blended_masses(&off, &def, 0.3);
        assert_eq!(values, vec![2, 10]);
        assert!((masses[0] - 0.3).abs() < 1e-12);
        assert!((masses[1] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_cdf_rounded_to_six_places() {
        let off = dist(&[1, 2, 3], &[1.0 / 3.0, 2.0 / 3.0, 1.0]);
        let def = dist(&[1, 2, 3], &[1.0 / 3.0, 2.0 / 3.0, 1.0]);
        let blended = blended_cdf(&off, &def, 0.3);
        assert_eq!(blended.cdf, vec![0.333333, 0.666667, 1.0]);
    }

    #[test]
    fn test_sample_picks_first_value_at_or_above_draw() {
        let blended = BlendedCdf { values: vec![-3, 0, 4, 12], cdf: vec![0.1, 0.4, 0.9, 1.0] };
        assert_eq!(blended.sample(0.0), Some(-3));
        assert_eq!(blended.sample(0.1), Some(-3));
        assert_eq!(blended.sample(0.1000001), Some(0));
        assert_eq!(blended.sample(0.95), Some(12));
    }

    #[test]
    fn test_degenerate_masses_fall_back_to_last_value() {
        let off = dist(&[1, 2], &[0.0, 0.0]);
        let def = dist(&[3], &[0.0]);
        let blended = blended_cdf(&off, &def, 0.3);
        assert_eq!(blended.cdf, vec![0.0, 0.0, 0.0]);
        assert_eq!(blended.sample(0.5), Some(3));
    }

    #[test]
    fn test_empty_distributions_yield_nothing() {
        let empty = dist(&[], &[]);
        let mut rng = ReplayDraws::new(vec![0.5]);
        assert_eq!(blend(&empty, &empty, 0.3, &mut rng), None);
    }

    #[test]
    fn test_same_draws_same_outcome() {
        let off = dist(&[-4, 0, 2, 7, 15, 40], &[0.08, 0.3, 0.55, 0.8, 0.95, 1.0]);
        let def = dist(&[-6, 0, 3, 9, -2095], &[0.1, 0.35, 0.7, 0.97, 1.0]);
        let script = vec![0.02, 0.31, 0.64, 0.88, 0.999];
        let mut a = ReplayDraws::new(script.clone());
        let mut b = ReplayDraws::new(script);
        for _ in 0..5 {
            assert_eq!(blend(&off, &def, 0.3, &mut a), blend(&off, &def, 0.3, &mut b));
        }
    }

    #[test]
    fn test_interception_tail_reachable() {
        // -2095 sorts first in the union, so a tiny draw lands on it.
        let off = dist(&[0, 5], &[0.5, 1.0]);
        let def = dist(&[-2095, 5], &[0.1, 1.0]);
        let mut rng = ReplayDraws::new(vec![0.0]);
        assert_eq!(blend(&off, &def, 0.3, &mut rng), Some(-2095));
    }
}
