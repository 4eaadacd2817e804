//! Combines F1, F2 and F3 into the final index and its rating.

use crate::analysis::subindex::SubIndices;
use crate::model::Rating;

/// A composed index value with the factors it was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wqi {
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub value: f64,
    pub rating: Rating,
}

/// `WQI = 100 - sqrt((F1² + F2² + F3²) / 3)`.
///
/// Returns `None` unless all three factors are defined and finite.
pub fn compose(factors: &SubIndices) -> Option<Wqi> {
    let (f1, f2, f3) = (factors.f1?, factors.f2?, factors.f3?);
    if ![f1, f2, f3].iter().all(|f| f.is_finite()) {
        return None;
    }
    let value = 100.0 - ((f1 * f1 + f2 * f2 + f3 * f3) / 3.0).sqrt();
    Some(Wqi {
        f1,
        f2,
        f3,
        value,
        rating: Rating::from_wqi(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(f1: f64, f2: f64, f3: f64) -> SubIndices {
        SubIndices { f1: Some(f1), f2: Some(f2), f3: Some(f3) }
    }

    #[test]
    fn test_perfect_period_scores_100_rated_a() {
        let wqi = compose(&factors(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(wqi.value, 100.0);
        assert_eq!(wqi.rating, Rating::A);
    }

    #[test]
    fn test_worst_defined_factors_stay_non_negative() {
        // F3 is bounded below 100, so even F1 = F2 = 100 keeps WQI above 0.
        let wqi = compose(&factors(100.0, 100.0, 99.99)).unwrap();
        assert!(wqi.value > 0.0 && wqi.value < 1.0, "got {}", wqi.value);
        assert_eq!(wqi.rating, Rating::E);
    }

    #[test]
    fn test_known_value() {
        // sqrt((50² + 20² + 10²) / 3) = sqrt(1000) ≈ 31.62
        let wqi = compose(&factors(50.0, 20.0, 10.0)).unwrap();
        assert!((wqi.value - (100.0 - 1000f64.sqrt())).abs() < 1e-9);
        assert_eq!(wqi.rating, Rating::C);
        assert_eq!((wqi.f1, wqi.f2, wqi.f3), (50.0, 20.0, 10.0));
    }

    #[test]
    fn test_non_finite_factor_yields_no_score() {
        assert!(compose(&factors(100.0, 100.0, f64::NAN)).is_none());
        assert!(compose(&factors(f64::INFINITY, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_missing_factor_yields_no_score() {
        let missing = SubIndices { f1: Some(0.0), f2: None, f3: Some(0.0) };
        assert!(compose(&missing).is_none());
    }
}
