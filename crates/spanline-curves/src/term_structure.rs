//! Core term structure trait.
//!
//! Instruments price themselves against a [`TermStructure`] when the
//! repricing report recomputes their measures. The trait only asks for
//! discount factors (and survival probabilities for credit curves); the
//! rate helpers are derived from them.
//!
//! All term structures are `Send + Sync`, so a finished curve can be read
//! from several threads at once.

use spanline_core::Date;

use crate::config::LatentState;
use crate::error::{CurveError, CurveResult};

/// Read access to a finished curve.
pub trait TermStructure: Send + Sync {
    /// Returns the curve's reference (epoch) date.
    fn reference_date(&self) -> Date;

    /// Returns what the curve's spline models.
    fn latent_state(&self) -> LatentState;

    /// Returns the last calibrated date.
    fn max_date(&self) -> Date;

    /// Discount factor `P(date)`.
    fn discount_factor(&self, date: Date) -> CurveResult<f64>;

    /// Survival probability `Q(date)`.
    ///
    /// Only credit curves implement this.
    fn survival_probability(&self, _date: Date) -> CurveResult<f64> {
        Err(CurveError::incompatible_state(
            "survival probability",
            self.latent_state(),
        ))
    }

    // ========================================================================
    // Default implementations
    // ========================================================================

    /// ACT/365F year fraction from the reference date.
    fn date_to_tenor(&self, date: Date) -> f64 {
        self.reference_date().year_fraction(&date)
    }

    /// Continuously compounded zero rate to `date`.
    fn zero_rate(&self, date: Date) -> CurveResult<f64> {
        let t = self.date_to_tenor(date);
        if t <= 0.0 {
            return Err(CurveError::invalid_value(format!(
                "zero rate undefined at the reference date {date}"
            )));
        }
        let df = self.discount_factor(date)?;
        positive_log(df, "discount factor").map(|log_df| -log_df / t)
    }

    /// Continuously compounded rate implied between two dates.
    fn implied_rate(&self, start: Date, end: Date) -> CurveResult<f64> {
        let tau = start.year_fraction(&end);
        if tau <= 0.0 {
            return Err(CurveError::invalid_value(format!(
                "implied rate needs start {start} before end {end}"
            )));
        }
        let start_df = positive_log(self.discount_factor(start)?, "discount factor")?;
        let end_df = positive_log(self.discount_factor(end)?, "discount factor")?;
        Ok((start_df - end_df) / tau)
    }

    /// Simply compounded forward rate between two dates.
    fn simple_forward_rate(&self, start: Date, end: Date) -> CurveResult<f64> {
        let tau = start.year_fraction(&end);
        if tau <= 0.0 {
            return Err(CurveError::invalid_value(format!(
                "forward rate needs start {start} before end {end}"
            )));
        }
        let start_df = self.discount_factor(start)?;
        let end_df = self.discount_factor(end)?;
        if end_df <= 0.0 {
            return Err(CurveError::invalid_value(format!(
                "non-positive discount factor {end_df} at {end}"
            )));
        }
        Ok((start_df / end_df - 1.0) / tau)
    }

    /// Returns true if `date` lies within `[reference_date, max_date]`.
    fn in_range(&self, date: Date) -> bool {
        date >= self.reference_date() && date <= self.max_date()
    }
}

/// `ln(value)` for a strictly positive value.
pub(crate) fn positive_log(value: f64, what: &str) -> CurveResult<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value.ln())
    } else {
        Err(CurveError::invalid_value(format!(
            "log of non-positive {what} {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FlatCurve {
        reference: Date,
        rate: f64,
    }

    impl TermStructure for FlatCurve {
        fn reference_date(&self) -> Date {
            self.reference
        }

        fn latent_state(&self) -> LatentState {
            LatentState::DiscountFactor
        }

        fn max_date(&self) -> Date {
            self.reference.add_days(3650)
        }

        fn discount_factor(&self, date: Date) -> CurveResult<f64> {
            Ok((-self.rate * self.date_to_tenor(date)).exp())
        }
    }

    fn curve() -> FlatCurve {
        FlatCurve {
            reference: Date::from_ymd(2025, 1, 2).unwrap(),
            rate: 0.04,
        }
    }

    #[test]
    fn test_derived_rates() {
        let curve = curve();
        let one_year = curve.reference.add_days(365);
        let two_years = curve.reference.add_days(730);
        assert_relative_eq!(curve.zero_rate(one_year).unwrap(), 0.04, epsilon = 1e-14);
        assert_relative_eq!(
            curve.implied_rate(one_year, two_years).unwrap(),
            0.04,
            epsilon = 1e-13
        );
        assert_relative_eq!(
            curve.simple_forward_rate(one_year, two_years).unwrap(),
            0.04_f64.exp() - 1.0,
            epsilon = 1e-13
        );
    }

    #[test]
    fn test_degenerate_inputs() {
        let curve = curve();
        assert!(curve.zero_rate(curve.reference).is_err());
        assert!(curve
            .implied_rate(curve.reference.add_days(10), curve.reference)
            .is_err());
        assert!(curve.survival_probability(curve.reference).is_err());
        assert!(curve.in_range(curve.reference.add_days(100)));
        assert!(!curve.in_range(curve.reference.add_days(-1)));
    }

    #[test]
    fn test_positive_log() {
        assert!(positive_log(0.0, "df").is_err());
        assert!(positive_log(f64::NAN, "df").is_err());
        assert_relative_eq!(positive_log(1.0, "df").unwrap(), 0.0);
    }
}
