//! Integration test: span calibration of rate and credit curves.
//!
//! Builds curves from a synthetic USD market and checks repricing, scenario
//! bumps and quote Jacobians against finite differences.
//!
//! Market Data: January 2, 2025
//!
//! | Stretch | Instrument | Tenor  | Quote   |
//! |---------|------------|--------|---------|
//! | cash    | Deposit    | 1M     | 4.30%   |
//! | cash    | Deposit    | 3M     | 4.35%   |
//! | cash    | Deposit    | 6M     | 4.38%   |
//! | cash    | Deposit    | 12M    | 4.25%   |
//! | cash    | Deposit    | 18M    | 4.10%   |
//! | swaps   | Swap (1Y)  | 2Y     | 4.05%   |
//! | swaps   | Swap (1Y)  | 3Y     | 3.98%   |
//! | swaps   | Swap (1Y)  | 5Y     | 3.95%   |
//! | credit  | CDS point  | 1Y     | 100bp   |
//! | credit  | CDS point  | 3Y     | 120bp   |
//! | credit  | CDS point  | 5Y     | 150bp   |
//! | credit  | CDS point  | 7Y     | 160bp   |

use approx::assert_relative_eq;
use proptest::prelude::*;
use spanline_core::{Currency, Date, Frequency};
use spanline_curves::prelude::*;
use spanline_math::spline::{BoundaryCondition, CalibrationDetail};

fn spot() -> Date {
    Date::from_ymd(2025, 1, 2).unwrap()
}

fn context() -> ValuationContext {
    ValuationContext::new(spot(), Currency::USD)
}

fn deposit_months(months: i32) -> Deposit {
    Deposit::new(format!("DEP-{months}M"), spot(), spot().add_months(months).unwrap()).unwrap()
}

fn usd_specs() -> Vec<StretchSpec> {
    let cash = StretchSpec::new("cash")
        .with_instrument(deposit_months(1), 0.0430)
        .with_instrument(deposit_months(3), 0.0435)
        .with_instrument(deposit_months(6), 0.0438)
        .with_instrument(deposit_months(12), 0.0425)
        .with_instrument(deposit_months(18), 0.0410);
    let swaps = StretchSpec::new("swaps")
        .with_instrument(Swap::regular("SWP-2Y", spot(), 2, Frequency::Annual).unwrap(), 0.0405)
        .with_instrument(Swap::regular("SWP-3Y", spot(), 3, Frequency::Annual).unwrap(), 0.0398)
        .with_instrument(Swap::regular("SWP-5Y", spot(), 5, Frequency::Annual).unwrap(), 0.0395);
    vec![cash, swaps]
}

fn usd_curve() -> CalibratedCurve {
    CalibratedCurve::calibrate(CurveConfig::default().with_name("USD"), context(), usd_specs())
        .unwrap()
}

/// Central ±1bp differences of `value` against the analytic Jacobian.
fn assert_matches_finite_differences<V, J>(curve: &CalibratedCurve, dates: &[Date], value: V, jacobian: J)
where
    V: Fn(&CalibratedCurve, Date) -> f64,
    J: Fn(&CalibratedCurve, Date) -> QuoteJacobian,
{
    for id in curve.instrument_ids() {
        let up = curve.bumped(&CurveBump::quote(&id, 1.0)).unwrap();
        let down = curve.bumped(&CurveBump::quote(&id, -1.0)).unwrap();
        for &date in dates {
            let fd = (value(&up, date) - value(&down, date)) / 2e-4;
            let analytic = jacobian(curve, date).get(&id).unwrap();
            assert!(
                (analytic - fd).abs() <= 1e-2 * fd.abs() + 1e-7,
                "{id} at {date}: analytic {analytic} vs finite difference {fd}"
            );
        }
    }
}

// =============================================================================
// Bootstrap scenarios
// =============================================================================

#[test]
fn test_overnight_deposit_discount_factor() {
    let r = 0.0525;
    let on = Deposit::from_days("DEP-ON", spot(), 1)
        .unwrap()
        .with_compounding(Compounding::Continuous);
    let week = Deposit::from_days("DEP-1W", spot(), 7)
        .unwrap()
        .with_compounding(Compounding::Continuous);
    let spec = StretchSpec::new("overnight")
        .with_instrument(on, r)
        .with_instrument(week, r);

    let curve = CalibratedCurve::calibrate(CurveConfig::default(), context(), vec![spec]).unwrap();
    let df = curve.discount_factor(spot().add_days(1)).unwrap();
    assert_relative_eq!(df, (-r / 365.0_f64).exp(), epsilon = 1e-8);
}

#[test]
fn test_round_trip_repricing() {
    let curve = usd_curve();
    let report = curve.repricing_report().unwrap();
    assert!(report.is_valid(), "{report}");
    assert_eq!(report.checks().len(), 8);
    assert!(report.max_error() < 1e-10);

    // cross-stretch continuity of the response
    let edge = spot().add_months(18).unwrap();
    let swaps = curve.span().stretch("swaps").unwrap().stretch();
    assert_eq!(swaps.left(), edge.ordinate());
    assert_relative_eq!(
        swaps.response_value(edge.ordinate()).unwrap(),
        curve.discount_factor(edge).unwrap(),
        epsilon = 1e-14
    );
}

#[test]
fn test_rate_curves_with_fras_reprice() {
    for state in [LatentState::DiscountFactor, LatentState::ZeroRate, LatentState::ForwardRate] {
        let cash = StretchSpec::new("cash")
            .with_instrument(deposit_months(1), 0.0430)
            .with_instrument(deposit_months(3), 0.0435)
            .with_instrument(deposit_months(6), 0.0438);
        let fras = StretchSpec::new("fras")
            .with_instrument(Fra::from_months("FRA-6X9", spot(), 6, 9).unwrap(), 0.0420)
            .with_instrument(Fra::from_months("FRA-9X12", spot(), 9, 12).unwrap(), 0.0405);
        let mut config = CurveConfig::new(state).with_boundary(BoundaryCondition::Financial);
        if state.natural_epoch_response().is_none() {
            config = config.with_epoch_response(0.043);
        }
        let curve = CalibratedCurve::calibrate(config, context(), vec![cash, fras]).unwrap();
        let report = curve.repricing_report().unwrap();
        assert!(report.is_valid(), "{state}: {report}");
    }
}

#[test]
fn test_parallel_shift_moves_zero_rates_by_one_bp() {
    // continuous deposits: zero rates at the nodes equal the quotes
    let dep = |days: i64| {
        Deposit::from_days(format!("DEP-{days}D"), spot(), days)
            .unwrap()
            .with_compounding(Compounding::Continuous)
    };
    let spec = StretchSpec::new("cash")
        .with_instrument(dep(30), 0.041)
        .with_instrument(dep(91), 0.042)
        .with_instrument(dep(182), 0.044)
        .with_instrument(dep(365), 0.043);
    let curve = CalibratedCurve::calibrate(CurveConfig::default(), context(), vec![spec]).unwrap();
    let bumped = curve.bumped(&CurveBump::parallel(1.0)).unwrap();
    for days in [30, 91, 182, 365] {
        let date = spot().add_days(days);
        let shift = bumped.zero_rate(date).unwrap() - curve.zero_rate(date).unwrap();
        assert_relative_eq!(shift, 1e-4, max_relative = 1e-3);
    }
}

#[test]
fn test_parallel_shift_of_swap_curve() {
    let cash = StretchSpec::new("cash")
        .with_instrument(deposit_months(3), 0.04)
        .with_instrument(deposit_months(6), 0.04);
    let mut swaps = StretchSpec::new("swaps");
    for years in 1..=5 {
        swaps = swaps.with_instrument(
            Swap::regular(format!("SWP-{years}Y"), spot(), years, Frequency::Annual).unwrap(),
            0.04,
        );
    }
    let curve = CalibratedCurve::calibrate(CurveConfig::default(), context(), vec![cash, swaps]).unwrap();
    let bumped = curve.bumped(&ParallelBump::one_bp_up().into()).unwrap();

    // every payment date is a knot, so node discount factors follow the
    // sequential par bootstrap in closed form
    let par_bootstrap = |q: f64| {
        let mut dfs = Vec::new();
        let mut annuity = 0.0;
        let mut previous = spot();
        for years in 1..=5 {
            let date = spot().add_years(years).unwrap();
            let tau = previous.year_fraction(&date);
            let df = (1.0 - q * annuity) / (1.0 + q * tau);
            annuity += tau * df;
            dfs.push((date, df));
            previous = date;
        }
        dfs
    };

    for ((date, base), (_, up)) in par_bootstrap(0.04).into_iter().zip(par_bootstrap(0.0401)) {
        assert_relative_eq!(curve.discount_factor(date).unwrap(), base, epsilon = 1e-13);
        let shift_bps = (bumped.zero_rate(date).unwrap() - curve.zero_rate(date).unwrap()) * 1e4;
        let expected_bps = (base.ln() - up.ln()) / spot().year_fraction(&date) * 1e4;
        assert_relative_eq!(shift_bps, expected_bps, epsilon = 1e-6);
        assert!(shift_bps > 0.9 && shift_bps < 1.05, "{date}: {shift_bps}bp");
    }
}

#[test]
fn test_tenor_bump_leaves_short_end_unchanged() {
    let curve = usd_curve();
    let bump = CurveBump::tenor(vec![TenorBump::new(1.9, 10.0, 5.0)]);
    let bumped = curve.bumped(&bump).unwrap();
    for months in [1, 6, 12, 18] {
        let date = spot().add_months(months).unwrap();
        assert_relative_eq!(
            bumped.discount_factor(date).unwrap(),
            curve.discount_factor(date).unwrap(),
            epsilon = 1e-13
        );
    }
    let five_years = spot().add_years(5).unwrap();
    assert!(bumped.discount_factor(five_years).unwrap() < curve.discount_factor(five_years).unwrap());
}

// =============================================================================
// Quote Jacobians
// =============================================================================

#[test]
fn test_discount_jacobian_matches_finite_differences() {
    let curve = usd_curve();
    let dates = [
        spot().add_days(45),
        spot().add_days(200),
        spot().add_days(465),
        spot().add_years(2).unwrap(),
        spot().add_days(1500),
        spot().add_years(6).unwrap(),
    ];
    assert_matches_finite_differences(
        &curve,
        &dates,
        |c, d| c.discount_factor(d).unwrap(),
        |c, d| c.jacobian_df_to_quotes(d).unwrap(),
    );

    // swap payments before the swaps stretch still feed the Jacobian
    let jacobian = curve.jacobian_df_to_quotes(spot().add_years(2).unwrap()).unwrap();
    assert!(jacobian.get("DEP-12M").unwrap().abs() > 1e-3);
    assert!(jacobian.get("SWP-2Y").unwrap() < 0.0);
}

#[test]
fn test_forward_rate_jacobian_matches_finite_differences() {
    let cash = StretchSpec::new("cash")
        .with_instrument(deposit_months(1), 0.0430)
        .with_instrument(deposit_months(3), 0.0435)
        .with_instrument(deposit_months(6), 0.0438);
    let fras = StretchSpec::new("fras")
        .with_instrument(Fra::from_months("FRA-6X9", spot(), 6, 9).unwrap(), 0.0420)
        .with_instrument(Fra::from_months("FRA-9X12", spot(), 9, 12).unwrap(), 0.0405);
    let config = CurveConfig::new(LatentState::ForwardRate).with_epoch_response(0.043);
    let curve = CalibratedCurve::calibrate(config, context(), vec![cash, fras]).unwrap();
    let dates = [spot().add_days(20), spot().add_days(150), spot().add_days(300), spot().add_days(500)];
    assert_matches_finite_differences(
        &curve,
        &dates,
        |c, d| c.discount_factor(d).unwrap(),
        |c, d| c.jacobian_df_to_quotes(d).unwrap(),
    );
}

#[test]
fn test_zero_rate_jacobian_matches_finite_differences() {
    let cash = StretchSpec::new("cash")
        .with_instrument(deposit_months(3), 0.0435)
        .with_instrument(deposit_months(6), 0.0438)
        .with_instrument(deposit_months(12), 0.0425);
    let config = CurveConfig::new(LatentState::ZeroRate).with_epoch_response(0.043);
    let curve = CalibratedCurve::calibrate(config, context(), vec![cash]).unwrap();
    let dates = [spot().add_days(40), spot().add_days(250), spot().add_days(400)];
    assert_matches_finite_differences(
        &curve,
        &dates,
        |c, d| c.discount_factor(d).unwrap(),
        |c, d| c.jacobian_df_to_quotes(d).unwrap(),
    );
}

// =============================================================================
// Credit
// =============================================================================

fn credit_curve() -> CalibratedCurve {
    let point = |years: i32| {
        CreditPoint::new(format!("CDS-{years}Y"), spot().add_years(years).unwrap()).unwrap()
    };
    let spec = StretchSpec::new("credit")
        .with_instrument(point(1), 0.0100)
        .with_instrument(point(3), 0.0120)
        .with_instrument(point(5), 0.0150)
        .with_instrument(point(7), 0.0160);
    let config = CurveConfig::new(LatentState::SurvivalProbability).with_name("ACME");
    CalibratedCurve::calibrate(config, context(), vec![spec]).unwrap()
}

#[test]
fn test_survival_curve() {
    let curve = credit_curve();
    assert!(curve.repricing_report().unwrap().is_valid());

    let three_years = spot().add_years(3).unwrap();
    let tau = spot().year_fraction(&three_years);
    assert_relative_eq!(
        curve.survival_probability(three_years).unwrap(),
        (-0.012 / 0.6 * tau).exp(),
        epsilon = 1e-12
    );
    assert!(curve.hazard_rate(spot().add_years(2).unwrap()).unwrap() > 0.0);
    assert!(curve.zero_rate(three_years).is_err());
}

#[test]
fn test_survival_jacobian_matches_finite_differences() {
    let curve = credit_curve();
    let dates = [spot().add_years(2).unwrap(), spot().add_days(2000), spot().add_years(9).unwrap()];
    assert_matches_finite_differences(
        &curve,
        &dates,
        |c, d| c.survival_probability(d).unwrap(),
        |c, d| c.jacobian_survival_to_quotes(d).unwrap(),
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_shape_only_curve_has_no_jacobian() {
    let config = CurveConfig::default().with_detail(CalibrationDetail::ShapeOnly);
    let curve = CalibratedCurve::calibrate(config, context(), usd_specs()).unwrap();
    assert!(curve.repricing_report().unwrap().is_valid());
    assert!(matches!(
        curve.jacobian_df_to_quotes(spot().add_years(2).unwrap()),
        Err(CurveError::JacobianUnavailable { .. })
    ));
}

#[test]
fn test_failing_stretch_aborts_span() {
    let mut specs = usd_specs();
    specs.push(
        StretchSpec::new("credit").with_instrument(
            CreditPoint::new("CDS-10Y", spot().add_years(10).unwrap()).unwrap(),
            0.01,
        ),
    );
    let result = CalibratedCurve::calibrate(CurveConfig::default(), context(), specs);
    assert!(matches!(result, Err(CurveError::InvalidInstrument { .. })));

    // maturities inside an earlier stretch
    let mut specs = usd_specs();
    specs.push(StretchSpec::new("late").with_instrument(deposit_months(9), 0.04));
    let result = CalibratedCurve::calibrate(CurveConfig::default(), context(), specs);
    assert!(matches!(result, Err(CurveError::CalibrationFailure { .. })));

    // instrument that starts before the epoch
    let early = Fra::new("FRA-OLD", spot().add_days(-10), spot().add_days(80)).unwrap();
    let spec = StretchSpec::new("fras").with_instrument(early, 0.04);
    let result = CalibratedCurve::calibrate(CurveConfig::default(), context(), vec![spec]);
    assert!(matches!(result, Err(CurveError::ConstraintGeneration { .. })));
}

#[test]
fn test_rate_state_needs_epoch_response() {
    let result = CalibratedCurve::calibrate(
        CurveConfig::new(LatentState::ZeroRate),
        context(),
        usd_specs(),
    );
    assert!(matches!(result, Err(CurveError::InvalidConfig { .. })));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_flat_continuous_deposits_reprice(rate in 0.001_f64..0.10) {
        let dep = |days: i64| {
            Deposit::from_days(format!("DEP-{days}D"), spot(), days)
                .unwrap()
                .with_compounding(Compounding::Continuous)
        };
        let spec = StretchSpec::new("cash")
            .with_instrument(dep(30), rate)
            .with_instrument(dep(91), rate)
            .with_instrument(dep(182), rate)
            .with_instrument(dep(365), rate);
        let curve = CalibratedCurve::calibrate(CurveConfig::default(), context(), vec![spec]).unwrap();
        for days in [30, 91, 182, 365] {
            let df = curve.discount_factor(spot().add_days(days)).unwrap();
            prop_assert!((df - (-rate * days as f64 / 365.0).exp()).abs() < 1e-12);
        }
        prop_assert!(curve.repricing_report().unwrap().is_valid());
    }

    #[test]
    fn prop_higher_quotes_discount_more(shift in 0.5_f64..50.0) {
        let curve = usd_curve();
        let bumped = curve.bumped(&CurveBump::parallel(shift)).unwrap();
        for years in 1..=5 {
            let date = spot().add_years(years).unwrap();
            prop_assert!(bumped.discount_factor(date).unwrap() < curve.discount_factor(date).unwrap());
        }
    }
}
