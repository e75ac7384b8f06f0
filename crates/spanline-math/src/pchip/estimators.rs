//! Individual slope estimators.

use super::Secants;
use crate::error::MathResult;

fn same_sign(values: &[f64]) -> bool {
    values.iter().all(|v| *v > 0.0) || values.iter().all(|v| *v < 0.0)
}

/// Three-times-smaller-secant bound of Hyman (1983); zero across a sign change.
fn hyman_limit(slope: f64, a: f64, b: f64) -> f64 {
    if a * b <= 0.0 {
        return 0.0;
    }
    let sigma = b.signum();
    sigma * (sigma * slope).max(0.0).min(3.0 * a.abs().min(b.abs()))
}

/// Bessel slopes: parabola through three neighbouring nodes.
pub fn bessel(xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    Ok(sec.with_interior(|i| sec.parabolic(i)))
}

/// Hyman (1983) monotone filter on the Bessel slopes.
///
/// Where the neighbouring secants share a sign the slope is limited to
/// `3 · min(|s₋|, |s₊|)`, otherwise it is zero. With
/// `eliminate_spurious_extrema` the slope is further clamped between the
/// two secants.
pub fn hyman83(xs: &[f64], ys: &[f64], eliminate_spurious_extrema: bool) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    Ok(sec.with_guarded_ends(|i| {
        let (a, b) = (sec.s[i - 1], sec.s[i]);
        let limited = hyman_limit(sec.parabolic(i), a, b);
        if eliminate_spurious_extrema && a * b > 0.0 {
            limited.clamp(a.min(b), a.max(b))
        } else {
            limited
        }
    }))
}

/// Dougherty-Edelman-Hyman (1989) limiter.
///
/// Nodes `2..n-2` compare the Bessel slope with the one-sided parabolic
/// slopes `μ₋` and `μ₊`. The two nodes at each end keep the Bessel slopes,
/// held to the Hyman (1983) bound next to the end nodes.
pub fn hyman89(xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    let (h, s) = (&sec.h, &sec.s);
    let n = sec.nodes();
    Ok(sec.with_guarded_ends(|i| {
        let mu0 = sec.parabolic(i);
        if i < 2 || i + 2 >= n {
            return hyman_limit(mu0, s[i - 1], s[i]);
        }
        let mu_minus =
            (s[i - 1] * (2.0 * h[i - 1] + h[i - 2]) - s[i - 2] * h[i - 1]) / (h[i - 2] + h[i - 1]);
        let mu_plus = (s[i] * (2.0 * h[i] + h[i + 1]) - s[i + 1] * h[i]) / (h[i] + h[i + 1]);

        let mut bound = 3.0 * s[i - 1].abs().min(s[i].abs()).min(mu0.abs());
        if same_sign(&[mu0, mu_minus, s[i - 1] - s[i - 2], s[i] - s[i - 1]]) {
            bound = bound.max(1.5 * mu0.abs().min(mu_minus.abs()));
        } else if same_sign(&[-mu0, -mu_plus, s[i] - s[i - 1], s[i + 1] - s[i]]) {
            bound = bound.max(1.5 * mu0.abs().min(mu_plus.abs()));
        }
        mu0.signum() * mu0.abs().min(bound)
    }))
}

/// Fritsch-Butland weighted harmonic mean of the neighbouring secants.
///
/// `monotone_filter` zeroes an end slope whose sign disagrees with the end
/// secant and caps it at three times that secant when the secants change
/// sign.
pub fn harmonic(xs: &[f64], ys: &[f64], monotone_filter: bool) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    let (h, s) = (&sec.h, &sec.s);
    let mut d = sec.with_interior(|i| {
        if s[i - 1] * s[i] <= 0.0 {
            return 0.0;
        }
        let w1 = 2.0 * h[i] + h[i - 1];
        let w2 = h[i] + 2.0 * h[i - 1];
        3.0 * (h[i - 1] + h[i]) / (w1 / s[i - 1] + w2 / s[i])
    });
    if monotone_filter {
        let m = s.len();
        let last = d.len() - 1;
        d[0] = filter_end(d[0], s[0], s[1]);
        d[last] = filter_end(d[last], s[m - 1], s[m - 2]);
    }
    Ok(d)
}

fn filter_end(slope: f64, secant: f64, next: f64) -> f64 {
    if slope * secant <= 0.0 {
        0.0
    } else if secant * next < 0.0 && slope.abs() > 3.0 * secant.abs() {
        3.0 * secant
    } else {
        slope
    }
}

/// Van Leer limiter `s₋ · (r + |r|) / (1 + |r|)` with `r = s₊ / s₋`.
pub fn van_leer(xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    let s = &sec.s;
    Ok(sec.with_guarded_ends(|i| {
        if s[i - 1] == 0.0 {
            return 0.0;
        }
        let r = s[i] / s[i - 1];
        s[i - 1] * (r + r.abs()) / (1.0 + r.abs())
    }))
}

/// Huynh-Le Floch limiter.
pub fn huynh_le_floch(xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    let s = &sec.s;
    Ok(sec.with_guarded_ends(|i| {
        let (a, b) = (s[i - 1], s[i]);
        if a * b <= 0.0 {
            return 0.0;
        }
        3.0 * a * b * (a + b) / (a * a + 4.0 * a * b + b * b)
    }))
}

/// Akima slopes, with two secants extrapolated linearly past each end.
pub fn akima(xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    let n = sec.nodes();
    let mut m = Vec::with_capacity(n + 3);
    m.push(0.0);
    m.push(0.0);
    m.extend_from_slice(&sec.s);
    m.push(0.0);
    m.push(0.0);
    m[1] = 2.0 * m[2] - m[3];
    m[0] = 2.0 * m[1] - m[2];
    m[n + 1] = 2.0 * m[n] - m[n - 1];
    m[n + 2] = 2.0 * m[n + 1] - m[n];

    Ok((0..n)
        .map(|i| {
            let upper = (m[i + 3] - m[i + 2]).abs();
            let lower = (m[i + 1] - m[i]).abs();
            if upper + lower > 0.0 {
                (upper * m[i + 1] + lower * m[i + 2]) / (upper + lower)
            } else {
                0.5 * (m[i + 1] + m[i + 2])
            }
        })
        .collect())
}

/// Kruger slopes: harmonic mean inside, `1.5 s - 0.5 d` at the ends.
pub fn kruger(xs: &[f64], ys: &[f64]) -> MathResult<Vec<f64>> {
    let sec = Secants::new(xs, ys)?;
    let s = &sec.s;
    let n = sec.nodes();
    let mut d: Vec<f64> = (0..n)
        .map(|i| {
            if i == 0 || i == n - 1 || s[i - 1] * s[i] <= 0.0 {
                0.0
            } else {
                2.0 / (1.0 / s[i - 1] + 1.0 / s[i])
            }
        })
        .collect();
    d[0] = 1.5 * s[0] - 0.5 * d[1];
    d[n - 1] = 1.5 * s[n - 2] - 0.5 * d[n - 2];
    Ok(d)
}
