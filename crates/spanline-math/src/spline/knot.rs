//! Local knot insertion.

use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};
use crate::spline::stretch::hermite_segment;
use crate::spline::{Segment, Stretch};

/// How the slope at an inserted knot is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum KnotScheme {
    /// Keep the existing curve's slope at the new knot.
    #[default]
    Hermite,
    /// `(1 - c)` times the chord slope of the split segment.
    Cardinal {
        /// Tension `c`; zero gives Catmull-Rom.
        tension: f64,
    },
    /// Chord slope of the split segment.
    CatmullRom,
}

impl KnotScheme {
    fn slope(&self, segment: &Segment, x: f64) -> MathResult<f64> {
        let chord = || -> MathResult<f64> {
            let rise = segment.response(segment.right())? - segment.response(segment.left())?;
            Ok(rise / segment.width())
        };
        match *self {
            Self::Hermite => segment.derivative(x, 1),
            Self::Cardinal { tension } => {
                if !tension.is_finite() {
                    return Err(MathError::non_finite("cardinal tension"));
                }
                Ok((1.0 - tension) * chord()?)
            }
            Self::CatmullRom => chord(),
        }
    }
}

impl Stretch {
    /// Returns a new stretch with an extra knot at `x`.
    ///
    /// Only the segment containing `x` is replaced, by two Hermite
    /// segments that keep its edge values and slopes and meet at the
    /// existing response `R(x)`. Every other segment is shared with `self`.
    /// The result carries no input Jacobians.
    pub fn insert_knot(&self, x: f64, scheme: KnotScheme) -> MathResult<Stretch> {
        if !x.is_finite() {
            return Err(MathError::non_finite("knot ordinate"));
        }
        if x <= self.left() || x >= self.right() {
            return Err(MathError::OutOfRange {
                x,
                min: self.left(),
                max: self.right(),
            });
        }
        if self.ordinates().contains(&x) {
            return Err(MathError::invalid_input(format!("{x} is already a knot")));
        }
        let design = *self.design();
        if design.num_basis() != 4 {
            return Err(MathError::invalid_input(
                "knot insertion needs a four-function basis",
            ));
        }

        let index = self.segment_index(x)?;
        let old = &self.segments()[index];
        let (lo, hi) = (old.left(), old.right());
        let values = (old.response(lo)?, old.response(x)?, old.response(hi)?);
        let slopes = (
            old.derivative(lo, 1)?,
            scheme.slope(old, x)?,
            old.derivative(hi, 1)?,
        );

        let basis = design.basis.build()?;
        let left = hermite_segment(
            lo,
            x,
            Arc::clone(&basis),
            &design,
            (values.0, values.1),
            (slopes.0, slopes.1),
        )?;
        let right = hermite_segment(x, hi, basis, &design, (values.1, values.2), (slopes.1, slopes.2))?;

        let mut segments = Vec::with_capacity(self.num_segments() + 1);
        segments.extend(self.segments()[..index].iter().cloned());
        segments.push(Arc::new(left));
        segments.push(Arc::new(right));
        segments.extend(self.segments()[index + 1..].iter().cloned());

        let mut ordinates = self.ordinates().to_vec();
        ordinates.insert(index + 1, x);

        trace!("inserted knot {x} into segment {index} with {scheme:?}");
        Ok(Stretch::from_parts(ordinates, segments, design))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::SegmentDesign;
    use approx::assert_relative_eq;

    fn five_node() -> Stretch {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.0, 2.0, 0.5, 3.0, 2.5];
        let slopes = [1.0, -0.5, 0.2, 1.0, -1.0];
        Stretch::hermite(&xs, &ys, &slopes, &SegmentDesign::default()).unwrap()
    }

    #[test]
    fn test_untouched_segments_are_shared() {
        let stretch = five_node();
        let inserted = stretch.insert_knot(2.5, KnotScheme::Hermite).unwrap();
        assert_eq!(inserted.num_segments(), 5);
        assert_eq!(inserted.ordinates(), &[0.0, 1.0, 2.0, 2.5, 3.0, 4.0]);
        assert!(Arc::ptr_eq(&stretch.segments()[0], &inserted.segments()[0]));
        assert!(Arc::ptr_eq(&stretch.segments()[3], &inserted.segments()[4]));
        for x in [0.5, 1.5, 3.5] {
            assert_relative_eq!(
                inserted.response_value(x).unwrap(),
                stretch.response_value(x).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_hermite_insertion_reproduces_cubic() {
        let stretch = five_node();
        let inserted = stretch.insert_knot(2.5, KnotScheme::Hermite).unwrap();
        // a cubic split at its own value and slope is unchanged
        for x in [2.1, 2.5, 2.9] {
            assert_relative_eq!(
                inserted.response_value(x).unwrap(),
                stretch.response_value(x).unwrap(),
                epsilon = 1e-10
            );
        }
        assert!(inserted.continuity_gap(1).unwrap() < 1e-10);
    }

    #[test]
    fn test_cardinal_and_catmull_rom_slopes() {
        let stretch = five_node();
        // chord of segment [2, 3] is 2.5
        let catmull = stretch.insert_knot(2.5, KnotScheme::CatmullRom).unwrap();
        assert_relative_eq!(catmull.derivative(2.5, 1).unwrap(), 2.5, epsilon = 1e-10);
        let cardinal = stretch
            .insert_knot(2.5, KnotScheme::Cardinal { tension: 0.5 })
            .unwrap();
        assert_relative_eq!(cardinal.derivative(2.5, 1).unwrap(), 1.25, epsilon = 1e-10);
        assert_relative_eq!(
            cardinal.response_value(2.5).unwrap(),
            stretch.response_value(2.5).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_invalid_insertions() {
        let stretch = five_node();
        assert!(stretch.insert_knot(2.0, KnotScheme::Hermite).is_err());
        assert!(stretch.insert_knot(-1.0, KnotScheme::Hermite).is_err());
        assert!(stretch.insert_knot(4.0, KnotScheme::Hermite).is_err());
        assert!(stretch.insert_knot(f64::NAN, KnotScheme::Hermite).is_err());
    }
}
