//! Linear bracket search over a 1-D parameter sequence.
//!
//! Parameter sequences come from node distances along a blade or tower.
//! They are short and nearly monotonic, but nothing guarantees strict
//! monotonicity, so the search must terminate and stay in range for any
//! input, including repeated, decreasing or NaN parameters.

/// A pair of adjacent nodes `(lower, lower + 1)` and the interpolation
/// fraction between them.
///
/// `t` is not clamped to `[0, 1]`: a target slightly past either end of
/// the bracket extrapolates linearly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bracket {
    /// Index of the lower node.
    pub lower: usize,
    /// Fraction from `lower` toward `lower + 1`.
    pub t: f64,
}

impl Bracket {
    /// Blend `values[lower]` and `values[lower + 1]` component-wise.
    ///
    /// # Panics
    ///
    /// Panics if `values` is shorter than `lower + 2`.
    pub fn apply<const N: usize>(&self, values: &[[f64; N]]) -> [f64; N] {
        let lo = values[self.lower];
        let hi = values[self.lower + 1];
        std::array::from_fn(|c| lo[c] + self.t * (hi[c] - lo[c]))
    }
}

/// Stateful bracket finder over a fixed parameter sequence.
///
/// Each [`locate`](Self::locate) call resumes scanning from the bracket
/// found by the previous call, so locating an ascending run of targets
/// costs one pass over the parameters in total.
#[derive(Debug)]
pub struct BracketSearch<'a> {
    params: &'a [f64],
    cursor: usize,
}

impl<'a> BracketSearch<'a> {
    /// Start a search over `params`.
    ///
    /// Returns `None` if there are fewer than two parameters, since no
    /// bracket exists.
    pub fn new(params: &'a [f64]) -> Option<Self> {
        if params.len() < 2 {
            return None;
        }
        Some(Self { params, cursor: 0 })
    }

    /// Find the bracket for target parameter `x`.
    ///
    /// Scans forward from the previous bracket while `x` lies outside the
    /// current bracket's interval. If the forward scan finds nothing, the
    /// brackets before the previous one are tried. If `x` lies in no
    /// bracket at all, the last bracket is used and the result
    /// extrapolates.
    pub fn locate(&mut self, x: f64) -> Bracket {
        let last = self.params.len() - 2;
        let lower = (self.cursor..=last)
            .find(|&j| self.encloses(j, x))
            .or_else(|| (0..self.cursor).find(|&j| self.encloses(j, x)))
            .unwrap_or(last);
        self.cursor = lower;
        Bracket {
            lower,
            t: self.fraction(lower, x),
        }
    }

    fn encloses(&self, j: usize, x: f64) -> bool {
        (self.params[j] - x) * (self.params[j + 1] - x) <= 0.0
    }

    fn fraction(&self, j: usize, x: f64) -> f64 {
        let span = self.params[j + 1] - self.params[j];
        if span == 0.0 {
            // Coincident nodes: take the lower value rather than divide by zero.
            0.0
        } else {
            (x - self.params[j]) / span
        }
    }
}
