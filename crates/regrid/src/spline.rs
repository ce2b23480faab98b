//! Piecewise-linear interpolation through class nodes.
//!
//! A [`LinearStencil`] is fitted once per grid point from the node heights
//! and the target heights, then evaluated for every time step. Each target
//! reduces to a weighted pair of node values, so evaluation is a handful of
//! multiply-adds.

/// Behaviour outside the range of node heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Continue the slope of the outermost segment.
    #[default]
    Linear,
    /// Hold the value of the outermost node.
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    weight: f64,
}

/// Precomputed interpolation weights from a fixed node set to fixed targets.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearStencil {
    taps: Vec<Tap>,
    n_nodes: usize,
}

impl LinearStencil {
    /// Fit the stencil.
    ///
    /// `heights` need not be sorted. Node indices refer to positions in
    /// `heights`; when several nodes share a height the first one is used.
    /// With a single node every target takes its value. Returns `None` if
    /// there are no nodes or any height or target is not finite.
    pub fn fit(heights: &[f64], targets: &[f64], mode: Extrapolation) -> Option<Self> {
        if heights.is_empty() || !heights.iter().chain(targets).all(|x| x.is_finite()) {
            return None;
        }

        let mut order: Vec<usize> = (0..heights.len()).collect();
        order.sort_by(|&a, &b| heights[a].total_cmp(&heights[b]));
        order.dedup_by(|later, earlier| heights[*later] == heights[*earlier]);

        let h: Vec<f64> = order.iter().map(|&i| heights[i]).collect();
        let taps = targets
            .iter()
            .map(|&x| {
                let (lo, hi, weight) = bracket(&h, x, mode);
                Tap {
                    lo: order[lo],
                    hi: order[hi],
                    weight,
                }
            })
            .collect();

        Some(Self {
            taps,
            n_nodes: heights.len(),
        })
    }

    /// Number of target heights.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Returns `true` if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Number of nodes the stencil was fitted on.
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Interpolated value at every target, given node values in the order
    /// of the fitted heights.
    ///
    /// # Panics
    ///
    /// Panics if `values` is shorter than the node count.
    pub fn evaluate<'a>(&'a self, values: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
        self.taps.iter().map(move |tap| {
            if tap.lo == tap.hi {
                values[tap.lo]
            } else {
                (1.0 - tap.weight) * values[tap.lo] + tap.weight * values[tap.hi]
            }
        })
    }
}

/// Bracketing pair and weight of `x` in sorted, distinct `h`.
fn bracket(h: &[f64], x: f64, mode: Extrapolation) -> (usize, usize, f64) {
    let last = h.len() - 1;
    if last == 0 {
        return (0, 0, 0.0);
    }
    let segment = |k: usize| (k, k + 1, (x - h[k]) / (h[k + 1] - h[k]));

    if x < h[0] {
        return match mode {
            Extrapolation::Linear => segment(0),
            Extrapolation::Clamp => (0, 0, 0.0),
        };
    }
    if x > h[last] {
        return match mode {
            Extrapolation::Linear => segment(last - 1),
            Extrapolation::Clamp => (last, last, 0.0),
        };
    }

    let k = h.partition_point(|&node| node <= x) - 1;
    if h[k] == x {
        (k, k, 0.0)
    } else {
        segment(k)
    }
}
