//! Golden-section search for the minimum of a unimodal function on an interval.

/// `1 / φ`, the fraction of the bracket kept at each step.
const INV_PHI: f64 = 0.618_033_988_749_895;

/// Minimize `f` on `[a, b]`.
///
/// Arguments
/// -----------------
/// * `f`: the objective, assumed unimodal on `[a, b]`.
/// * `a`, `b`: the initial bracket (swapped if given in decreasing order).
/// * `tolerance`: the search stops once the bracket is narrower than this.
/// * `max_iter`: iteration bound, in case `tolerance` is below what `f64` can resolve.
///
/// Return
/// ----------
/// * The midpoint of the final bracket.
///
/// Notes
/// ----------
/// * One evaluation of `f` per iteration: the surviving interior point is reused.
/// * For a non-unimodal `f` the result is a local minimum.
pub fn golden_section_search<F>(f: F, a: f64, b: f64, tolerance: f64, max_iter: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = if a <= b { (a, b) } else { (b, a) };
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);

    for _ in 0..max_iter {
        if (hi - lo).abs() < tolerance {
            break;
        }
        if f1 < f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = f(x2);
        }
    }
    (lo + hi) / 2.0
}
