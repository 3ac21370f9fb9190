//! Benjamini–Hochberg false-discovery-rate adjustment.
//!
//! `q₍ᵢ₎ = min_{j ≥ i} p₍ⱼ₎ · m / j`, capped at 1, returned in input order.
//! NaN p-values count as 1 so they rank last and never enter a sort as NaN.
use crate::utils::nan_to_one;
use ndarray::{Array2, Axis};

/// BH q-values for one family of hypotheses.
pub fn fdr_bh(pvalues: &[f64]) -> Vec<f64> {
    let m = pvalues.len();
    if m == 0 {
        return Vec::new();
    }
    let p: Vec<f64> = pvalues.iter().map(|&v| nan_to_one(v)).collect();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| p[a].total_cmp(&p[b]));

    let mut q = vec![0.0; m];
    let mut running = 1.0_f64;
    for rank in (0..m).rev() {
        let i = order[rank];
        let candidate = p[i] * m as f64 / (rank + 1) as f64;
        running = running.min(candidate);
        q[i] = running;
    }
    q
}

/// [`fdr_bh`] applied independently to each column (one contrast per
/// column, one location per row).
pub fn fdr_bh_columns(pvalues: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(pvalues.raw_dim());
    for (src, mut dst) in pvalues.axis_iter(Axis(1)).zip(out.axis_iter_mut(Axis(1))) {
        let q = fdr_bh(&src.to_vec());
        for (d, v) in dst.iter_mut().zip(q) {
            *d = v;
        }
    }
    out
}
