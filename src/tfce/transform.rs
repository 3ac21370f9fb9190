//! Threshold-free cluster enhancement of a statistic field.
//!
//! Purpose
//! -------
//! Re-weight every location by the extent of the supra-threshold cluster it
//! belongs to, integrated over all thresholds:
//! `e(v) = Σⱼ s(v, hⱼ)ᴱ · hⱼᴴ · dh`, where `s(v, h)` is the (density
//! weighted) size of the connected component containing `v` among the
//! locations with statistic `≥ h`.
//!
//! Key behaviors
//! -------------
//! - Thresholds are `hⱼ = j · dh` for `j = 1..=J`. A fixed step gives
//!   `J = ⌊max / dh⌋`; `Divisions(n)` gives `dh = max / n` and `J = n`.
//!   The last threshold never exceeds the field maximum.
//! - Components are maintained incrementally: thresholds are visited from
//!   the top down, so locations only ever join the forest and unions never
//!   need undoing.
//! - [`TfceTransform::enhance_signed`] scores the positive field and the
//!   negated field separately; both outputs are non-negative magnitudes.
//!
//! Invariants & assumptions
//! ------------------------
//! - NaN and `−∞` statistics score as `0.0`, as do non-positive values in
//!   the one-sided transform. `+∞` (a perfect fit) is clamped to the
//!   largest finite value of the same sign, so it stays in its cluster
//!   instead of splitting it.
//! - Output length equals the adjacency's location count.
use crate::tfce::{
    adjacency::AdjacencySet,
    errors::{TfceError, TfceResult},
    workspace::TfceWorkspace,
};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Threshold increment policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TfceStep {
    /// Fixed height increment `dh`.
    Fixed(f64),
    /// Split `(0, max]` into this many equal steps.
    Divisions(usize),
}

impl Default for TfceStep {
    fn default() -> Self {
        TfceStep::Divisions(100)
    }
}

/// TFCE exponents and step.
///
/// Defaults: `H = 2`, `E = 1`, 100 divisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TfceParams {
    pub height: f64,
    pub extent: f64,
    pub step: TfceStep,
}

impl Default for TfceParams {
    fn default() -> Self {
        Self { height: 2.0, extent: 1.0, step: TfceStep::default() }
    }
}

impl TfceParams {
    /// Validated constructor.
    ///
    /// Errors
    /// ------
    /// - `TfceError::InvalidParameter` for a non-finite or non-positive
    ///   exponent, a non-finite or non-positive `dh`, or zero divisions.
    pub fn new(height: f64, extent: f64, step: TfceStep) -> TfceResult<Self> {
        let params = Self { height, extent, step };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> TfceResult<()> {
        check_positive("height", self.height)?;
        check_positive("extent", self.extent)?;
        match self.step {
            TfceStep::Fixed(dh) => check_positive("dh", dh),
            TfceStep::Divisions(0) => Err(TfceError::InvalidParameter {
                name: "divisions",
                value: 0.0,
                reason: "at least one division is required",
            }),
            TfceStep::Divisions(_) => Ok(()),
        }
    }

    /// `(dh, J)` for a field whose maximum is `max > 0`.
    fn schedule(&self, max: f64) -> (f64, usize) {
        match self.step {
            TfceStep::Fixed(dh) => (dh, (max / dh).floor() as usize),
            TfceStep::Divisions(n) => (max / n as f64, n),
        }
    }
}

fn check_positive(name: &'static str, value: f64) -> TfceResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TfceError::InvalidParameter { name, value, reason: "must be finite and > 0" });
    }
    Ok(())
}

/// Positive and negative enhancement of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedEnhancement {
    pub positive: Array1<f64>,
    pub negative: Array1<f64>,
}

impl SignedEnhancement {
    /// Largest enhanced value of either sign.
    pub fn max_abs(&self) -> f64 {
        self.positive.iter().chain(self.negative.iter()).fold(0.0_f64, |acc, &v| acc.max(v))
    }
}

/// Sweep input: NaN and non-positive entries become 0 and `+∞` becomes the
/// largest finite value (0 when there is none).
fn positive_part(values: impl Iterator<Item = f64> + Clone) -> Vec<f64> {
    let ceiling = values.clone().filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    values.map(|v| if v.is_nan() || v <= 0.0 { 0.0 } else { v.min(ceiling) }).collect()
}

/// TFCE bound to one surface's adjacency.
#[derive(Debug, Clone, Copy)]
pub struct TfceTransform<'a> {
    adjacency: &'a AdjacencySet,
    params: TfceParams,
}

impl<'a> TfceTransform<'a> {
    /// Errors
    /// ------
    /// - `TfceError::InvalidParameter` from [`TfceParams::validate`].
    pub fn new(adjacency: &'a AdjacencySet, params: TfceParams) -> TfceResult<Self> {
        params.validate()?;
        Ok(Self { adjacency, params })
    }

    pub fn adjacency(&self) -> &'a AdjacencySet {
        self.adjacency
    }

    pub fn params(&self) -> &TfceParams {
        &self.params
    }

    /// Enhance the positive part of `field` with a fresh workspace.
    pub fn enhance(&self, field: ArrayView1<f64>) -> TfceResult<Array1<f64>> {
        let mut ws = TfceWorkspace::new(field.len());
        self.enhance_with(field, &mut ws)
    }

    /// Enhance the positive part of `field`, reusing `ws`.
    ///
    /// Errors
    /// ------
    /// - `TfceError::LengthMismatch` when the field and adjacency disagree.
    pub fn enhance_with(
        &self, field: ArrayView1<f64>, ws: &mut TfceWorkspace,
    ) -> TfceResult<Array1<f64>> {
        self.check_len(field.len())?;
        let values = positive_part(field.iter().copied());
        Ok(self.sweep(&values, ws))
    }

    /// Enhance `field` and `-field` separately.
    pub fn enhance_signed(&self, field: ArrayView1<f64>) -> TfceResult<SignedEnhancement> {
        let mut ws = TfceWorkspace::new(field.len());
        self.enhance_signed_with(field, &mut ws)
    }

    pub fn enhance_signed_with(
        &self, field: ArrayView1<f64>, ws: &mut TfceWorkspace,
    ) -> TfceResult<SignedEnhancement> {
        self.check_len(field.len())?;
        let pos = positive_part(field.iter().copied());
        let neg = positive_part(field.iter().map(|&v| -v));
        Ok(SignedEnhancement { positive: self.sweep(&pos, ws), negative: self.sweep(&neg, ws) })
    }

    fn check_len(&self, len: usize) -> TfceResult<()> {
        if len != self.adjacency.len() {
            return Err(TfceError::LengthMismatch {
                what: "statistic field",
                expected: self.adjacency.len(),
                found: len,
            });
        }
        Ok(())
    }

    /// Core sweep over non-negative, finite `values`.
    fn sweep(&self, values: &[f64], ws: &mut TfceWorkspace) -> Array1<f64> {
        let m = values.len();
        let mut out = Array1::<f64>::zeros(m);
        let max = values.iter().fold(0.0_f64, |acc, &v| acc.max(v));
        if max <= 0.0 {
            return out;
        }
        let (dh, steps) = self.params.schedule(max);
        if steps == 0 {
            return out;
        }

        ws.reset(m);
        ws.order.extend((0..m).filter(|&i| values[i] > 0.0));
        ws.order.sort_unstable_by(|&a, &b| values[b].total_cmp(&values[a]));

        let adj = self.adjacency;
        let TfceParams { height, extent, .. } = self.params;
        let mut cursor = 0;
        for j in (1..=steps).rev() {
            let h = (j as f64 * dh).min(max);
            while cursor < ws.order.len() && values[ws.order[cursor]] >= h {
                let i = ws.order[cursor];
                ws.activate(i, adj.weight(i));
                for &nb in adj.neighbours(i) {
                    if ws.is_active(nb) {
                        ws.union(i, nb);
                    }
                }
                cursor += 1;
            }
            let scale = h.powf(height) * dh;
            for idx in 0..cursor {
                let i = ws.order[idx];
                out[i] += ws.component_size(i).powf(extent) * scale;
            }
        }
        out
    }
}
