//! Low-memory TFCE: one surface resident at a time.
//!
//! [`StreamingTfce`] owns a single [`TfceWorkspace`] and consumes surfaces
//! from a lazy iterator. Each surface's adjacency and statistic field are
//! taken by value, enhanced, handed to an [`EnhancedSink`] and dropped
//! before the next surface is pulled, so peak memory is one surface plus
//! the workspace.
use crate::tfce::{
    adjacency::AdjacencySet,
    errors::TfceResult,
    transform::{SignedEnhancement, TfceParams, TfceTransform},
    workspace::TfceWorkspace,
};
use ndarray::Array1;

/// Receives each surface's enhancement exactly once.
pub trait EnhancedSink {
    fn accept(&mut self, surface: usize, enhanced: SignedEnhancement) -> TfceResult<()>;
}

impl<F> EnhancedSink for F
where
    F: FnMut(usize, SignedEnhancement) -> TfceResult<()>,
{
    fn accept(&mut self, surface: usize, enhanced: SignedEnhancement) -> TfceResult<()> {
        self(surface, enhanced)
    }
}

/// One surface's inputs.
#[derive(Debug, Clone)]
pub struct SurfaceField {
    pub surface: usize,
    pub adjacency: AdjacencySet,
    pub field: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct StreamingTfce {
    params: TfceParams,
    ws: TfceWorkspace,
}

impl StreamingTfce {
    /// Errors
    /// ------
    /// - `TfceError::InvalidParameter` from [`TfceParams::validate`].
    pub fn new(params: TfceParams) -> TfceResult<Self> {
        params.validate()?;
        Ok(Self { params, ws: TfceWorkspace::default() })
    }

    /// Enhance one surface and hand the result to `sink`. Returns the
    /// largest enhanced magnitude of either sign.
    pub fn process<S: EnhancedSink>(
        &mut self, input: SurfaceField, sink: &mut S,
    ) -> TfceResult<f64> {
        let SurfaceField { surface, adjacency, field } = input;
        let enhanced = TfceTransform::new(&adjacency, self.params)?
            .enhance_signed_with(field.view(), &mut self.ws)?;
        drop(field);
        let max = enhanced.max_abs();
        sink.accept(surface, enhanced)?;
        Ok(max)
    }

    /// Drain `surfaces` in order; returns the per-surface maxima.
    pub fn run<I, S>(&mut self, surfaces: I, sink: &mut S) -> TfceResult<Vec<f64>>
    where
        I: IntoIterator<Item = SurfaceField>,
        S: EnhancedSink,
    {
        surfaces.into_iter().map(|input| self.process(input, sink)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Streaming must reproduce the in-memory transform surface by surface.
    //
    // Given
    // -----
    // - Two surfaces of different sizes fed through one workspace.
    //
    // Expect
    // ------
    // - The sink sees surfaces 0 and 1 in order with outputs equal to
    //   `TfceTransform::enhance_signed`, and the returned maxima match.
    fn streaming_matches_in_memory_per_surface() {
        let a = AdjacencySet::from_neighbour_lists(&[vec![1], vec![2], vec![]]).unwrap();
        let b = AdjacencySet::from_neighbour_lists(&[vec![1], vec![]]).unwrap();
        let fa = array![1.0, 2.5, -0.5];
        let fb = array![-3.0, -1.0];
        let params = TfceParams::default();

        let expected_a = TfceTransform::new(&a, params).unwrap().enhance_signed(fa.view()).unwrap();
        let expected_b = TfceTransform::new(&b, params).unwrap().enhance_signed(fb.view()).unwrap();

        let mut seen = Vec::new();
        let mut sink = |s: usize, e: SignedEnhancement| -> TfceResult<()> {
            seen.push((s, e));
            Ok(())
        };
        let mut stream = StreamingTfce::new(params).unwrap();
        let maxima = stream
            .run(
                vec![
                    SurfaceField { surface: 0, adjacency: a, field: fa },
                    SurfaceField { surface: 1, adjacency: b, field: fb },
                ],
                &mut sink,
            )
            .unwrap();

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (0, expected_a.clone()));
        assert_eq!(seen[1], (1, expected_b.clone()));
        assert_abs_diff_eq!(maxima[0], expected_a.max_abs());
        assert_abs_diff_eq!(maxima[1], expected_b.max_abs());
    }
}
