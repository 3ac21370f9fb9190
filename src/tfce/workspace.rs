//! Reusable scratch buffers for the TFCE sweep.
//!
//! One workspace per thread; [`TfceWorkspace::reset`] resizes lazily, so a
//! workspace can serve surfaces of different sizes in turn without
//! reallocating once it has grown to the largest.

/// Disjoint-set forest with weighted component sizes plus the sort order
/// of the current field.
#[derive(Debug, Clone, Default)]
pub struct TfceWorkspace {
    parent: Vec<usize>,
    size: Vec<f64>,
    active: Vec<bool>,
    pub(crate) order: Vec<usize>,
}

impl TfceWorkspace {
    pub fn new(m: usize) -> Self {
        let mut ws = Self::default();
        ws.reset(m);
        ws
    }

    /// Clear all sets and size the buffers for `m` locations.
    pub fn reset(&mut self, m: usize) {
        self.parent.clear();
        self.parent.extend(0..m);
        self.size.clear();
        self.size.resize(m, 0.0);
        self.active.clear();
        self.active.resize(m, false);
        self.order.clear();
    }

    pub fn capacity(&self) -> usize {
        self.parent.capacity()
    }

    #[inline]
    pub(crate) fn is_active(&self, i: usize) -> bool {
        self.active[i]
    }

    /// Turn location `i` into a singleton set of weight `w`.
    #[inline]
    pub(crate) fn activate(&mut self, i: usize, w: f64) {
        self.active[i] = true;
        self.parent[i] = i;
        self.size[i] = w;
    }

    /// Root of `i` with path halving.
    #[inline]
    pub(crate) fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            let grand = self.parent[self.parent[i]];
            self.parent[i] = grand;
            i = grand;
        }
        i
    }

    /// Merge the sets of `a` and `b`; the heavier root wins.
    #[inline]
    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] { (ra, rb) } else { (rb, ra) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }

    /// Weighted size of the set containing `i`.
    #[inline]
    pub(crate) fn component_size(&mut self, i: usize) -> f64 {
        let r = self.find(i);
        self.size[r]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_accumulates_weights_and_reset_clears() {
        let mut ws = TfceWorkspace::new(4);
        for (i, w) in [(0, 1.0), (1, 2.0), (3, 0.5)] {
            ws.activate(i, w);
        }

        ws.union(0, 1);
        ws.union(1, 0);

        assert_eq!(ws.component_size(0), 3.0);
        assert_eq!(ws.component_size(1), 3.0);
        assert_eq!(ws.component_size(3), 0.5);
        assert!(!ws.is_active(2));

        ws.reset(2);
        assert!(!ws.is_active(0));
        assert_eq!(ws.find(1), 1);
    }
}
