//! Design construction from named columns.
//!
//! Purpose
//! -------
//! Turn named columns coming from an external tabular reader into a
//! [`DesignMatrix`] with an automatic intercept, optional standardisation
//! and an optional two-way interaction, and turn categorical columns into
//! [`GroupLabels`].
//!
//! Key behaviors
//! -------------
//! - [`ColumnSource`] is the boundary to the tabular reader: it only has to
//!   hand out numeric and categorical columns by name.
//! - [`ColumnTable`] is a small in-memory [`ColumnSource`] for callers that
//!   already hold their columns (and for tests).
//! - [`DesignBuilder`] resolves regressors in the order given, prepends an
//!   intercept, optionally standardises every regressor, and appends the
//!   interaction block `<a>_p`, `<b>_p`, `<a>.X.<b>` built from standardised
//!   members.
//!
//! Invariants & assumptions
//! ------------------------
//! - Sources are complete-case: missing-value filtering happens upstream.
//!   Non-finite values are still rejected by [`DesignMatrix::new`].
//! - Standardisation divides by the population standard deviation
//!   (denominator `n`).
use crate::design::{
    data::DesignMatrix,
    errors::{DesignError, DesignResult},
    groups::GroupLabels,
};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Read-only access to named columns of a complete-case table.
pub trait ColumnSource {
    /// Number of rows shared by every column.
    fn nrows(&self) -> usize;

    /// Numeric column by name.
    fn numeric(&self, name: &str) -> Option<&[f64]>;

    /// Categorical column by name.
    fn categorical(&self, name: &str) -> Option<&[String]>;
}

/// In-memory [`ColumnSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    nrows: usize,
    numeric: BTreeMap<String, Vec<f64>>,
    categorical: BTreeMap<String, Vec<String>>,
}

impl ColumnTable {
    pub fn new(nrows: usize) -> Self {
        Self { nrows, ..Default::default() }
    }

    /// Add (or replace) a numeric column.
    pub fn with_numeric(mut self, name: &str, values: Vec<f64>) -> DesignResult<Self> {
        self.check_len(name, values.len())?;
        self.numeric.insert(name.to_string(), values);
        Ok(self)
    }

    /// Add (or replace) a categorical column.
    pub fn with_categorical(mut self, name: &str, values: Vec<String>) -> DesignResult<Self> {
        self.check_len(name, values.len())?;
        self.categorical.insert(name.to_string(), values);
        Ok(self)
    }

    fn check_len(&self, _name: &str, len: usize) -> DesignResult<()> {
        if len != self.nrows {
            return Err(DesignError::MismatchedRows {
                what: "table column",
                expected: self.nrows,
                found: len,
            });
        }
        Ok(())
    }
}

impl ColumnSource for ColumnTable {
    fn nrows(&self) -> usize {
        self.nrows
    }

    fn numeric(&self, name: &str) -> Option<&[f64]> {
        self.numeric.get(name).map(Vec::as_slice)
    }

    fn categorical(&self, name: &str) -> Option<&[String]> {
        self.categorical.get(name).map(Vec::as_slice)
    }
}

/// Builder for a [`DesignMatrix`] over a [`ColumnSource`].
///
/// Example
/// -------
/// ```rust
/// # use tfce_stats::design::{ColumnTable, DesignBuilder};
/// let table = ColumnTable::new(4)
///     .with_numeric("age", vec![20.0, 30.0, 40.0, 50.0]).unwrap()
///     .with_numeric("dose", vec![1.0, 0.0, 1.0, 0.5]).unwrap();
/// let design = DesignBuilder::new(&table).regressors(&["age", "dose"]).build().unwrap();
/// assert_eq!(design.ncols(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct DesignBuilder<'a, S: ColumnSource> {
    source: &'a S,
    regressors: Vec<String>,
    interaction: Option<(String, String)>,
    scale: bool,
}

impl<'a, S: ColumnSource> DesignBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source, regressors: Vec::new(), interaction: None, scale: false }
    }

    pub fn regressors(mut self, names: &[&str]) -> Self {
        self.regressors = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append the standardised members of `a` and `b` and their product.
    pub fn interaction(mut self, a: &str, b: &str) -> Self {
        self.interaction = Some((a.to_string(), b.to_string()));
        self
    }

    /// Standardise every plain regressor (demean, unit population variance).
    pub fn scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    /// Resolve all columns and assemble the design.
    ///
    /// Errors
    /// ------
    /// - `DesignError::MissingColumn` for an unknown regressor name.
    /// - `DesignError::ZeroVariance` when a standardised column is constant.
    /// - Any error raised by [`DesignMatrix::new`].
    pub fn build(&self) -> DesignResult<DesignMatrix> {
        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
        for name in &self.regressors {
            let raw = self.lookup(name)?;
            let values = if self.scale { standardize(raw, name)? } else { raw.to_vec() };
            columns.push((name.clone(), values));
        }
        if let Some((a, b)) = &self.interaction {
            let za = standardize(self.lookup(a)?, a)?;
            let zb = standardize(self.lookup(b)?, b)?;
            let product = za.iter().zip(&zb).map(|(x, y)| x * y).collect();
            columns.push((format!("{a}_p"), za));
            columns.push((format!("{b}_p"), zb));
            columns.push((format!("{a}.X.{b}"), product));
        }
        with_intercept(self.source.nrows(), &columns)
    }

    fn lookup(&self, name: &str) -> DesignResult<&'a [f64]> {
        self.source.numeric(name).ok_or_else(|| DesignError::MissingColumn { name: name.to_string() })
    }
}

/// Collapse one or more categorical columns into block labels.
pub fn group_labels<S: ColumnSource>(source: &S, names: &[&str]) -> DesignResult<GroupLabels> {
    let mut factors: Vec<&[String]> = Vec::with_capacity(names.len());
    for name in names {
        let column = source
            .categorical(name)
            .ok_or_else(|| DesignError::MissingColumn { name: name.to_string() })?;
        factors.push(column);
    }
    GroupLabels::composite(&factors)
}

/// Assemble `[1 | columns...]` into a validated design.
pub fn with_intercept(nrows: usize, columns: &[(String, Vec<f64>)]) -> DesignResult<DesignMatrix> {
    let k = columns.len() + 1;
    let mut values = Array2::<f64>::ones((nrows, k));
    for (j, (_, column)) in columns.iter().enumerate() {
        if column.len() != nrows {
            return Err(DesignError::MismatchedRows {
                what: "regressor",
                expected: nrows,
                found: column.len(),
            });
        }
        for (i, &v) in column.iter().enumerate() {
            values[[i, j + 1]] = v;
        }
    }
    let names = columns.iter().map(|(name, _)| name.clone()).collect();
    DesignMatrix::new(values, names)
}

/// Demean and divide by the population standard deviation.
pub fn standardize(values: &[f64], name: &str) -> DesignResult<Vec<f64>> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let sd = var.sqrt();
    if !(sd > 0.0) {
        return Err(DesignError::ZeroVariance { name: name.to_string() });
    }
    Ok(values.iter().map(|v| (v - mean) / sd).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Intercept insertion and regressor ordering.
    // - Standardisation and interaction-term construction.
    // - Missing-column and grouping errors.
    //
    // They intentionally DO NOT cover:
    // - Reading tables from disk (external collaborator).
    // -------------------------------------------------------------------------

    fn table() -> ColumnTable {
        ColumnTable::new(4)
            .with_numeric("age", vec![20.0, 30.0, 40.0, 50.0])
            .unwrap()
            .with_numeric("dose", vec![1.0, 3.0, 1.0, 3.0])
            .unwrap()
            .with_categorical("subject", vec!["a", "a", "b", "b"].into_iter().map(String::from).collect())
            .unwrap()
            .with_categorical("site", vec!["x", "y", "x", "y"].into_iter().map(String::from).collect())
            .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify the builder prepends an intercept and keeps regressor order.
    //
    // Given
    // -----
    // - Regressors `["dose", "age"]`, no scaling.
    //
    // Expect
    // ------
    // - Column 0 is all ones; columns 1 and 2 are dose and age.
    fn build_prepends_intercept_in_given_order() {
        let t = table();

        let design = DesignBuilder::new(&t).regressors(&["dose", "age"]).build().unwrap();

        assert_eq!(design.column(0).to_vec(), vec![1.0; 4]);
        assert_eq!(design.column(1).to_vec(), vec![1.0, 3.0, 1.0, 3.0]);
        assert_eq!(design.contrast_names(), &["dose".to_string(), "age".to_string()]);
    }

    #[test]
    fn build_scaled_columns_have_zero_mean_unit_variance() {
        let t = table();

        let design = DesignBuilder::new(&t).regressors(&["age"]).scale(true).build().unwrap();

        let col = design.column(1);
        let mean = col.sum() / 4.0;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(var, 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Check the interaction block layout and the product column.
    //
    // Given
    // -----
    // - `interaction("age", "dose")` with no plain regressors.
    //
    // Expect
    // ------
    // - Names `age_p`, `dose_p`, `age.X.dose`; last column equals the
    //   product of the two standardised columns.
    fn build_interaction_appends_scaled_members_and_product() {
        let t = table();

        let design = DesignBuilder::new(&t).interaction("age", "dose").build().unwrap();

        assert_eq!(
            design.contrast_names(),
            &["age_p".to_string(), "dose_p".to_string(), "age.X.dose".to_string()]
        );
        for i in 0..4 {
            let v = design.values();
            assert_relative_eq!(v[[i, 3]], v[[i, 1]] * v[[i, 2]], epsilon = 1e-12);
        }
    }

    #[test]
    fn build_reports_missing_column() {
        let t = table();

        let err = DesignBuilder::new(&t).regressors(&["weight"]).build().unwrap_err();

        assert_eq!(err, DesignError::MissingColumn { name: "weight".to_string() });
    }

    #[test]
    fn standardize_rejects_constant_column() {
        let err = standardize(&[2.0, 2.0, 2.0], "flat").unwrap_err();

        assert_eq!(err, DesignError::ZeroVariance { name: "flat".to_string() });
    }

    #[test]
    fn group_labels_builds_composite_key() {
        let t = table();

        let groups = group_labels(&t, &["subject", "site"]).unwrap();

        assert_eq!(groups.labels()[0], "a_x");
        assert_eq!(groups.blocks().len(), 4);
    }
}
