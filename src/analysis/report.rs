//! Flat per-location result tables.
//!
//! Layout
//! ------
//! One row per location, first column `ROI` holding the location id, then
//! blocks of one column per contrast, in this order: `tval_<name>…`,
//! `tfce_<name>…` and `negtfce_<name>…` when enhancement ran,
//! `pval_<name>…`, `pFDR_<name>…` and, when permutations ran,
//! `pFWER_<name>…`. Mediation tables follow the same order with the single
//! statistic named `Zval`: `ROI, Zval, [tfce_Zval, negtfce_Zval], pval,
//! pFDR, [pFWER]`.
//!
//! Raw p-values are written with NaN replaced by 1, the value the FDR step
//! ranked them with.
use crate::{
    analysis::errors::AnalysisResult,
    correction::{fdr_bh, fdr_bh_columns},
    permutation::{ObservedField, PermutationError, PermutationResult, SortedNull},
    utils::nan_to_one,
};
use ndarray::{Array1, Array2};
use std::{fs::File, io::Write, path::Path};

fn check_len(what: &'static str, expected: usize, found: usize) -> PermutationResult<()> {
    if expected != found {
        return Err(PermutationError::ShapeMismatch { what, expected, found });
    }
    Ok(())
}

/// Mass-univariate results, locations × contrasts.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub location_ids: Vec<String>,
    pub contrast_names: Vec<String>,
    pub tvalues: Array2<f64>,
    pub pvalues: Array2<f64>,
    pub qvalues: Array2<f64>,
    pub fwer: Option<Array2<f64>>,
    /// Positive and negative TFCE scores, when enhancement ran.
    pub tfce: Option<(Array2<f64>, Array2<f64>)>,
    /// Base seed of the permutation run, when one ran.
    pub seed: Option<u64>,
    /// Mixed-model locations that failed to fit, with the reason.
    pub failures: Vec<(usize, String)>,
}

impl ResultTable {
    /// Tabulate an observed regression field.
    ///
    /// `null`, when given, adds the FWER block using the observed TFCE
    /// score if enhancement ran and the signed t otherwise.
    ///
    /// Errors
    /// ------
    /// - `PermutationError::ShapeMismatch` when the ids, names or null do
    ///   not match the field.
    pub fn from_observed(
        location_ids: Vec<String>, contrast_names: Vec<String>, observed: &ObservedField,
        null: Option<&SortedNull>, seed: Option<u64>,
    ) -> PermutationResult<Self> {
        check_len("contrast names", observed.ncontrasts(), contrast_names.len())?;
        check_len("location ids", observed.statistics.ncols(), location_ids.len())?;
        let pvalues = observed.pvalues.t().to_owned();
        let qvalues = fdr_bh_columns(&pvalues);
        let fwer = match null {
            None => None,
            Some(null) => Some(null.fwer_field(&observed.fwer_statistic())?.reversed_axes()),
        };
        Ok(ResultTable {
            location_ids,
            contrast_names,
            tvalues: observed.statistics.t().to_owned(),
            pvalues,
            qvalues,
            fwer,
            tfce: observed.tfce().map(|(pos, neg)| (pos.t().to_owned(), neg.t().to_owned())),
            seed,
            failures: observed.failures.clone(),
        })
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["ROI".to_string()];
        let mut block = |prefix: &str| {
            header.extend(self.contrast_names.iter().map(|n| format!("{prefix}_{n}")));
        };
        block("tval");
        if self.tfce.is_some() {
            block("tfce");
            block("negtfce");
        }
        block("pval");
        block("pFDR");
        if self.fwer.is_some() {
            block("pFWER");
        }
        header
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> AnalysisResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;
        for (l, id) in self.location_ids.iter().enumerate() {
            let mut record = vec![id.clone()];
            record.extend(self.tvalues.row(l).iter().map(|v| v.to_string()));
            if let Some((pos, neg)) = &self.tfce {
                record.extend(pos.row(l).iter().map(|v| v.to_string()));
                record.extend(neg.row(l).iter().map(|v| v.to_string()));
            }
            record.extend(self.pvalues.row(l).iter().map(|v| nan_to_one(*v).to_string()));
            record.extend(self.qvalues.row(l).iter().map(|v| v.to_string()));
            if let Some(fwer) = &self.fwer {
                record.extend(fwer.row(l).iter().map(|v| v.to_string()));
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> AnalysisResult<()> {
        self.write_csv(File::create(path)?)
    }
}

/// Mediation results, one row per location.
#[derive(Debug, Clone, PartialEq)]
pub struct MediationTable {
    pub location_ids: Vec<String>,
    pub z: Array1<f64>,
    pub pvalues: Array1<f64>,
    pub qvalues: Array1<f64>,
    pub fwer: Option<Array1<f64>>,
    pub tfce: Option<(Array1<f64>, Array1<f64>)>,
    pub seed: Option<u64>,
    /// Locations whose indirect-effect variance was undefined.
    pub failures: Vec<(usize, String)>,
}

impl MediationTable {
    /// Tabulate an observed one-row z-field.
    ///
    /// Errors
    /// ------
    /// - `PermutationError::ShapeMismatch` for a field with more than one
    ///   row, or ids or a null that do not match it.
    pub fn from_observed(
        location_ids: Vec<String>, observed: &ObservedField, null: Option<&SortedNull>,
        seed: Option<u64>,
    ) -> PermutationResult<Self> {
        check_len("mediation statistic rows", 1, observed.ncontrasts())?;
        check_len("location ids", observed.statistics.ncols(), location_ids.len())?;
        let pvalues = observed.pvalues.row(0).to_owned();
        let qvalues = Array1::from(fdr_bh(&pvalues.to_vec()));
        let fwer = match null {
            None => None,
            Some(null) => {
                check_len("null contrasts", 1, null.ncontrasts())?;
                Some(null.fwer_row(0, observed.fwer_statistic().row(0))?)
            }
        };
        Ok(MediationTable {
            location_ids,
            z: observed.statistics.row(0).to_owned(),
            pvalues,
            qvalues,
            fwer,
            tfce: observed.tfce().map(|(pos, neg)| (pos.row(0).to_owned(), neg.row(0).to_owned())),
            seed,
            failures: observed.failures.clone(),
        })
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = vec!["ROI", "Zval"];
        if self.tfce.is_some() {
            header.extend(["tfce_Zval", "negtfce_Zval"]);
        }
        header.extend(["pval", "pFDR"]);
        if self.fwer.is_some() {
            header.push("pFWER");
        }
        header
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> AnalysisResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;
        for (l, id) in self.location_ids.iter().enumerate() {
            let mut record = vec![id.clone(), self.z[l].to_string()];
            if let Some((pos, neg)) = &self.tfce {
                record.push(pos[l].to_string());
                record.push(neg[l].to_string());
            }
            record.push(nan_to_one(self.pvalues[l]).to_string());
            record.push(self.qvalues[l].to_string());
            if let Some(fwer) = &self.fwer {
                record.push(fwer[l].to_string());
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> AnalysisResult<()> {
        self.write_csv(File::create(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::NullDistribution;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Column block order with and without TFCE and FWER.
    // - CSV bodies, including NaN p written as 1.
    // - Building tables from observed fields and a sorted null.
    // -------------------------------------------------------------------------

    fn table(fwer: bool) -> ResultTable {
        ResultTable {
            location_ids: vec!["lh_a".into(), "lh_b".into()],
            contrast_names: vec!["age".into(), "sex".into()],
            tvalues: array![[2.0, -1.0], [0.5, 3.0]],
            pvalues: array![[0.05, f64::NAN], [0.6, 0.01]],
            qvalues: array![[0.1, 1.0], [0.6, 0.02]],
            fwer: fwer.then(|| array![[0.2, 1.0], [1.0, 0.03]]),
            tfce: None,
            seed: None,
            failures: Vec::new(),
        }
    }

    #[test]
    fn header_orders_blocks_and_adds_fwer_only_when_present() {
        assert_eq!(
            table(false).header(),
            ["ROI", "tval_age", "tval_sex", "pval_age", "pval_sex", "pFDR_age", "pFDR_sex"]
        );
        let with = table(true).header();
        assert_eq!(&with[7..], ["pFWER_age", "pFWER_sex"]);
    }

    #[test]
    // Purpose
    // -------
    // The CSV body follows the header layout and writes NaN p as 1.
    //
    // Given
    // -----
    // - Two locations, two contrasts, FWER present.
    //
    // Expect
    // ------
    // - Row 1 is `lh_a,2,-1,0.05,1,0.1,1,0.2,1`.
    fn csv_rows_follow_header_layout() {
        let mut buf = Vec::new();
        table(true).write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ROI,tval_age"));
        assert_eq!(lines[1], "lh_a,2,-1,0.05,1,0.1,1,0.2,1");
    }

    #[test]
    // Purpose
    // -------
    // Enhanced scores are written next to the t-values.
    //
    // Given
    // -----
    // - The two-contrast table with FWER and TFCE fields attached.
    //
    // Expect
    // ------
    // - Header `ROI, tval_*, tfce_*, negtfce_*, pval_*, pFDR_*, pFWER_*`.
    // - Row 1 is `lh_a,2,-1,4,0,0,1.5,0.05,1,0.1,1,0.2,1`.
    fn tfce_blocks_follow_tvalues() {
        let mut t = table(true);
        t.tfce = Some((array![[4.0, 0.0], [0.0, 7.0]], array![[0.0, 1.5], [0.0, 0.0]]));

        assert_eq!(
            &t.header()[1..7],
            ["tval_age", "tval_sex", "tfce_age", "tfce_sex", "negtfce_age", "negtfce_sex"]
        );
        let mut buf = Vec::new();
        t.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some("lh_a,2,-1,4,0,0,1.5,0.05,1,0.1,1,0.2,1"));
    }

    #[test]
    fn mediation_table_layout() {
        let t = MediationTable {
            location_ids: vec!["roi1".into()],
            z: array![2.5],
            pvalues: array![0.0124],
            qvalues: array![0.0124],
            fwer: None,
            tfce: None,
            seed: None,
            failures: Vec::new(),
        };
        let mut buf = Vec::new();
        t.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "ROI,Zval,pval,pFDR\nroi1,2.5,0.0124,0.0124\n");

        let full = MediationTable {
            fwer: Some(array![0.04]),
            tfce: Some((array![12.0], array![0.0])),
            ..t
        };
        let mut buf = Vec::new();
        full.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "ROI,Zval,tfce_Zval,negtfce_Zval,pval,pFDR,pFWER\nroi1,2.5,12,0,0.0124,0.0124,0.04\n"
        );
    }

    #[test]
    // Purpose
    // -------
    // Observed fields are transposed into location rows, q-values come from
    // the raw p-values and FWER from the observed statistic.
    //
    // Given
    // -----
    // - One contrast over three locations, t = (3, −1, 0.5).
    // - A null of four maxima (0.5, 1, 2, 4).
    //
    // Expect
    // ------
    // - tvalues is 3×1; FWER = (1/2, 1, 1) by the `(P − idx + 1)/P` rule,
    //   capped at 1.
    // - Mismatched location ids are rejected.
    fn builds_table_from_observed_field() {
        let observed = ObservedField::new(
            array![[3.0, -1.0, 0.5]],
            array![[0.01, 0.3, 0.6]],
            vec![(2, "did not converge".into())],
            None,
        )
        .unwrap();
        let null = NullDistribution::new(1, array![[2.0, 0.5, 4.0, 1.0]]).unwrap().finalize();
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let t =
            ResultTable::from_observed(ids.clone(), vec!["x".into()], &observed, Some(&null), Some(3))
                .unwrap();
        assert_eq!(t.tvalues, array![[3.0], [-1.0], [0.5]]);
        assert_eq!(t.fwer, Some(array![[0.5], [1.0], [1.0]]));
        assert!(t.qvalues.iter().zip(t.pvalues.iter()).all(|(q, p)| q >= p));
        assert_eq!(t.failures.len(), 1);
        assert!(t.tfce.is_none());

        assert!(ResultTable::from_observed(ids[..2].to_vec(), vec!["x".into()], &observed, None, None)
            .is_err());
        let m = MediationTable::from_observed(ids, &observed, Some(&null), Some(3)).unwrap();
        assert_eq!(m.fwer, Some(array![0.5, 1.0, 1.0]));
        assert_eq!(m.z, array![3.0, -1.0, 0.5]);
    }
}
