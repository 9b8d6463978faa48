//! Data Processor Module
//! Joins the two tables and derives the aggregates behind each chart view.

use crate::config::AppConfig;
use crate::data::loader::{CODE_COL, COUNT_COL, DATE_COL, DESCRIPTION_COL, PROVINCE_COL};
use chrono::NaiveDate;
use log::{debug, warn};
use polars::prelude::*;
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use thiserror::Error;

/// Fixed pattern of the `fecha` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar year derived from `fecha` in the merged frame
pub const YEAR_COL: &str = "anio";

const ROW_COL: &str = "row";
const PARSED_DATE_COL: &str = "fecha_parsed";

/// Label of the pie slice that collects everything outside the top activities
pub const OTHER_LABEL: &str = "Resto";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Invalid date {value:?} in row {row}, expected YYYY-MM-DD")]
    InvalidDate { row: usize, value: String },
    #[error("No job records for year {0}")]
    NoDataForYear(i32),
    #[error("Dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

/// Job count of one activity as a share of its province total.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityShare {
    pub activity: String,
    pub jobs: i64,
    pub percent: f64,
}

/// Top activities of a single province.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceBreakdown {
    pub province: String,
    /// Sum over every activity of the province, not only the top ones
    pub total: i64,
    pub shares: Vec<ActivityShare>,
}

impl ProvinceBreakdown {
    pub fn percent_sum(&self) -> f64 {
        self.shares.iter().map(|s| s.percent).sum()
    }
}

/// One slice of the national pie.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub jobs: i64,
    pub percent: f64,
}

/// Top activities nationwide plus the remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct NationalDistribution {
    pub top: Vec<(String, i64)>,
    /// National total minus the top activities, never negative
    pub other: i64,
    pub total: i64,
}

impl NationalDistribution {
    /// Slices to draw; the remainder only appears when positive.
    pub fn slices(&self) -> Vec<PieSlice> {
        let percent = |jobs: i64| {
            if self.total > 0 {
                jobs as f64 / self.total as f64 * 100.0
            } else {
                0.0
            }
        };

        let mut slices: Vec<PieSlice> = self
            .top
            .iter()
            .map(|(label, jobs)| PieSlice {
                label: label.clone(),
                jobs: *jobs,
                percent: percent(*jobs),
            })
            .collect();

        if self.other > 0 {
            slices.push(PieSlice {
                label: OTHER_LABEL.to_string(),
                jobs: self.other,
                percent: percent(self.other),
            });
        }

        slices
    }
}

/// Total job posts of one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearTotal {
    pub year: i32,
    pub jobs: i64,
}

/// Province × activity job sums for a single year.
///
/// Built from the grouped frame; sums are clamped to zero. Records without an
/// activity description are left out.
#[derive(Debug, Clone)]
pub struct ActivityMatrix {
    cells: BTreeMap<String, BTreeMap<String, i64>>,
}

impl ActivityMatrix {
    /// Provinces in ascending order.
    pub fn provinces(&self) -> Vec<&str> {
        self.cells.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Activity sums of one province.
    pub fn row(&self, province: &str) -> Option<&BTreeMap<String, i64>> {
        self.cells.get(province)
    }

    /// Top `top_n` activities of a province as percentages of its total.
    pub fn breakdown(&self, province: &str, top_n: usize) -> Option<ProvinceBreakdown> {
        let row = self.row(province)?;
        let total: i64 = row.values().sum();

        let shares = rank_top(row.iter(), top_n)
            .into_iter()
            .map(|(activity, jobs)| ActivityShare {
                percent: if total > 0 {
                    jobs as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
                activity,
                jobs,
            })
            .collect();

        Some(ProvinceBreakdown {
            province: province.to_string(),
            total,
            shares,
        })
    }

    /// Nationwide sum of each activity.
    pub fn activity_totals(&self) -> BTreeMap<String, i64> {
        let mut totals: BTreeMap<String, i64> = BTreeMap::new();
        for row in self.cells.values() {
            for (activity, jobs) in row {
                *totals.entry(activity.clone()).or_insert(0) += jobs;
            }
        }
        totals
    }

    /// Top `top_n` activities nationwide and the remainder.
    pub fn national_distribution(&self, top_n: usize) -> NationalDistribution {
        let totals = self.activity_totals();
        let total: i64 = totals.values().sum();
        let top = rank_top(totals.iter(), top_n);
        let top_sum: i64 = top.iter().map(|(_, jobs)| jobs).sum();

        NationalDistribution {
            top,
            other: (total - top_sum).max(0),
            total,
        }
    }
}

/// Everything the chart views need, computed once per load.
#[derive(Debug, Clone)]
pub struct EmploymentSummary {
    pub year: i32,
    /// One entry per province, in ascending province order
    pub breakdowns: Vec<ProvinceBreakdown>,
    pub national: NationalDistribution,
    pub yearly: Vec<YearTotal>,
    pub record_count: usize,
}

/// Highest values first; ties fall back to the label so the order is stable.
fn rank_top<'a>(
    values: impl Iterator<Item = (&'a String, &'a i64)>,
    top_n: usize,
) -> Vec<(String, i64)> {
    let mut ranked: Vec<(String, i64)> = values.map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0)));
    ranked.truncate(top_n);
    ranked
}

/// `expr` with negative values replaced by zero.
fn clamp_at_zero(expr: Expr) -> Expr {
    when(expr.clone().lt(lit(0i64)))
        .then(lit(0i64))
        .otherwise(expr)
}

/// Handles joining and aggregation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Left join the job posts with the activity codes, parse `fecha` and derive the year.
    ///
    /// Job counts are kept as loaded, negative values included. The result has the
    /// columns `zona_prov`, `clae2`, `clae2_desc`, `fecha` (date), `anio`, `puestos`
    /// in input row order.
    pub fn merge(jobs: &DataFrame, codes: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let lookup = codes
            .clone()
            .lazy()
            .unique_stable(Some(vec![CODE_COL.into()]), UniqueKeepStrategy::First)
            .collect()?;

        let duplicates = codes.height() - lookup.height();
        if duplicates > 0 {
            warn!(
                "{} duplicate activity codes in lookup table, keeping first description",
                duplicates
            );
        }

        let date_options = StrptimeOptions {
            format: Some(DATE_FORMAT.into()),
            strict: false,
            exact: true,
            cache: true,
        };

        let joined = jobs
            .clone()
            .lazy()
            .with_row_index(ROW_COL, None)
            .left_join(lookup.lazy(), col(CODE_COL), col(CODE_COL))
            .with_column(col(DATE_COL).str().to_date(date_options).alias(PARSED_DATE_COL))
            .sort([ROW_COL], SortMultipleOptions::default())
            .collect()?;

        let invalid = joined
            .clone()
            .lazy()
            .filter(col(PARSED_DATE_COL).is_null())
            .limit(1)
            .collect()?;

        if invalid.height() > 0 {
            let row = invalid.column(ROW_COL)?.idx()?.get(0).unwrap_or_default() as usize;
            let value = invalid
                .column(DATE_COL)?
                .str()?
                .get(0)
                .unwrap_or_default()
                .to_string();
            return Err(ProcessorError::InvalidDate { row, value });
        }

        let merged = joined
            .lazy()
            .select([
                col(PROVINCE_COL),
                col(CODE_COL),
                col(DESCRIPTION_COL),
                col(PARSED_DATE_COL).alias(DATE_COL),
                col(PARSED_DATE_COL).dt().year().alias(YEAR_COL),
                col(COUNT_COL),
            ])
            .collect()?;

        debug!("Merged {} job rows", merged.height());
        Ok(merged)
    }

    /// Sum one year's job counts per province and activity description.
    pub fn activity_matrix(merged: &DataFrame, year: i32) -> Result<ActivityMatrix, ProcessorError> {
        let sums = merged
            .clone()
            .lazy()
            .filter(
                col(YEAR_COL)
                    .eq(lit(year))
                    .and(col(DESCRIPTION_COL).is_not_null()),
            )
            .group_by([col(PROVINCE_COL), col(DESCRIPTION_COL)])
            .agg([col(COUNT_COL).sum()])
            .with_column(clamp_at_zero(col(COUNT_COL)).alias(COUNT_COL))
            .collect()?;

        let provinces = sums.column(PROVINCE_COL)?.str()?;
        let activities = sums.column(DESCRIPTION_COL)?.str()?;
        let jobs = sums.column(COUNT_COL)?.i64()?;

        let mut cells: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
        for ((province, activity), jobs) in provinces.into_iter().zip(activities).zip(jobs) {
            if let (Some(province), Some(activity), Some(jobs)) = (province, activity, jobs) {
                cells
                    .entry(province.to_string())
                    .or_default()
                    .insert(activity.to_string(), jobs);
            }
        }

        debug!("Activity matrix for {}: {} provinces", year, cells.len());
        Ok(ActivityMatrix { cells })
    }

    /// Total job posts per year for rows strictly before `cutoff`, oldest first.
    ///
    /// Each year sums the loaded counts; only a negative year total is clamped.
    pub fn yearly_totals(
        merged: &DataFrame,
        cutoff: NaiveDate,
    ) -> Result<Vec<YearTotal>, ProcessorError> {
        let totals = merged
            .clone()
            .lazy()
            .filter(col(DATE_COL).lt(lit(cutoff).cast(DataType::Date)))
            .group_by([col(YEAR_COL)])
            .agg([col(COUNT_COL).sum()])
            .with_column(clamp_at_zero(col(COUNT_COL)).alias(COUNT_COL))
            .sort([YEAR_COL], SortMultipleOptions::default())
            .collect()?;

        let years = totals.column(YEAR_COL)?.i32()?;
        let jobs = totals.column(COUNT_COL)?.i64()?;

        Ok(years
            .into_iter()
            .zip(jobs)
            .filter_map(|(year, jobs)| {
                Some(YearTotal {
                    year: year?,
                    jobs: jobs.unwrap_or(0),
                })
            })
            .collect())
    }

    /// Compute every chart view for the configured year and cutoff.
    pub fn summarize(
        merged: &DataFrame,
        config: &AppConfig,
    ) -> Result<EmploymentSummary, ProcessorError> {
        let matrix = Self::activity_matrix(merged, config.breakdown_year)?;
        if matrix.is_empty() {
            return Err(ProcessorError::NoDataForYear(config.breakdown_year));
        }

        let breakdowns: Vec<ProvinceBreakdown> = matrix
            .provinces()
            .par_iter()
            .filter_map(|province| matrix.breakdown(province, config.province_top_n))
            .collect();

        let national = matrix.national_distribution(config.national_top_n);
        let yearly = Self::yearly_totals(merged, config.line_cutoff)?;

        debug!(
            "Summary: {} provinces, {} years, national total {}",
            breakdowns.len(),
            yearly.len(),
            national.total
        );

        Ok(EmploymentSummary {
            year: config.breakdown_year,
            breakdowns,
            national,
            yearly,
            record_count: merged.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn jobs_frame(rows: &[(&str, i64, &str, i64)]) -> DataFrame {
        let provinces: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let codes: Vec<i64> = rows.iter().map(|r| r.1).collect();
        let dates: Vec<&str> = rows.iter().map(|r| r.2).collect();
        let counts: Vec<i64> = rows.iter().map(|r| r.3).collect();
        df!(
            PROVINCE_COL => provinces,
            CODE_COL => codes,
            DATE_COL => dates,
            COUNT_COL => counts
        )
        .unwrap()
    }

    fn codes_frame(rows: &[(i64, &str)]) -> DataFrame {
        let codes: Vec<i64> = rows.iter().map(|r| r.0).collect();
        let descriptions: Vec<&str> = rows.iter().map(|r| r.1).collect();
        df!(CODE_COL => codes, DESCRIPTION_COL => descriptions).unwrap()
    }

    /// Merged frame where each activity description maps to its own code.
    fn merged(rows: &[(&str, &str, &str, i64)]) -> DataFrame {
        let mut activities: Vec<&str> = rows.iter().map(|r| r.1).collect();
        activities.sort_unstable();
        activities.dedup();

        let code_of = |activity: &str| {
            activities.iter().position(|a| *a == activity).unwrap_or(0) as i64 + 1
        };
        let jobs: Vec<(&str, i64, &str, i64)> = rows
            .iter()
            .map(|&(province, activity, day, count)| (province, code_of(activity), day, count))
            .collect();
        let codes: Vec<(i64, &str)> = activities
            .iter()
            .enumerate()
            .map(|(i, a)| (i as i64 + 1, *a))
            .collect();

        DataProcessor::merge(&jobs_frame(&jobs), &codes_frame(&codes)).unwrap()
    }

    #[test]
    fn test_merge_left_join_keeps_unmatched_codes() {
        let jobs = jobs_frame(&[("A", 1, "2022-03-01", 10), ("A", 99, "2022-03-01", 4)]);
        let codes = codes_frame(&[(1, "Agro")]);

        let merged = DataProcessor::merge(&jobs, &codes).unwrap();
        assert_eq!(merged.height(), 2);

        let descriptions = merged.column(DESCRIPTION_COL).unwrap().str().unwrap();
        assert_eq!(descriptions.get(0), Some("Agro"));
        assert_eq!(descriptions.get(1), None);
        assert_eq!(merged.column(YEAR_COL).unwrap().i32().unwrap().get(0), Some(2022));
    }

    #[test]
    fn test_merge_keeps_negative_counts() {
        let jobs = jobs_frame(&[("A", 1, "2022-03-01", -99)]);
        let merged = DataProcessor::merge(&jobs, &codes_frame(&[(1, "Agro")])).unwrap();
        assert_eq!(merged.column(COUNT_COL).unwrap().i64().unwrap().get(0), Some(-99));
    }

    #[test]
    fn test_merge_first_description_wins() {
        let codes = codes_frame(&[(1, "First"), (1, "Second")]);
        let merged = DataProcessor::merge(&jobs_frame(&[("A", 1, "2022-01-01", 1)]), &codes).unwrap();
        assert_eq!(merged.height(), 1);
        assert_eq!(
            merged.column(DESCRIPTION_COL).unwrap().str().unwrap().get(0),
            Some("First")
        );
    }

    #[test]
    fn test_merge_rejects_malformed_date() {
        let jobs = jobs_frame(&[
            ("A", 1, "2022-01-01", 1),
            ("A", 1, "01/02/2022", 1),
            ("A", 1, "2022-13-01", 1),
        ]);
        match DataProcessor::merge(&jobs, &codes_frame(&[(1, "Agro")])) {
            Err(ProcessorError::InvalidDate { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "01/02/2022");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_provincial_aggregate_example() {
        let records = merged(&[
            ("A", "X", "2022-01-01", 10),
            ("A", "Y", "2022-01-01", 5),
            ("A", "X", "2021-01-01", 100),
        ]);
        let matrix = DataProcessor::activity_matrix(&records, 2022).unwrap();
        let row = matrix.row("A").unwrap();
        assert_eq!(row.get("X"), Some(&10));
        assert_eq!(row.get("Y"), Some(&5));
        assert_eq!(row.len(), 2);

        let breakdown = matrix.breakdown("A", 10).unwrap();
        assert_eq!(breakdown.total, 15);
        assert_eq!(breakdown.shares[0].activity, "X");
        assert!((breakdown.shares[0].percent - 66.666_666).abs() < 1e-3);
        assert!((breakdown.percent_sum() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_counts_offset_before_clamping() {
        let records = merged(&[("A", "X", "2022-01-01", 10), ("A", "X", "2022-02-01", -3)]);
        let matrix = DataProcessor::activity_matrix(&records, 2022).unwrap();
        assert_eq!(matrix.row("A").unwrap().get("X"), Some(&7));
    }

    #[test]
    fn test_negative_sum_is_clamped_to_zero() {
        let records = merged(&[
            ("A", "X", "2022-01-01", -5),
            ("A", "X", "2022-02-01", 2),
            ("A", "Y", "2022-01-01", 4),
            ("B", "X", "2022-01-01", -99),
        ]);
        let matrix = DataProcessor::activity_matrix(&records, 2022).unwrap();
        assert_eq!(matrix.row("A").unwrap().get("X"), Some(&0));
        assert_eq!(matrix.row("B").unwrap().get("X"), Some(&0));

        let breakdown = matrix.breakdown("A", 10).unwrap();
        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.shares[0].activity, "Y");
        assert!((breakdown.shares[0].percent - 100.0).abs() < 1e-9);
        assert_eq!(breakdown.shares[1].percent, 0.0);

        let national = matrix.national_distribution(7);
        assert_eq!(national.total, 4);
        assert!(national.top.iter().all(|(_, jobs)| *jobs >= 0));
    }

    #[test]
    fn test_breakdown_top_ten_percentages() {
        let names: Vec<String> = (1..=12).map(|i| format!("act{:02}", i)).collect();
        let rows: Vec<(&str, &str, &str, i64)> = names
            .iter()
            .zip(1..=12)
            .map(|(name, i)| ("B", name.as_str(), "2022-06-01", i * 10))
            .collect();
        let matrix = DataProcessor::activity_matrix(&merged(&rows), 2022).unwrap();
        let breakdown = matrix.breakdown("B", 10).unwrap();

        assert_eq!(breakdown.shares.len(), 10);
        assert_eq!(breakdown.shares[0].activity, "act12");
        assert_eq!(breakdown.shares[9].activity, "act03");

        let total: i64 = (1..=12).map(|i| i * 10).sum();
        let top_sum: i64 = (3..=12).map(|i| i * 10).sum();
        assert_eq!(breakdown.total, total);
        let expected = top_sum as f64 / total as f64 * 100.0;
        assert!(breakdown.percent_sum() <= 100.0);
        assert!((breakdown.percent_sum() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_zero_total_has_zero_percent() {
        let records = merged(&[("C", "X", "2022-01-01", 0)]);
        let matrix = DataProcessor::activity_matrix(&records, 2022).unwrap();
        let breakdown = matrix.breakdown("C", 10).unwrap();
        assert_eq!(breakdown.shares[0].percent, 0.0);
    }

    #[test]
    fn test_matrix_skips_missing_descriptions_and_sorts_provinces() {
        let jobs = jobs_frame(&[
            ("Salta", 1, "2022-01-01", 1),
            ("CABA", 1, "2022-01-01", 1),
            ("Z", 42, "2022-01-01", 50),
        ]);
        let records = DataProcessor::merge(&jobs, &codes_frame(&[(1, "X")])).unwrap();
        let matrix = DataProcessor::activity_matrix(&records, 2022).unwrap();
        assert_eq!(matrix.provinces(), vec!["CABA", "Salta"]);
        assert!(matrix.breakdown("Z", 10).is_none());
    }

    #[test]
    fn test_ranking_ties_break_by_name() {
        let records = merged(&[
            ("A", "b", "2022-01-01", 5),
            ("A", "a", "2022-01-01", 5),
            ("A", "c", "2022-01-01", 7),
        ]);
        let matrix = DataProcessor::activity_matrix(&records, 2022).unwrap();
        let names: Vec<String> = matrix
            .breakdown("A", 10)
            .unwrap()
            .shares
            .into_iter()
            .map(|s| s.activity)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_national_other_bucket() {
        let names: Vec<String> = (1..=9).map(|i| format!("act{}", i)).collect();
        let rows: Vec<(&str, &str, &str, i64)> = names
            .iter()
            .zip(1..=9)
            .map(|(name, i)| {
                let province = if i % 2 == 0 { "A" } else { "B" };
                (province, name.as_str(), "2022-01-01", i)
            })
            .collect();
        let matrix = DataProcessor::activity_matrix(&merged(&rows), 2022).unwrap();
        let national = matrix.national_distribution(7);

        assert_eq!(national.top.len(), 7);
        assert_eq!(national.total, 45);
        // act1 and act2 fall outside the top seven
        assert_eq!(national.other, 3);

        let slices = national.slices();
        assert_eq!(slices.len(), 8);
        assert_eq!(slices[7].label, OTHER_LABEL);
        let percent_sum: f64 = slices.iter().map(|s| s.percent).sum();
        assert!((percent_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_national_other_hidden_when_top_covers_total() {
        let records = merged(&[("A", "X", "2022-01-01", 3), ("B", "Y", "2022-01-01", 4)]);
        let matrix = DataProcessor::activity_matrix(&records, 2022).unwrap();
        let national = matrix.national_distribution(7);
        assert_eq!(national.other, 0);
        assert!(national.slices().iter().all(|s| s.label != OTHER_LABEL));
    }

    #[test]
    fn test_yearly_totals_exclude_cutoff() {
        let records = merged(&[
            ("A", "X", "2021-05-01", 10),
            ("A", "X", "2021-12-01", 5),
            ("B", "Y", "2022-12-31", 7),
            ("A", "X", "2023-01-01", 1000),
            ("A", "X", "2023-06-01", 1000),
        ]);
        let yearly = DataProcessor::yearly_totals(&records, date("2023-01-01")).unwrap();
        assert_eq!(
            yearly,
            vec![
                YearTotal { year: 2021, jobs: 15 },
                YearTotal { year: 2022, jobs: 7 },
            ]
        );
    }

    #[test]
    fn test_yearly_totals_sum_loaded_counts() {
        let records = merged(&[
            ("A", "X", "2021-01-01", 10),
            ("B", "Y", "2021-06-01", -3),
            ("A", "X", "2022-01-01", -4),
        ]);
        let yearly = DataProcessor::yearly_totals(&records, date("2023-01-01")).unwrap();
        assert_eq!(
            yearly,
            vec![
                YearTotal { year: 2021, jobs: 7 },
                YearTotal { year: 2022, jobs: 0 },
            ]
        );
    }

    #[test]
    fn test_summarize_requires_data_for_year() {
        let records = merged(&[("A", "X", "2021-01-01", 1)]);
        let err = DataProcessor::summarize(&records, &AppConfig::default()).unwrap_err();
        assert!(matches!(err, ProcessorError::NoDataForYear(2022)));
    }

    #[test]
    fn test_summarize_builds_every_view() {
        let records = merged(&[
            ("Salta", "X", "2022-01-01", 4),
            ("CABA", "X", "2022-01-01", 6),
            ("CABA", "Y", "2021-01-01", 2),
        ]);
        let summary = DataProcessor::summarize(&records, &AppConfig::default()).unwrap();
        let provinces: Vec<&str> = summary
            .breakdowns
            .iter()
            .map(|b| b.province.as_str())
            .collect();
        assert_eq!(provinces, vec!["CABA", "Salta"]);
        assert_eq!(summary.national.total, 10);
        assert_eq!(summary.yearly.len(), 2);
        assert_eq!(summary.record_count, 3);
    }
}
