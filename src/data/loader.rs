//! CSV Data Loader Module
//! Reads the job posts and activity code tables using Polars.

use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROVINCE_COL: &str = "zona_prov";
pub const CODE_COL: &str = "clae2";
pub const DATE_COL: &str = "fecha";
pub const COUNT_COL: &str = "puestos";
pub const DESCRIPTION_COL: &str = "clae2_desc";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("File not found: {0}")]
    MissingFile(PathBuf),
    #[error("No rows in {0}")]
    NoData(PathBuf),
}

/// Handles CSV file loading with Polars for high performance.
pub struct DataLoader;

impl DataLoader {
    /// Read selected columns of a CSV file, casting each to the given type.
    ///
    /// Casts are strict: a cell that does not convert fails the load. Empty
    /// cells stay null.
    fn read_columns(path: &Path, columns: &[(&str, DataType)]) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }

        let path_str = path.to_string_lossy().to_string();
        let exprs: Vec<Expr> = columns
            .iter()
            .map(|(name, dtype)| col(*name).strict_cast(dtype.clone()))
            .collect();

        let df = LazyCsvReader::new(&path_str)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .select(exprs)
            .collect()?;

        if df.height() == 0 {
            return Err(LoaderError::NoData(path.to_path_buf()));
        }

        info!("Read {} rows from {}", df.height(), path.display());
        Ok(df)
    }

    /// Drop rows with a null in any of `required`, warning with the count.
    fn drop_incomplete(
        df: DataFrame,
        required: &[&str],
        path: &Path,
    ) -> Result<DataFrame, LoaderError> {
        let before = df.height();
        let subset: Vec<Expr> = required.iter().map(|name| col(*name)).collect();
        let df = df.lazy().drop_nulls(Some(subset)).collect()?;

        let skipped = before - df.height();
        if skipped > 0 {
            warn!(
                "Skipped {} rows with missing {} in {}",
                skipped,
                required.join("/"),
                path.display()
            );
        }
        Ok(df)
    }

    /// Load the job posts table: `zona_prov`, `clae2`, `fecha`, `puestos`.
    ///
    /// Rows with a null province, code or date are skipped; an empty count reads as zero.
    pub fn load_jobs(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = Self::read_columns(
            path,
            &[
                (PROVINCE_COL, DataType::String),
                (CODE_COL, DataType::Int64),
                (DATE_COL, DataType::String),
                (COUNT_COL, DataType::Int64),
            ],
        )?;

        let df = Self::drop_incomplete(df, &[PROVINCE_COL, CODE_COL, DATE_COL], path)?;
        let df = df
            .lazy()
            .with_columns([col(COUNT_COL).fill_null(lit(0i64))])
            .collect()?;

        Ok(df)
    }

    /// Load the activity code lookup table: `clae2`, `clae2_desc`.
    pub fn load_codes(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = Self::read_columns(
            path,
            &[(CODE_COL, DataType::Int64), (DESCRIPTION_COL, DataType::String)],
        )?;

        Self::drop_incomplete(df, &[CODE_COL, DESCRIPTION_COL], path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("labor_charts_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_jobs_reads_required_columns() {
        let path = write_temp_csv(
            "jobs_basic.csv",
            "fecha,zona_prov,clae2,puestos\n\
             2022-01-01,CABA,1,10\n\
             2022-02-01,Cordoba,2,-99\n",
        );
        let jobs = DataLoader::load_jobs(&path).unwrap();
        assert_eq!(jobs.height(), 2);

        let provinces = jobs.column(PROVINCE_COL).unwrap().str().unwrap();
        let counts = jobs.column(COUNT_COL).unwrap().i64().unwrap();
        let dates = jobs.column(DATE_COL).unwrap().str().unwrap();
        assert_eq!(provinces.get(0), Some("CABA"));
        assert_eq!(dates.get(0), Some("2022-01-01"));
        assert_eq!(counts.get(0), Some(10));
        // Negative counts are kept as loaded
        assert_eq!(counts.get(1), Some(-99));
    }

    #[test]
    fn test_load_jobs_skips_rows_without_province() {
        let path = write_temp_csv(
            "jobs_nulls.csv",
            "fecha,zona_prov,clae2,puestos\n\
             2022-01-01,,1,10\n\
             2022-01-01,Salta,1,\n",
        );
        let jobs = DataLoader::load_jobs(&path).unwrap();
        assert_eq!(jobs.height(), 1);
        assert_eq!(
            jobs.column(PROVINCE_COL).unwrap().str().unwrap().get(0),
            Some("Salta")
        );
        assert_eq!(jobs.column(COUNT_COL).unwrap().i64().unwrap().get(0), Some(0));
    }

    #[test]
    fn test_malformed_count_fails_the_load() {
        let path = write_temp_csv(
            "jobs_bad_count.csv",
            "fecha,zona_prov,clae2,puestos\n\
             2022-01-01,CABA,1,10\n\
             2022-01-01,CABA,1,abc\n",
        );
        let err = DataLoader::load_jobs(&path).unwrap_err();
        assert!(matches!(err, LoaderError::CsvError(_)));
    }

    #[test]
    fn test_malformed_code_fails_the_load() {
        let path = write_temp_csv(
            "jobs_bad_code.csv",
            "fecha,zona_prov,clae2,puestos\n\
             2022-01-01,CABA,1,10\n\
             2022-01-01,CABA,xx,5\n",
        );
        assert!(DataLoader::load_jobs(&path).is_err());
    }

    #[test]
    fn test_load_codes() {
        let path = write_temp_csv(
            "codes.csv",
            "clae2,clae2_desc,letra\n1,Agricultura,A\n2,Pesca,A\n",
        );
        let codes = DataLoader::load_codes(&path).unwrap();
        assert_eq!(codes.height(), 2);
        assert_eq!(codes.column(CODE_COL).unwrap().i64().unwrap().get(1), Some(2));
        assert_eq!(
            codes.column(DESCRIPTION_COL).unwrap().str().unwrap().get(1),
            Some("Pesca")
        );
    }

    #[test]
    fn test_load_codes_skips_rows_without_description() {
        let path = write_temp_csv(
            "codes_nulls.csv",
            "clae2,clae2_desc\n1,Agricultura\n2,\n",
        );
        let codes = DataLoader::load_codes(&path).unwrap();
        assert_eq!(codes.height(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::load_jobs(Path::new("/nonexistent/puestos_priv.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::MissingFile(_)));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let path = write_temp_csv("jobs_no_count.csv", "fecha,zona_prov,clae2\n2022-01-01,CABA,1\n");
        assert!(DataLoader::load_jobs(&path).is_err());
    }
}
