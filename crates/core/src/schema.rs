//! Canonical feature schema and validation.
//!
//! The scaler was fitted against columns in one exact order, so that order
//! is part of the model contract: every record and table is projected onto
//! `FEATURE_NAMES` order before scaling.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::errors::{CoreError, Result};

/// Required feature names, in training order.
pub const FEATURE_NAMES: [&str; 13] = [
    "Age",
    "Gender",
    "Ethnicity",
    "ParentalEducation",
    "StudyTimeWeekly",
    "Absences",
    "Tutoring",
    "ParentalSupport",
    "Extracurricular",
    "Sports",
    "Music",
    "Volunteering",
    "GPA",
];

/// Number of required features.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// One row of features, in `FEATURE_NAMES` order.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Build a feature vector from a JSON record by named lookup.
///
/// Values are read by name in `FEATURE_NAMES` order; the caller's key order
/// is irrelevant. Every missing name is reported, not just the first.
pub fn vector_from_record(record: &Map<String, Value>) -> Result<FeatureVector> {
    let missing: Vec<String> = FEATURE_NAMES
        .iter()
        .filter(|name| !record.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::MissingFields(missing));
    }

    let mut features = [0.0; FEATURE_COUNT];
    for (slot, name) in features.iter_mut().zip(FEATURE_NAMES.iter()) {
        let value = &record[*name];
        *slot = value.as_f64().ok_or_else(|| CoreError::InvalidValue {
            row: 0,
            field: name.to_string(),
            value: value.to_string(),
        })?;
    }
    Ok(features)
}

/// A parsed delimited table: header row plus raw string cells.
///
/// Extra columns are tolerated; they ride along untouched and reappear in
/// the augmented output.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FeatureTable {
    /// Wrap a header row and data rows, checking that every required
    /// feature name is present as a column. Missing names are reported
    /// sorted.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut missing: Vec<String> = FEATURE_NAMES
            .iter()
            .filter(|name| !headers.iter().any(|header| header == **name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(CoreError::MissingColumns(missing));
        }
        Ok(Self { headers, rows })
    }

    /// Column names, in upload order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw data rows, in upload order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows. Zero-row tables are valid.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Project onto the required columns, parsing numeric cells, in file
    /// row order.
    pub fn project(&self) -> Result<Vec<FeatureVector>> {
        let index: HashMap<&str, usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(position, header)| (header.as_str(), position))
            .collect();
        // Column membership was checked by `new`.
        let columns: Vec<usize> = FEATURE_NAMES.iter().map(|name| index[*name]).collect();

        let mut projected = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut features = [0.0; FEATURE_COUNT];
            for ((slot, &column), name) in features
                .iter_mut()
                .zip(columns.iter())
                .zip(FEATURE_NAMES.iter())
            {
                let raw = row.get(column).map(String::as_str).unwrap_or("");
                *slot = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| CoreError::InvalidValue {
                        row: row_idx,
                        field: name.to_string(),
                        value: raw.to_string(),
                    })?;
            }
            projected.push(features);
        }
        Ok(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> Map<String, Value> {
        let mut record = Map::new();
        for (position, name) in FEATURE_NAMES.iter().enumerate() {
            record.insert(name.to_string(), json!(position as f64));
        }
        record
    }

    #[test]
    fn test_record_extraction_in_canonical_order() {
        let record = full_record();
        let features = vector_from_record(&record).unwrap();
        for (position, value) in features.iter().enumerate() {
            assert_eq!(*value, position as f64);
        }
    }

    #[test]
    fn test_record_key_order_is_irrelevant() {
        let forward = full_record();
        let mut reversed = Map::new();
        for name in FEATURE_NAMES.iter().rev() {
            reversed.insert(name.to_string(), forward[*name].clone());
        }

        assert_eq!(
            vector_from_record(&forward).unwrap(),
            vector_from_record(&reversed).unwrap()
        );
    }

    #[test]
    fn test_record_reports_every_missing_field() {
        let mut record = full_record();
        record.remove("Age");
        record.remove("GPA");

        let err = vector_from_record(&record).unwrap_err();
        match err {
            CoreError::MissingFields(missing) => {
                assert_eq!(missing, vec!["Age".to_string(), "GPA".to_string()]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_record_rejects_non_numeric_value() {
        let mut record = full_record();
        record.insert("GPA".to_string(), json!("high"));

        let err = vector_from_record(&record).unwrap_err();
        match err {
            CoreError::InvalidValue { row, field, .. } => {
                assert_eq!(row, 0);
                assert_eq!(field, "GPA");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    fn full_headers() -> Vec<String> {
        FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_table_missing_columns_sorted() {
        let headers: Vec<String> = full_headers()
            .into_iter()
            .filter(|header| header != "Age" && header != "GPA" && header != "Music")
            .collect();

        let err = FeatureTable::new(headers, Vec::new()).unwrap_err();
        match err {
            CoreError::MissingColumns(missing) => {
                assert_eq!(
                    missing,
                    vec!["Age".to_string(), "GPA".to_string(), "Music".to_string()]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_table_tolerates_extra_columns() {
        let mut headers = vec!["StudentID".to_string()];
        headers.extend(full_headers());

        let mut row = vec!["s-1".to_string()];
        row.extend((0..FEATURE_COUNT).map(|value| value.to_string()));

        let table = FeatureTable::new(headers, vec![row]).unwrap();
        let projected = table.project().unwrap();

        assert_eq!(projected.len(), 1);
        // Projection skips the extra leading column.
        assert_eq!(projected[0][0], 0.0);
        assert_eq!(projected[0][FEATURE_COUNT - 1], (FEATURE_COUNT - 1) as f64);
    }

    #[test]
    fn test_table_zero_rows_is_valid() {
        let table = FeatureTable::new(full_headers(), Vec::new()).unwrap();
        assert_eq!(table.row_count(), 0);
        assert!(table.project().unwrap().is_empty());
    }

    #[test]
    fn test_table_invalid_cell_names_row_and_field() {
        let mut rows = Vec::new();
        rows.push((0..FEATURE_COUNT).map(|v| v.to_string()).collect());
        let mut bad_row: Vec<String> = (0..FEATURE_COUNT).map(|v| v.to_string()).collect();
        bad_row[4] = "n/a".to_string(); // StudyTimeWeekly
        rows.push(bad_row);

        let table = FeatureTable::new(full_headers(), rows).unwrap();
        let err = table.project().unwrap_err();
        match err {
            CoreError::InvalidValue { row, field, value } => {
                assert_eq!(row, 1);
                assert_eq!(field, "StudyTimeWeekly");
                assert_eq!(value, "n/a");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }
}
