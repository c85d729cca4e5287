//! Observation dataset and its CSV loader.
//!
//! The measurement file carries one row per observed shot with the speed and
//! the two fitted resistance coefficients. Older files name the speed column
//! `velocity`; both spellings are accepted and any extra columns are ignored.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Single observation row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observed speed (m/s)
    #[serde(alias = "velocity")]
    pub v: f64,
    /// Observed linear resistance coefficient
    pub a: f64,
    /// Observed "quadratic" resistance coefficient
    pub b: f64,
}

/// Ordered, read-only collection of observations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Observation>,
}

impl Dataset {
    pub fn new(records: Vec<Observation>) -> Self {
        Self { records }
    }

    /// Parse CSV data with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in csv_reader.deserialize() {
            let observation: Observation = row?;
            records.push(observation);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn speeds(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.v).collect()
    }

    pub fn speeds_squared(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.v * r.v).collect()
    }

    pub fn linear_coefficients(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.a).collect()
    }

    pub fn quadratic_coefficients(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.b).collect()
    }
}

impl FromIterator<Observation> for Dataset {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Load the observation dataset from a CSV file
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let dataset = Dataset::from_reader(file)?;

    if dataset.is_empty() {
        warn!(path = %path.display(), "dataset contains no observations");
    } else {
        debug!(path = %path.display(), rows = dataset.len(), "loaded dataset");
    }

    Ok(dataset)
}
