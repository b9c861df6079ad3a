use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{MTZ_BATCH_FLOATS, MTZ_BATCH_INTS};

/// One MTZ dataset (project / crystal / dataset triple)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: i32,
    pub project: String,
    pub crystal: String,
    pub dataset: String,
    pub cell: Option<[f64; 6]>,
    pub wavelength: f64,
}

impl DatasetRecord {
    pub fn new(id: i32, project: &str, crystal: &str, dataset: &str) -> Self {
        Self {
            id,
            project: project.to_string(),
            crystal: crystal.to_string(),
            dataset: dataset.to_string(),
            cell: None,
            wavelength: 0.0,
        }
    }
}

/// Orientation block of one image batch, kept as raw header words
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchHeader {
    pub number: i32,
    pub title: String,
    pub ints: Vec<i32>,
    pub floats: Vec<f32>,
    /// Goniostat axis names from the `BHCH` record
    pub axes: Vec<String>,
}

impl BatchHeader {
    /// Empty header for a batch number, with the word counts filled in
    pub fn new(number: i32) -> Self {
        let mut ints = vec![0; MTZ_BATCH_INTS];
        let total = (MTZ_BATCH_INTS + MTZ_BATCH_FLOATS) as i32;
        ints[0] = total;
        ints[1] = MTZ_BATCH_INTS as i32;
        ints[2] = MTZ_BATCH_FLOATS as i32;
        Self {
            number,
            title: String::new(),
            ints,
            floats: vec![0.0; MTZ_BATCH_FLOATS],
            axes: Vec::new(),
        }
    }
}

/// File-level metadata carried alongside the reflections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableAttrs {
    pub title: String,
    pub history: Vec<String>,
    pub datasets: Vec<DatasetRecord>,
    /// Dataset id of each column, by label
    pub column_datasets: BTreeMap<String, i32>,
    pub batches: Vec<BatchHeader>,
}

impl TableAttrs {
    pub fn dataset(&self, id: i32) -> Option<&DatasetRecord> {
        self.datasets.iter().find(|d| d.id == id)
    }

    /// Keep per-column bookkeeping in step with a rename
    pub(crate) fn rename_column(&mut self, old: &str, new: &str) {
        if let Some(id) = self.column_datasets.remove(old) {
            self.column_datasets.insert(new.to_string(), id);
        }
    }
}
