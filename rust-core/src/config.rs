// Constants and codec configuration

use serde::{Deserialize, Serialize};

// Tolerances
pub const INDEX_TOLERANCE: f64 = 1e-4; // Max distance of a stored Miller index from an integer
pub const CELL_TOLERANCE: f64 = 1e-8; // For cell volume and metric checks

// Symmetry
pub const TRANSLATION_DENOMINATOR: i32 = 24; // Translations are stored in 1/24 cell units

// MTZ layout
pub const MTZ_RECORD_LEN: usize = 80;
pub const MTZ_DATA_START_WORD: u64 = 21; // 1-based word index, i.e. byte 80
pub const MTZ_BATCH_INTS: usize = 29;
pub const MTZ_BATCH_FLOATS: usize = 156;

// Defaults for newly written files
pub const DEFAULT_PROJECT: &str = "reciprocal-space";
pub const BASE_DATASET: &str = "HKL_base";

/// Options for reading and writing MTZ files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodecConfig {
    /// Coerce unknown column types to `R` on read and skip untagged columns on write
    pub skip_problem_types: bool,
    /// Title record written when the table carries none
    pub title: String,
    /// Project/crystal/dataset names of the dataset holding observables
    pub project_name: String,
    pub crystal_name: String,
    pub dataset_name: String,
    /// Wavelength in Å (0 = unknown)
    pub wavelength: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            skip_problem_types: false,
            title: String::new(),
            project_name: DEFAULT_PROJECT.to_string(),
            crystal_name: DEFAULT_PROJECT.to_string(),
            dataset_name: DEFAULT_PROJECT.to_string(),
            wavelength: 0.0,
        }
    }
}

impl CodecConfig {
    pub fn with_skip_problem_types(mut self, skip: bool) -> Self {
        self.skip_problem_types = skip;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_dataset(
        mut self,
        project: impl Into<String>,
        crystal: impl Into<String>,
        dataset: impl Into<String>,
    ) -> Self {
        self.project_name = project.into();
        self.crystal_name = crystal.into();
        self.dataset_name = dataset.into();
        self
    }

    pub fn with_wavelength(mut self, wavelength: f64) -> Self {
        self.wavelength = wavelength;
        self
    }
}
