// Dataset module: Tagged columns and the symmetry-aware reflection table
// Tables share one unit cell and space group with every column taken from them

// ======================== MODULE DECLARATIONS ========================
pub mod attributes;
pub mod column_types;
pub mod frame;
pub mod reflection_table;
pub mod series;

// Test modules
mod _tests_frame;

// ======================== COLUMN TYPES ========================
pub use column_types::{
    ColumnType,    // enum - crystallographic column tag, MTZ code where one exists
    ColumnValues,  // enum - Arrow Int32 / Float64 / Boolean array storage
    ABSENT_LABEL, BATCH_LABEL, BIN_LABEL, CENTRIC_LABEL, DHKL_LABEL, EPSILON_LABEL, H_LABEL,
    K_LABEL, L_LABEL, MISYM_LABEL,
};
// ColumnType impl methods:
//   mtz_code(&self) -> Option<char> / from_mtz_code(code: char) -> Option<Self>
//   is_integer / is_phase / is_friedel(&self) -> bool
//   friedel_collapsed(&self) -> Self     - K→J, L→Q, G→F, M→Q
//   accepts(&self, values) -> bool       - storage compatible with the tag
// ColumnValues impl methods:
//   ints / floats / bools, from_array / to_array, take, slice, to_f64, to_integral, min_max,
//   as_ints / as_floats / to_bools

// ======================== FRAME ========================
pub use frame::Frame; // struct - Arrow record batch whose leading columns form the row index

// ======================== METADATA ========================
pub use attributes::{
    BatchHeader,    // struct - raw orientation block of one image batch
    DatasetRecord,  // struct - project / crystal / dataset with cell and wavelength
    TableAttrs,     // struct - title, history, datasets and batches of a table
};

// ======================== TABLES ========================
pub use reflection_table::{DtypeSnapshot, ReflectionTable};
pub use series::Series; // struct - one tagged column sharing its table's cell and space group
