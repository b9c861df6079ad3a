use std::ops::Range;
use std::sync::Arc;

use crate::dataset::column_types::{ColumnType, ColumnValues};
use crate::dataset::reflection_table::ReflectionTable;
use crate::error::{Error, Result};
use crate::lattice::UnitCell;
use crate::miller::MillerIndex;
use crate::symmetries::SpaceGroup;

/// A single column detached from its table.
///
/// Holds the same `Arc` cell and space group as the table it came from, so
/// derived series stay attached to the crystal without copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    label: String,
    dtype: ColumnType,
    values: ColumnValues,
    cell: Option<Arc<UnitCell>>,
    spacegroup: Option<Arc<SpaceGroup>>,
}

impl Series {
    /// A series without crystal context
    pub fn new(label: &str, dtype: ColumnType, values: ColumnValues) -> Result<Self> {
        if !dtype.accepts(&values) {
            return Err(Error::IncompatibleValues {
                column: label.to_string(),
                dtype: dtype.name().to_string(),
            });
        }
        Ok(Self {
            label: label.to_string(),
            dtype,
            values,
            cell: None,
            spacegroup: None,
        })
    }

    pub(crate) fn with_context(
        mut self,
        cell: Option<Arc<UnitCell>>,
        spacegroup: Option<Arc<SpaceGroup>>,
    ) -> Self {
        self.cell = cell;
        self.spacegroup = spacegroup;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rename(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn dtype(&self) -> ColumnType {
        self.dtype
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn into_values(self) -> ColumnValues {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.values.to_f64()
    }

    pub fn cell(&self) -> Result<&UnitCell> {
        self.cell
            .as_deref()
            .ok_or(Error::MissingCrystalContext("unit cell"))
    }

    pub fn spacegroup(&self) -> Result<&SpaceGroup> {
        self.spacegroup
            .as_deref()
            .ok_or(Error::MissingCrystalContext("space group"))
    }

    pub fn cell_arc(&self) -> Option<&Arc<UnitCell>> {
        self.cell.as_ref()
    }

    pub fn spacegroup_arc(&self) -> Option<&Arc<SpaceGroup>> {
        self.spacegroup.as_ref()
    }

    pub fn set_cell(&mut self, cell: Option<Arc<UnitCell>>) {
        self.cell = cell;
    }

    pub fn set_spacegroup(&mut self, spacegroup: Option<Arc<SpaceGroup>>) {
        self.spacegroup = spacegroup;
    }

    /// Contiguous rows as a zero-copy view; context is shared, not copied
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: range.end,
            });
        }
        Ok(self.with_values(self.values.slice(range.start, range.len())))
    }

    /// Rows by position; context is shared, not copied
    pub fn take(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.len()) {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: bad + 1,
            });
        }
        Ok(self.with_values(self.values.take(rows)?))
    }

    fn with_values(&self, values: ColumnValues) -> Self {
        Self {
            label: self.label.clone(),
            dtype: self.dtype,
            values,
            cell: self.cell.clone(),
            spacegroup: self.spacegroup.clone(),
        }
    }

    /// Range of non-missing values
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values.min_max()
    }

    /// Promote to a one-column table keyed by `hkls`.
    ///
    /// Needs both cell and space group, which the table shares with this series.
    pub fn into_table(self, hkls: &[MillerIndex]) -> Result<ReflectionTable> {
        let cell = self
            .cell
            .clone()
            .ok_or(Error::MissingCrystalContext("unit cell"))?;
        let spacegroup = self
            .spacegroup
            .clone()
            .ok_or(Error::MissingCrystalContext("space group"))?;
        if hkls.len() != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: hkls.len(),
            });
        }
        let mut table = ReflectionTable::from_hkls(hkls)?;
        table.set_cell_arc(Some(cell));
        table.set_spacegroup_arc(Some(spacegroup));
        table.insert_series(self)?;
        Ok(table)
    }
}
