use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, UInt64Array};
use arrow::compute::{self, SortColumn};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};

use crate::dataset::column_types::ColumnValues;
use crate::error::{Error, Result};

/// Generic ordered table: an Arrow record batch whose leading columns form
/// the row index.
///
/// The frame knows nothing about crystallography; column tags live in the
/// reflection table that wraps it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    batch: RecordBatch,
    /// Number of leading batch columns that make up the index
    nindex: usize,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
            nindex: 0,
        }
    }
}

/// Common storage type when stacking two columns; int and float promote to float
fn common_type(a: &DataType, b: &DataType) -> Option<DataType> {
    match (a, b) {
        (x, y) if x == y => Some(x.clone()),
        (DataType::Int32, DataType::Float64) | (DataType::Float64, DataType::Int32) => {
            Some(DataType::Float64)
        }
        _ => None,
    }
}

fn schema_of(columns: &[(String, ArrayRef)]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(label, array)| Field::new(label.as_str(), array.data_type().clone(), false))
        .collect();
    Arc::new(Schema::new(fields))
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from data columns of equal length
    pub fn from_columns(columns: Vec<(String, ColumnValues)>) -> Result<Self> {
        let mut frame = Frame::new();
        for (label, values) in columns {
            frame.insert(&label, values)?;
        }
        Ok(frame)
    }

    fn build(columns: Vec<(String, ArrayRef)>, nindex: usize) -> Result<Self> {
        if columns.is_empty() {
            return Ok(Self::default());
        }
        let schema = schema_of(&columns);
        let arrays = columns.into_iter().map(|(_, array)| array).collect();
        Ok(Self {
            batch: RecordBatch::try_new(schema, arrays)?,
            nindex,
        })
    }

    /// Labelled arrays, index first
    fn entries(&self) -> Vec<(String, ArrayRef)> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .zip(self.batch.columns())
            .map(|(field, array)| (field.name().clone(), array.clone()))
            .collect()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.batch.schema_ref().index_of(label).ok()
    }

    /// The underlying record batch, index columns first
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn nrows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of data columns (index columns excluded)
    pub fn ncols(&self) -> usize {
        self.batch.num_columns() - self.nindex
    }

    pub fn is_empty(&self) -> bool {
        self.nrows() == 0
    }

    fn has_no_columns(&self) -> bool {
        self.batch.num_columns() == 0
    }

    fn field_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.field_names().split_off(self.nindex)
    }

    pub fn index_labels(&self) -> Vec<&str> {
        let mut names = self.field_names();
        names.truncate(self.nindex);
        names
    }

    /// Index labels followed by data labels
    pub fn all_labels(&self) -> Vec<&str> {
        self.field_names()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    pub fn is_index(&self, label: &str) -> bool {
        self.position(label).is_some_and(|i| i < self.nindex)
    }

    /// Look up a data or index column
    pub fn get(&self, label: &str) -> Option<ColumnValues> {
        self.batch
            .column_by_name(label)
            .and_then(ColumnValues::from_array)
    }

    /// Iterate over (label, values) pairs, index first
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnValues)> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .zip(self.batch.columns())
            .filter_map(|(field, array)| {
                ColumnValues::from_array(array).map(|values| (field.name().as_str(), values))
            })
    }

    fn check_len(&self, values: &ColumnValues) -> Result<()> {
        if !self.has_no_columns() && values.len() != self.nrows() {
            return Err(Error::LengthMismatch {
                expected: self.nrows(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    /// Insert a data column, replacing one of the same label.
    ///
    /// Index columns are replaced in place with `replace`, never through here.
    pub fn insert(&mut self, label: &str, values: ColumnValues) -> Result<()> {
        if self.is_index(label) {
            return Err(Error::DuplicateColumn(label.to_string()));
        }
        self.check_len(&values)?;
        let mut entries = self.entries();
        match entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, slot)) => *slot = values.to_array(),
            None => entries.push((label.to_string(), values.to_array())),
        }
        *self = Self::build(entries, self.nindex)?;
        Ok(())
    }

    /// Replace the values of an existing data or index column
    pub fn replace(&mut self, label: &str, values: ColumnValues) -> Result<()> {
        let pos = self
            .position(label)
            .ok_or_else(|| Error::MissingColumn(label.to_string()))?;
        self.check_len(&values)?;
        let mut entries = self.entries();
        entries[pos].1 = values.to_array();
        *self = Self::build(entries, self.nindex)?;
        Ok(())
    }

    /// Remove a data column
    pub fn remove(&mut self, label: &str) -> Result<ColumnValues> {
        let pos = self
            .position(label)
            .filter(|&i| i >= self.nindex)
            .ok_or_else(|| Error::MissingColumn(label.to_string()))?;
        let mut entries = self.entries();
        let (_, array) = entries.remove(pos);
        let values = ColumnValues::from_array(&array)
            .ok_or_else(|| Error::MissingColumn(label.to_string()))?;
        *self = Self::build(entries, self.nindex)?;
        Ok(values)
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if self.contains(new) {
            return Err(Error::DuplicateColumn(new.to_string()));
        }
        let pos = self
            .position(old)
            .ok_or_else(|| Error::MissingColumn(old.to_string()))?;
        let mut entries = self.entries();
        entries[pos].0 = new.to_string();
        *self = Self::build(entries, self.nindex)?;
        Ok(())
    }

    /// Rows gathered by position, index included
    pub fn take(&self, rows: &[usize]) -> Result<Frame> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.nrows()) {
            return Err(Error::LengthMismatch {
                expected: self.nrows(),
                actual: bad + 1,
            });
        }
        if self.has_no_columns() {
            return Ok(self.clone());
        }
        let indices = UInt64Array::from_iter_values(rows.iter().map(|&r| r as u64));
        Ok(Frame {
            batch: compute::take_record_batch(&self.batch, &indices)?,
            nindex: self.nindex,
        })
    }

    /// Rows where `mask` is true
    pub fn filter(&self, mask: &[bool]) -> Result<Frame> {
        if mask.len() != self.nrows() {
            return Err(Error::LengthMismatch {
                expected: self.nrows(),
                actual: mask.len(),
            });
        }
        if self.has_no_columns() {
            return Ok(self.clone());
        }
        let predicate = BooleanArray::from(mask.to_vec());
        Ok(Frame {
            batch: compute::filter_record_batch(&self.batch, &predicate)?,
            nindex: self.nindex,
        })
    }

    /// Stack the rows of `other` below these. Both frames need the same labels;
    /// int columns meeting float columns are promoted to float.
    pub fn concat(&self, other: &Frame) -> Result<Frame> {
        if self.has_no_columns() {
            return Ok(other.clone());
        }
        if self.index_labels() != other.index_labels() {
            return Err(Error::MissingColumn(format!(
                "index {:?} vs {:?}",
                self.index_labels(),
                other.index_labels()
            )));
        }
        if other.ncols() != self.ncols() {
            let missing = other
                .labels()
                .into_iter()
                .find(|l| !self.contains(l))
                .unwrap_or_default()
                .to_string();
            return Err(Error::MissingColumn(missing));
        }

        let mut upper = Vec::with_capacity(self.batch.num_columns());
        let mut lower = Vec::with_capacity(self.batch.num_columns());
        for (label, array) in self.entries() {
            let rhs = other
                .batch
                .column_by_name(&label)
                .ok_or_else(|| Error::MissingColumn(label.clone()))?;
            let target = common_type(array.data_type(), rhs.data_type()).ok_or_else(|| {
                Error::IncompatibleValues {
                    column: label.clone(),
                    dtype: rhs.data_type().to_string(),
                }
            })?;
            upper.push((label.clone(), compute::cast(array.as_ref(), &target)?));
            lower.push((label, compute::cast(rhs.as_ref(), &target)?));
        }
        let upper = Self::build(upper, self.nindex)?;
        let lower = Self::build(lower, self.nindex)?;
        let schema = upper.batch.schema();
        Ok(Frame {
            batch: compute::concat_batches(&schema, [&upper.batch, &lower.batch])?,
            nindex: self.nindex,
        })
    }

    /// Move `labels` into the index, restoring any previous index columns first.
    ///
    /// Leaves the frame untouched on error.
    pub fn set_index(&mut self, labels: &[&str]) -> Result<()> {
        if let Some(missing) = labels.iter().find(|l| !self.contains(l)) {
            return Err(Error::MissingColumn(missing.to_string()));
        }
        let mut seen = HashSet::with_capacity(labels.len());
        if let Some(repeated) = labels.iter().find(|l| !seen.insert(**l)) {
            return Err(Error::DuplicateColumn(repeated.to_string()));
        }
        let (mut index, rest): (Vec<_>, Vec<_>) = self
            .entries()
            .into_iter()
            .partition(|(label, _)| labels.contains(&label.as_str()));
        index.sort_by_key(|(label, _)| labels.iter().position(|l| *l == label.as_str()));
        index.extend(rest);
        *self = Self::build(index, labels.len())?;
        Ok(())
    }

    /// Move index columns back to the front of the data columns
    pub fn reset_index(&mut self) {
        self.nindex = 0;
    }

    /// True when no two rows share index values (trivially true without an index)
    pub fn has_unique_index(&self) -> Result<bool> {
        if self.nindex == 0 {
            return Ok(true);
        }
        let keys = &self.batch.columns()[..self.nindex];
        let converter = RowConverter::new(
            keys.iter()
                .map(|array| SortField::new(array.data_type().clone()))
                .collect(),
        )?;
        let rows = converter.convert_columns(keys)?;
        let mut seen = HashSet::with_capacity(rows.num_rows());
        Ok(rows.iter().all(|row| seen.insert(row)))
    }

    /// Lexicographic sort on the index columns
    pub fn sort_by_index(&mut self) -> Result<()> {
        if self.nindex == 0 || self.is_empty() {
            return Ok(());
        }
        let keys: Vec<SortColumn> = self.batch.columns()[..self.nindex]
            .iter()
            .map(|array| SortColumn {
                values: array.clone(),
                options: None,
            })
            .collect();
        let indices = compute::lexsort_to_indices(&keys, None)?;
        self.batch = compute::take_record_batch(&self.batch, &indices)?;
        Ok(())
    }
}
