use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::CodecConfig;
use crate::dataset::attributes::TableAttrs;
use crate::dataset::column_types::{
    ColumnType, ColumnValues, ABSENT_LABEL, BIN_LABEL, CENTRIC_LABEL, DHKL_LABEL, EPSILON_LABEL,
    H_LABEL, K_LABEL, L_LABEL, MISYM_LABEL,
};
use crate::dataset::frame::Frame;
use crate::dataset::series::Series;
use crate::error::{Error, Result};
use crate::io;
use crate::lattice::UnitCell;
use crate::miller::{self, wrap_phase, AsuMapper, AsuMapping, MillerIndex};
use crate::symmetries::{SpaceGroup, SymOp};

/// Column tags captured before a generic frame operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DtypeSnapshot {
    dtypes: HashMap<String, ColumnType>,
}

impl DtypeSnapshot {
    pub fn get(&self, label: &str) -> Option<ColumnType> {
        self.dtypes.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.dtypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dtypes.is_empty()
    }
}

/// Reflection table: a frame of tagged columns plus the crystal it describes.
///
/// The unit cell and space group are held behind `Arc` so that series and
/// derived tables share them. Every mutation is computed on a copy of the
/// frame and committed only when nothing failed.
#[derive(Debug, Clone)]
pub struct ReflectionTable {
    frame: Frame,
    dtypes: HashMap<String, ColumnType>,
    cell: Option<Arc<UnitCell>>,
    spacegroup: Option<Arc<SpaceGroup>>,
    merged: bool,
    pub attrs: TableAttrs,
}

impl Default for ReflectionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectionTable {
    /// Empty merged table without crystal context
    pub fn new() -> Self {
        Self {
            frame: Frame::new(),
            dtypes: HashMap::new(),
            cell: None,
            spacegroup: None,
            merged: true,
            attrs: TableAttrs::default(),
        }
    }

    /// Table with H, K, L index columns and no data
    pub fn from_hkls(hkls: &[MillerIndex]) -> Result<Self> {
        let mut table = Self::new();
        for (axis, label) in [H_LABEL, K_LABEL, L_LABEL].into_iter().enumerate() {
            let values: Vec<i32> = hkls.iter().map(|h| h[axis]).collect();
            table.insert_column(label, ColumnType::HklIndex, ColumnValues::ints(values))?;
        }
        table.set_index(&[H_LABEL, K_LABEL, L_LABEL])?;
        Ok(table)
    }

    // ======================== CRYSTAL CONTEXT ========================

    pub fn with_cell(mut self, cell: UnitCell) -> Self {
        self.set_cell(cell);
        self
    }

    pub fn with_spacegroup(mut self, spacegroup: SpaceGroup) -> Self {
        self.set_spacegroup(spacegroup);
        self
    }

    pub fn set_cell(&mut self, cell: UnitCell) {
        self.cell = Some(Arc::new(cell));
    }

    pub fn set_spacegroup(&mut self, spacegroup: SpaceGroup) {
        self.spacegroup = Some(Arc::new(spacegroup));
    }

    pub fn set_cell_arc(&mut self, cell: Option<Arc<UnitCell>>) {
        self.cell = cell;
    }

    pub fn set_spacegroup_arc(&mut self, spacegroup: Option<Arc<SpaceGroup>>) {
        self.spacegroup = spacegroup;
    }

    pub fn cell(&self) -> Option<&UnitCell> {
        self.cell.as_deref()
    }

    pub fn spacegroup(&self) -> Option<&SpaceGroup> {
        self.spacegroup.as_deref()
    }

    pub fn cell_arc(&self) -> Option<&Arc<UnitCell>> {
        self.cell.as_ref()
    }

    pub fn spacegroup_arc(&self) -> Option<&Arc<SpaceGroup>> {
        self.spacegroup.as_ref()
    }

    fn require_cell(&self) -> Result<Arc<UnitCell>> {
        self.cell
            .clone()
            .ok_or(Error::MissingCrystalContext("unit cell"))
    }

    fn require_spacegroup(&self) -> Result<Arc<SpaceGroup>> {
        self.spacegroup
            .clone()
            .ok_or(Error::MissingCrystalContext("space group"))
    }

    pub fn merged(&self) -> bool {
        self.merged
    }

    pub fn set_merged(&mut self, merged: bool) {
        self.merged = merged;
    }

    // ======================== GENERIC PLUMBING ========================

    pub fn len(&self) -> usize {
        self.frame.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Data column labels, index excluded
    pub fn labels(&self) -> Vec<String> {
        self.frame.labels().into_iter().map(String::from).collect()
    }

    pub fn index_labels(&self) -> Vec<String> {
        self.frame.index_labels().into_iter().map(String::from).collect()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.frame.contains(label)
    }

    pub fn column_type(&self, label: &str) -> Option<ColumnType> {
        self.dtypes.get(label).copied()
    }

    pub fn values(&self, label: &str) -> Result<ColumnValues> {
        self.frame
            .get(label)
            .ok_or_else(|| Error::MissingColumn(label.to_string()))
    }

    /// Every column with its tag, index columns first
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnType, ColumnValues)> {
        self.frame.iter().map(move |(label, values)| {
            let dtype = self
                .dtypes
                .get(label)
                .copied()
                .unwrap_or_else(|| ColumnType::infer(&values));
            (label, dtype, values)
        })
    }

    /// Record the tag of every column, index included
    pub fn cache_index_dtypes(&self) -> DtypeSnapshot {
        DtypeSnapshot {
            dtypes: self.dtypes.clone(),
        }
    }

    /// Reattach snapshot tags to the columns that still carry compatible values
    fn reassert_dtypes(&mut self, snapshot: &DtypeSnapshot) {
        self.dtypes = self
            .frame
            .iter()
            .map(|(label, values)| {
                let dtype = snapshot
                    .get(label)
                    .filter(|t| t.accepts(&values))
                    .unwrap_or_else(|| ColumnType::infer(&values));
                (label.to_string(), dtype)
            })
            .collect();
    }

    /// Run a frame operation on a copy and commit it with tags re-asserted
    fn with_frame<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&mut Frame) -> Result<()>,
    {
        let snapshot = self.cache_index_dtypes();
        let mut frame = self.frame.clone();
        op(&mut frame)?;
        self.frame = frame;
        self.reassert_dtypes(&snapshot);
        Ok(())
    }

    /// Same metadata around a different frame
    fn derive(&self, frame: Frame) -> Self {
        let snapshot = self.cache_index_dtypes();
        let mut table = Self {
            frame,
            dtypes: HashMap::new(),
            cell: self.cell.clone(),
            spacegroup: self.spacegroup.clone(),
            merged: self.merged,
            attrs: self.attrs.clone(),
        };
        table.reassert_dtypes(&snapshot);
        table
    }

    /// Insert (or replace) a data column with an explicit tag
    pub fn insert_column(
        &mut self,
        label: &str,
        dtype: ColumnType,
        values: ColumnValues,
    ) -> Result<()> {
        if !dtype.accepts(&values) {
            return Err(Error::IncompatibleValues {
                column: label.to_string(),
                dtype: dtype.name().to_string(),
            });
        }
        self.with_frame(|frame| frame.insert(label, values))?;
        self.dtypes.insert(label.to_string(), dtype);
        Ok(())
    }

    pub fn drop_column(&mut self, label: &str) -> Result<()> {
        self.with_frame(|frame| frame.remove(label).map(|_| ()))?;
        self.attrs.column_datasets.remove(label);
        Ok(())
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        let dtype = self.column_type(old);
        self.with_frame(|frame| frame.rename(old, new))?;
        if let Some(dtype) = dtype {
            self.dtypes.insert(new.to_string(), dtype);
        }
        self.attrs.rename_column(old, new);
        Ok(())
    }

    /// One column as a series sharing this table's cell and space group
    pub fn column(&self, label: &str) -> Result<Series> {
        let values = self.values(label)?;
        let dtype = self
            .column_type(label)
            .unwrap_or_else(|| ColumnType::infer(&values));
        Ok(Series::new(label, dtype, values)?
            .with_context(self.cell.clone(), self.spacegroup.clone()))
    }

    pub fn insert_series(&mut self, series: Series) -> Result<()> {
        let label = series.label().to_string();
        let dtype = series.dtype();
        self.insert_column(&label, dtype, series.into_values())
    }

    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        Ok(self.derive(self.frame.take(rows)?))
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        Ok(self.derive(self.frame.filter(mask)?))
    }

    /// Rows of `self` followed by rows of `other`.
    ///
    /// Crystal context and attributes come from `self`; tags from both, `self` first.
    pub fn concat(&self, other: &ReflectionTable) -> Result<Self> {
        let mut snapshot = other.cache_index_dtypes();
        snapshot
            .dtypes
            .extend(self.dtypes.iter().map(|(label, dtype)| (label.clone(), *dtype)));
        let mut table = self.derive(self.frame.concat(&other.frame)?);
        table.reassert_dtypes(&snapshot);
        table.merged = self.merged && other.merged && table.has_unique_reflections()?;
        Ok(table)
    }

    pub fn sort_index(&mut self) -> Result<()> {
        self.frame.sort_by_index()
    }

    pub fn set_index(&mut self, labels: &[&str]) -> Result<()> {
        self.with_frame(|frame| frame.set_index(labels))
    }

    pub fn reset_index(&mut self) {
        let snapshot = self.cache_index_dtypes();
        self.frame.reset_index();
        self.reassert_dtypes(&snapshot);
    }

    /// Labels of the phase columns
    pub fn get_phase_keys(&self) -> Vec<String> {
        self.columns()
            .filter(|(_, dtype, _)| dtype.is_phase())
            .map(|(label, _, _)| label.to_string())
            .collect()
    }

    /// First column tagged as M/ISYM
    pub fn isym_label(&self) -> Option<String> {
        self.columns()
            .find(|(_, dtype, _)| *dtype == ColumnType::MIsym)
            .map(|(label, _, _)| label.to_string())
    }

    /// The three Miller index columns: the first three `HklIndex` columns,
    /// or columns labelled H, K and L.
    pub fn hkl_labels(&self) -> Result<[String; 3]> {
        let tagged: Vec<&str> = self
            .columns()
            .filter(|(_, dtype, _)| *dtype == ColumnType::HklIndex)
            .map(|(label, _, _)| label)
            .collect();
        if tagged.len() >= 3 {
            return Ok([
                tagged[0].to_string(),
                tagged[1].to_string(),
                tagged[2].to_string(),
            ]);
        }
        if [H_LABEL, K_LABEL, L_LABEL].iter().all(|l| self.contains(l)) {
            return Ok([H_LABEL.to_string(), K_LABEL.to_string(), L_LABEL.to_string()]);
        }
        Err(Error::MissingColumn("H, K, L".to_string()))
    }

    pub fn miller_indices(&self) -> Result<Vec<MillerIndex>> {
        let labels = self.hkl_labels()?;
        let mut axes: Vec<Vec<i32>> = Vec::with_capacity(3);
        for label in &labels {
            let values = self.values(label)?;
            let ints = values.to_integral().map_err(|row| Error::NonIntegerIndex {
                column: label.clone(),
                row,
                value: values.get_f64(row).unwrap_or(f64::NAN),
            })?;
            axes.push(ints);
        }
        Ok((0..self.len())
            .map(|i| MillerIndex::new(axes[0][i], axes[1][i], axes[2][i]))
            .collect())
    }

    fn phase_columns(&self) -> Result<Vec<(String, Vec<f64>)>> {
        self.get_phase_keys()
            .into_iter()
            .map(|key| {
                let values = self.values(&key)?.to_f64();
                Ok((key, values))
            })
            .collect()
    }

    // ======================== SYMMETRY OPERATIONS ========================

    /// Apply a symmetry operator to every reflection, returning a new table.
    ///
    /// Phases pick up the operator's phase shift. A merged table whose indices
    /// collide afterwards is flagged unmerged.
    pub fn apply_symop(&self, op: &SymOp) -> Result<Self> {
        op.validate()?;
        let labels = self.hkl_labels()?;
        let hkls = self.miller_indices()?;
        let rotated: Vec<MillerIndex> = hkls.iter().map(|h| op.rotate_hkl(h)).collect();
        let mut phases = self.phase_columns()?;
        for (_, values) in phases.iter_mut() {
            for (phase, hkl) in values.iter_mut().zip(&hkls) {
                *phase = wrap_phase(*phase + op.phase_shift(hkl));
            }
        }

        let mut table = self.clone();
        table.with_frame(|frame| {
            write_hkls(frame, &labels, &rotated)?;
            for (key, values) in phases {
                frame.replace(&key, ColumnValues::floats(values))?;
            }
            Ok(())
        })?;
        table.check_merged_unique("apply_symop")?;
        Ok(table)
    }

    /// Map every reflection into the reciprocal ASU, recording M/ISYM.
    ///
    /// Rows already carrying M/ISYM codes are first returned to their observed
    /// indices, so repeated calls give the same table. With `anomalous`, acentric
    /// reflections whose Friedel mate lies in the ASU stay in the minus half.
    pub fn hkl_to_asu(&mut self, anomalous: bool) -> Result<()> {
        let spacegroup = self.require_spacegroup()?;
        let mapper = AsuMapper::new(&spacegroup);
        let labels = self.hkl_labels()?;
        let stored = self.miller_indices()?;
        let mut phases = self.phase_columns()?;
        let existing_isym = self.isym_label();

        let observed = match &existing_isym {
            Some(label) => {
                let codes = self.isym_codes(label)?;
                let mut observed = Vec::with_capacity(stored.len());
                for (row, (hkl, code)) in stored.iter().zip(&codes).enumerate() {
                    let back = unmap_row(&mapper, hkl, *code)?;
                    for (_, values) in phases.iter_mut() {
                        values[row] = back.revert_phase(values[row]);
                    }
                    observed.push(back.hkl);
                }
                debug!("Restored {} observed indices before ASU mapping", observed.len());
                observed
            }
            None => stored,
        };

        let mappings = map_all(&mapper, &observed);
        let mut hkls = Vec::with_capacity(mappings.len());
        let mut isyms = Vec::with_capacity(mappings.len());
        for (row, (obs, mapping)) in observed.iter().zip(&mappings).enumerate() {
            let mut phase_map = *mapping;
            if anomalous && mapping.friedel && !spacegroup.is_centric(obs) {
                phase_map.friedel = false;
                hkls.push(-mapping.hkl);
            } else {
                hkls.push(mapping.hkl);
            }
            for (_, values) in phases.iter_mut() {
                values[row] = wrap_phase(phase_map.apply_phase(values[row]));
            }
            isyms.push(mapping.isym);
        }

        let isym_label = existing_isym.unwrap_or_else(|| MISYM_LABEL.to_string());
        self.with_frame(|frame| {
            write_hkls(frame, &labels, &hkls)?;
            for (key, values) in phases {
                frame.replace(&key, ColumnValues::floats(values))?;
            }
            if frame.is_index(&isym_label) {
                frame.replace(&isym_label, ColumnValues::ints(isyms))
            } else {
                frame.insert(&isym_label, ColumnValues::ints(isyms))
            }
        })?;
        self.dtypes.insert(isym_label, ColumnType::MIsym);
        self.check_merged_unique("hkl_to_asu")?;
        Ok(())
    }

    /// Undo `hkl_to_asu` using the M/ISYM codes in `isym_label`, then drop them
    pub fn hkl_to_observed(&mut self, isym_label: &str) -> Result<()> {
        let spacegroup = self.require_spacegroup()?;
        let mapper = AsuMapper::new(&spacegroup);
        let labels = self.hkl_labels()?;
        let stored = self.miller_indices()?;
        let codes = self.isym_codes(isym_label)?;
        let mut phases = self.phase_columns()?;

        let mut observed = Vec::with_capacity(stored.len());
        for (row, (hkl, code)) in stored.iter().zip(&codes).enumerate() {
            let back = unmap_row(&mapper, hkl, *code)?;
            for (_, values) in phases.iter_mut() {
                values[row] = wrap_phase(back.revert_phase(values[row]));
            }
            observed.push(back.hkl);
        }

        self.with_frame(|frame| {
            write_hkls(frame, &labels, &observed)?;
            for (key, values) in phases {
                frame.replace(&key, ColumnValues::floats(values))?;
            }
            frame.remove(isym_label).map(|_| ())
        })?;
        self.attrs.column_datasets.remove(isym_label);
        self.check_merged_unique("hkl_to_observed")?;
        Ok(())
    }

    fn isym_codes(&self, label: &str) -> Result<Vec<i32>> {
        let values = self.values(label)?;
        values.to_integral().map_err(|_| Error::IncompatibleValues {
            column: label.to_string(),
            dtype: ColumnType::MIsym.name().to_string(),
        })
    }

    /// True when no two rows share a Miller index (and batch number, when a
    /// batch column is part of the index). Tables without Miller indices fall
    /// back to their frame index.
    pub fn has_unique_reflections(&self) -> Result<bool> {
        if self.hkl_labels().is_err() {
            return self.frame.has_unique_index();
        }
        let hkls = self.miller_indices()?;
        let batch_label = self
            .index_labels()
            .into_iter()
            .find(|label| self.column_type(label) == Some(ColumnType::Batch));
        let batches = match batch_label {
            Some(label) => Some(self.values(&label)?.to_integral().map_err(|_| {
                Error::IncompatibleValues {
                    column: label.clone(),
                    dtype: ColumnType::Batch.name().to_string(),
                }
            })?),
            None => None,
        };
        let mut seen = HashSet::with_capacity(hkls.len());
        Ok(hkls
            .iter()
            .enumerate()
            .all(|(row, hkl)| seen.insert((*hkl, batches.as_ref().map(|b| b[row])))))
    }

    fn check_merged_unique(&mut self, operation: &str) -> Result<()> {
        if self.merged && !self.has_unique_reflections()? {
            warn!(
                "{} produced repeated Miller indices; table is now flagged unmerged",
                operation
            );
            self.merged = false;
        }
        Ok(())
    }

    /// Add a `CENTRIC` column
    pub fn label_centrics(&mut self) -> Result<()> {
        let spacegroup = self.require_spacegroup()?;
        let centric: Vec<bool> = self
            .miller_indices()?
            .iter()
            .map(|h| spacegroup.is_centric(h))
            .collect();
        self.insert_column(CENTRIC_LABEL, ColumnType::Bool, ColumnValues::bools(centric))
    }

    /// Add a `dHKL` column with the resolution of every reflection
    pub fn compute_dhkl(&mut self) -> Result<()> {
        let cell = self.require_cell()?;
        let d = cell.d_spacings(&self.miller_indices()?)?;
        self.insert_column(DHKL_LABEL, ColumnType::Real, ColumnValues::floats(d))
    }

    /// Add an `ABSENT` column flagging systematic absences
    pub fn label_absences(&mut self) -> Result<()> {
        let spacegroup = self.require_spacegroup()?;
        let absent: Vec<bool> = self
            .miller_indices()?
            .iter()
            .map(|h| miller::is_absent(h, &spacegroup))
            .collect();
        self.insert_column(ABSENT_LABEL, ColumnType::Bool, ColumnValues::bools(absent))
    }

    /// Drop systematically absent reflections
    pub fn remove_absences(&mut self) -> Result<()> {
        let spacegroup = self.require_spacegroup()?;
        let keep: Vec<bool> = self
            .miller_indices()?
            .iter()
            .map(|h| !miller::is_absent(h, &spacegroup))
            .collect();
        let before = self.len();
        self.with_frame(|frame| {
            *frame = frame.filter(&keep)?;
            Ok(())
        })?;
        debug!("Removed {} systematic absences", before - self.len());
        Ok(())
    }

    /// Add an `EPSILON` column with the multiplicity factor of every reflection
    pub fn compute_multiplicity(&mut self) -> Result<()> {
        let spacegroup = self.require_spacegroup()?;
        let eps: Vec<i32> = self
            .miller_indices()?
            .iter()
            .map(|h| miller::epsilon(h, &spacegroup))
            .collect();
        self.insert_column(EPSILON_LABEL, ColumnType::Integer, ColumnValues::ints(eps))
    }

    /// Assign reflections to `nbins` resolution shells holding equal counts.
    ///
    /// Bin 0 is the lowest resolution. Adds a `bin` column and returns one
    /// `"dmax - dmin"` label per bin.
    pub fn assign_resolution_bins(&mut self, nbins: usize) -> Result<Vec<String>> {
        if nbins == 0 {
            return Err(Error::InvalidArgument(
                "number of resolution bins must be positive".to_string(),
            ));
        }
        let cell = self.require_cell()?;
        let d = cell.d_spacings(&self.miller_indices()?)?;
        let n = d.len();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| d[b].total_cmp(&d[a]));

        let mut bins = vec![0i32; n];
        let mut limits = vec![(f64::NAN, f64::NAN); nbins];
        for (rank, &row) in order.iter().enumerate() {
            let bin = rank * nbins / n;
            bins[row] = bin as i32;
            let (dmax, dmin) = &mut limits[bin];
            if dmax.is_nan() {
                *dmax = d[row];
            }
            *dmin = d[row];
        }

        self.insert_column(BIN_LABEL, ColumnType::Integer, ColumnValues::ints(bins))?;
        Ok(limits
            .iter()
            .map(|(dmax, dmin)| format!("{:.2} - {:.2}", dmax, dmin))
            .collect())
    }

    /// Generate every symmetry mate and reduce the table to P 1.
    ///
    /// Mates are placed in the P 1 ASU; repeated indices are kept once.
    pub fn expand_to_p1(&mut self) -> Result<()> {
        if !self.merged {
            return Err(Error::InvalidArgument(
                "expand_to_p1 needs merged data".to_string(),
            ));
        }
        let spacegroup = self.require_spacegroup()?;
        let p1 = SpaceGroup::p1();
        let p1_mapper = AsuMapper::new(&p1);
        let labels = self.hkl_labels()?;
        let hkls = self.miller_indices()?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        let mut expanded = Vec::new();
        let mut phase_maps = Vec::new();
        for (row, hkl) in hkls.iter().enumerate() {
            for op in spacegroup.ops() {
                let mapped = p1_mapper.map(&op.rotate_hkl(hkl));
                if seen.insert(mapped.hkl) {
                    rows.push(row);
                    expanded.push(mapped.hkl);
                    phase_maps.push(AsuMapping {
                        phase_shift: op.phase_shift(hkl),
                        ..mapped
                    });
                }
            }
        }

        let mut phases = self.phase_columns()?;
        for (_, values) in phases.iter_mut() {
            *values = rows
                .iter()
                .zip(&phase_maps)
                .map(|(&row, map)| wrap_phase(map.apply_phase(values[row])))
                .collect();
        }

        let isym_label = self.isym_label();
        self.with_frame(|frame| {
            *frame = frame.take(&rows)?;
            write_hkls(frame, &labels, &expanded)?;
            for (key, values) in phases {
                frame.replace(&key, ColumnValues::floats(values))?;
            }
            if let Some(label) = &isym_label {
                frame.remove(label)?;
            }
            Ok(())
        })?;
        debug!(
            "Expanded {} reflections to {} in P 1",
            hkls.len(),
            self.len()
        );
        self.spacegroup = Some(Arc::new(p1));
        Ok(())
    }

    /// Add the Friedel mate of every reflection, with negated phases
    pub fn expand_anomalous(&mut self) -> Result<()> {
        let labels = self.hkl_labels()?;
        let hkls = self.miller_indices()?;
        let rows: Vec<usize> = hkls
            .iter()
            .enumerate()
            .filter(|(_, h)| **h != -**h)
            .map(|(i, _)| i)
            .collect();
        let mates: Vec<MillerIndex> = rows.iter().map(|&i| -hkls[i]).collect();
        let phase_keys = self.get_phase_keys();

        self.with_frame(|frame| {
            let mut friedel = frame.take(&rows)?;
            write_hkls(&mut friedel, &labels, &mates)?;
            for key in &phase_keys {
                let negated = friedel
                    .get(key)
                    .map(|v| v.to_f64().into_iter().map(|p| wrap_phase(-p)).collect::<Vec<_>>())
                    .ok_or_else(|| Error::MissingColumn(key.clone()))?;
                friedel.replace(key, ColumnValues::floats(negated))?;
            }
            *frame = frame.concat(&friedel)?;
            Ok(())
        })?;
        self.merged = false;
        Ok(())
    }

    /// Wrap every phase column into [-180, 180)
    pub fn canonicalize_phases(&mut self) -> Result<()> {
        let phases = self.phase_columns()?;
        self.with_frame(|frame| {
            for (key, values) in phases {
                let wrapped = values.into_iter().map(wrap_phase).collect();
                frame.replace(&key, ColumnValues::floats(wrapped))?;
            }
            Ok(())
        })
    }

    /// Split Friedel-pair columns into one row per observation.
    ///
    /// Each `plus[i]`/`minus[i]` pair becomes a single column (label without
    /// `(+)`, Friedel tags collapsed). Plus values stay at hkl, minus values
    /// move to -hkl. Centric reflections, whose -hkl is equivalent to hkl,
    /// keep only their plus row. The result is unmerged.
    pub fn unmerge_anomalous(&mut self, plus: &[&str], minus: &[&str]) -> Result<()> {
        if plus.len() != minus.len() {
            return Err(Error::LengthMismatch {
                expected: plus.len(),
                actual: minus.len(),
            });
        }
        if let Some(missing) = plus.iter().chain(minus).find(|l| !self.contains(l)) {
            return Err(Error::MissingColumn(missing.to_string()));
        }
        let labels = self.hkl_labels()?;
        let hkls = self.miller_indices()?;
        let mates: Vec<MillerIndex> = hkls.iter().map(|h| -h).collect();
        let acentric: Option<Vec<bool>> = self
            .spacegroup
            .as_ref()
            .map(|sg| hkls.iter().map(|h| !sg.is_centric(h)).collect());

        let mut plus_frame = self.frame.clone();
        let mut minus_frame = self.frame.clone();
        let mut snapshot = self.cache_index_dtypes();
        let mut renames = Vec::with_capacity(plus.len());
        for (p, m) in plus.iter().zip(minus) {
            let collapsed = strip_friedel_suffix(p);
            plus_frame.remove(m)?;
            minus_frame.remove(p)?;
            plus_frame.rename(p, &collapsed)?;
            minus_frame.rename(m, &collapsed)?;

            let dtype = snapshot
                .get(p)
                .unwrap_or(ColumnType::Untyped)
                .friedel_collapsed();
            snapshot.dtypes.remove(*p);
            snapshot.dtypes.remove(*m);
            snapshot.dtypes.insert(collapsed.clone(), dtype);
            renames.push((p.to_string(), m.to_string(), collapsed));
        }
        write_hkls(&mut minus_frame, &labels, &mates)?;
        if let Some(keep) = &acentric {
            minus_frame = minus_frame.filter(keep)?;
        }
        let combined = plus_frame.concat(&minus_frame)?;

        self.frame = combined;
        self.reassert_dtypes(&snapshot);
        for (p, m, collapsed) in renames {
            self.attrs.rename_column(&p, &collapsed);
            self.attrs.column_datasets.remove(&m);
        }
        self.merged = false;
        debug!("Unmerged anomalous pairs into {} rows", self.len());
        Ok(())
    }

    // ======================== FILE I/O ========================

    pub fn read_mtz(path: impl AsRef<Path>) -> Result<Self> {
        io::mtz::read_mtz(path.as_ref(), &CodecConfig::default())
    }

    pub fn read_mtz_with(path: impl AsRef<Path>, config: &CodecConfig) -> Result<Self> {
        io::mtz::read_mtz(path.as_ref(), config)
    }

    pub fn write_mtz(&self, path: impl AsRef<Path>) -> Result<()> {
        io::mtz::write_mtz(self, path.as_ref(), &CodecConfig::default())
    }

    pub fn write_mtz_with(&self, path: impl AsRef<Path>, config: &CodecConfig) -> Result<()> {
        io::mtz::write_mtz(self, path.as_ref(), config)
    }

    /// Write `value` and `sigma` as a SHELX-style HKL file
    pub fn write_hkl(&self, path: impl AsRef<Path>, value: &str, sigma: &str) -> Result<()> {
        io::hkl::write_hkl(self, path.as_ref(), value, sigma, None)
    }

    /// As [`write_hkl`](Self::write_hkl), with a batch number column
    pub fn write_hkl_with_batch(
        &self,
        path: impl AsRef<Path>,
        value: &str,
        sigma: &str,
        batch: &str,
    ) -> Result<()> {
        io::hkl::write_hkl(self, path.as_ref(), value, sigma, Some(batch))
    }
}

fn write_hkls(frame: &mut Frame, labels: &[String; 3], hkls: &[MillerIndex]) -> Result<()> {
    for (axis, label) in labels.iter().enumerate() {
        let values: Vec<i32> = hkls.iter().map(|h| h[axis]).collect();
        frame.replace(label, ColumnValues::ints(values))?;
    }
    Ok(())
}

/// Recover the observed index of a stored row.
///
/// Rows kept in the minus half by an anomalous mapping hold `-asu` and
/// un-negated phases.
fn unmap_row(mapper: &AsuMapper, stored: &MillerIndex, isym: i32) -> Result<AsuMapping> {
    let code = isym.rem_euclid(256);
    let minus_half = code % 2 == 0 && !mapper.contains(stored) && mapper.contains(&-stored);
    let asu_hkl = if minus_half { -stored } else { *stored };
    let mut mapping = mapper.unmap(&asu_hkl, code)?;
    if minus_half {
        mapping.friedel = false;
    }
    Ok(mapping)
}

fn map_all(mapper: &AsuMapper, hkls: &[MillerIndex]) -> Vec<AsuMapping> {
    #[cfg(feature = "parallel")]
    {
        hkls.par_iter().map(|h| mapper.map(h)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        hkls.iter().map(|h| mapper.map(h)).collect()
    }
}

fn strip_friedel_suffix(label: &str) -> String {
    label.replace("(+)", "").replace("(-)", "")
}
