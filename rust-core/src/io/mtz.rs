use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use crate::config::{CodecConfig, BASE_DATASET, MTZ_DATA_START_WORD, MTZ_RECORD_LEN};
use crate::dataset::{BatchHeader, ColumnType, ColumnValues, DatasetRecord, ReflectionTable};
use crate::error::{Error, Result};
use crate::io::mtz_header::{pad_record, ColumnRecord, Endian, MtzHeader, SymmetryInfo};
use crate::io::write_atomically;
use crate::lattice::UnitCell;
use crate::symmetries::SpaceGroup;

const MAGIC: &[u8; 4] = b"MTZ ";
const DATA_START: usize = (MTZ_DATA_START_WORD as usize - 1) * 4;

// ======================== READING ========================

/// Bounds-checked view of the file bytes
struct Reader<'a> {
    bytes: &'a [u8],
    path: &'a Path,
    endian: Endian,
}

impl<'a> Reader<'a> {
    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| Error::format(self.path, format!("file truncated at byte {offset}")))
    }

    fn word(&self, offset: usize) -> Result<[u8; 4]> {
        let s = self.slice(offset, 4)?;
        Ok([s[0], s[1], s[2], s[3]])
    }

    fn i32_at(&self, offset: usize) -> Result<i32> {
        Ok(self.endian.read_i32(self.word(offset)?))
    }

    fn f32_at(&self, offset: usize) -> Result<f32> {
        Ok(self.endian.read_f32(self.word(offset)?))
    }

    fn i64_at(&self, offset: usize) -> Result<i64> {
        let s = self.slice(offset, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(s);
        Ok(self.endian.read_i64(buf))
    }

    fn record(&self, offset: usize) -> Result<String> {
        let raw = self.slice(offset, MTZ_RECORD_LEN)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    fn has_record(&self, offset: usize) -> bool {
        offset + MTZ_RECORD_LEN <= self.bytes.len()
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::format(self.path, reason)
    }
}

fn keyword(record: &str) -> &str {
    record.split_whitespace().next().unwrap_or("")
}

fn token<T: FromStr>(reader: &Reader, tokens: &[&str], i: usize, what: &str) -> Result<T> {
    tokens
        .get(i)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| reader.error(format!("invalid or missing {what}")))
}

/// Read an MTZ file from disk
pub fn read_mtz(path: &Path, config: &CodecConfig) -> Result<ReflectionTable> {
    let bytes = std::fs::read(path)?;
    let table = decode_mtz(&bytes, path, config)?;
    info!(
        "Read {} reflections with {} columns from {}",
        table.len(),
        table.labels().len() + table.index_labels().len(),
        path.display()
    );
    Ok(table)
}

/// Parse an MTZ image held in memory. `path` is only used in error messages.
pub fn decode_mtz(bytes: &[u8], path: &Path, config: &CodecConfig) -> Result<ReflectionTable> {
    if bytes.len() < DATA_START || &bytes[0..4] != MAGIC {
        return Err(Error::format(path, "missing 'MTZ ' file signature"));
    }
    let endian = Endian::from_stamp(&bytes[8..12])
        .ok_or_else(|| Error::format(path, format!("unknown machine stamp {:02x?}", &bytes[8..12])))?;
    let reader = Reader {
        bytes,
        path,
        endian,
    };
    debug!("MTZ machine stamp: {:?}", endian);

    let word = reader.i32_at(4)?;
    let header_word = if word == -1 {
        reader.i64_at(12)?
    } else {
        i64::from(word)
    };
    if header_word < MTZ_DATA_START_WORD as i64 {
        return Err(reader.error(format!("header position {header_word} inside the file preamble")));
    }
    let header_start = usize::try_from((header_word - 1) * 4)
        .map_err(|_| reader.error("header position out of range"))?;

    let (header, batches) = read_header(&reader, header_start)?;

    let ncol = header.ncol;
    let nrefl = header.nrefl;
    if header.columns.len() != ncol {
        return Err(reader.error(format!(
            "NCOL announces {ncol} columns but {} COLUMN records were found",
            header.columns.len()
        )));
    }
    let data_len = ncol
        .checked_mul(nrefl)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| reader.error("data block size overflows"))?;
    if DATA_START + data_len > header_start {
        return Err(reader.error("data block overlaps the header"));
    }

    let mut raw: Vec<Vec<f64>> = vec![Vec::with_capacity(nrefl); ncol];
    for row in 0..nrefl {
        for (col, values) in raw.iter_mut().enumerate() {
            let v = reader.f32_at(DATA_START + 4 * (row * ncol + col))?;
            let missing = header.missing.is_some_and(|m| m == v);
            values.push(if missing { f64::NAN } else { f64::from(v) });
        }
    }

    let mut table = ReflectionTable::new();
    let mut hkl_labels: Vec<String> = Vec::new();
    for (record, values) in header.columns.iter().zip(raw) {
        if table.contains(&record.label) {
            return Err(reader.error(format!("duplicate column label {}", record.label)));
        }
        let dtype = match ColumnType::from_mtz_code(record.code) {
            Some(t) => t,
            None if config.skip_problem_types => {
                warn!(
                    "Column {} has unsupported type '{}'; reading it as R",
                    record.label, record.code
                );
                ColumnType::Real
            }
            None => {
                return Err(Error::UnsupportedColumnType {
                    column: record.label.clone(),
                    code: record.code,
                })
            }
        };
        let values = ColumnValues::floats(values);
        let values = if dtype == ColumnType::HklIndex {
            let ints = values.to_integral().map_err(|row| Error::CorruptIndex {
                column: record.label.clone(),
                row,
                value: values.get_f64(row).unwrap_or(f64::NAN) as f32,
            })?;
            hkl_labels.push(record.label.clone());
            ColumnValues::ints(ints)
        } else if dtype.is_integer() {
            match values.to_integral() {
                Ok(ints) => ColumnValues::ints(ints),
                Err(_) => values,
            }
        } else {
            values
        };
        table.insert_column(&record.label, dtype, values)?;
        table
            .attrs
            .column_datasets
            .insert(record.label.clone(), record.dataset_id);
    }
    if hkl_labels.len() >= 3 {
        let keys: Vec<&str> = hkl_labels.iter().take(3).map(String::as_str).collect();
        table.set_index(&keys)?;
    } else {
        warn!("{}: fewer than three Miller index columns", path.display());
    }

    let cell = header
        .cell
        .map(UnitCell::from_parameters)
        .filter(UnitCell::is_crystal)
        .or_else(|| {
            header
                .datasets
                .iter()
                .filter_map(|d| d.cell.map(UnitCell::from_parameters))
                .find(UnitCell::is_crystal)
        });
    match cell {
        Some(cell) => table.set_cell(cell),
        None => debug!("{}: no crystal cell in header", path.display()),
    }
    match spacegroup_from_header(&header)? {
        Some(sg) => table.set_spacegroup(sg),
        None => warn!("{}: no usable space group in header", path.display()),
    }

    table.set_merged(header.nbatch == 0);
    table.attrs.title = header.title;
    table.attrs.history = header.history;
    table.attrs.datasets = header.datasets;
    table.attrs.batches = batches;
    Ok(table)
}

fn read_header(reader: &Reader, start: usize) -> Result<(MtzHeader, Vec<BatchHeader>)> {
    let mut header = MtzHeader::default();
    let mut offset = start;
    loop {
        let record = reader.record(offset)?;
        offset += MTZ_RECORD_LEN;
        if keyword(&record) == "END" {
            break;
        }
        header
            .parse_record(&record)
            .map_err(|reason| reader.error(reason))?;
    }

    let mut batches = Vec::new();
    while reader.has_record(offset) {
        let record = reader.record(offset)?;
        offset += MTZ_RECORD_LEN;
        match keyword(&record) {
            "MTZENDOFHEADERS" => break,
            "MTZHIST" => {
                let tokens: Vec<&str> = record.split_whitespace().collect();
                let n: usize = token(reader, &tokens, 1, "history line count")?;
                for _ in 0..n {
                    header.history.push(reader.record(offset)?.trim_end().to_string());
                    offset += MTZ_RECORD_LEN;
                }
            }
            "MTZBATS" => {
                for _ in 0..header.nbatch {
                    let (batch, next) = read_batch(reader, offset)?;
                    batches.push(batch);
                    offset = next;
                }
            }
            other => debug!("Skipping header record {}", other),
        }
    }
    Ok((header, batches))
}

fn read_batch(reader: &Reader, mut offset: usize) -> Result<(BatchHeader, usize)> {
    let record = reader.record(offset)?;
    offset += MTZ_RECORD_LEN;
    let tokens: Vec<&str> = record.split_whitespace().collect();
    if tokens.first() != Some(&"BH") {
        return Err(reader.error(format!("expected batch header, found '{}'", record.trim_end())));
    }
    let number: i32 = token(reader, &tokens, 1, "batch number")?;
    let nwords: usize = token(reader, &tokens, 2, "batch word count")?;
    let nint: usize = token(reader, &tokens, 3, "batch integer count")?;
    let nreal: usize = token(reader, &tokens, 4, "batch real count")?;
    if nint + nreal != nwords {
        return Err(reader.error(format!("batch {number}: {nint} + {nreal} != {nwords} words")));
    }

    let title_record = reader.record(offset)?;
    offset += MTZ_RECORD_LEN;
    let title = title_record
        .trim_end()
        .strip_prefix("TITLE")
        .unwrap_or("")
        .trim()
        .to_string();

    let mut ints = Vec::with_capacity(nint);
    for _ in 0..nint {
        ints.push(reader.i32_at(offset)?);
        offset += 4;
    }
    let mut floats = Vec::with_capacity(nreal);
    for _ in 0..nreal {
        floats.push(reader.f32_at(offset)?);
        offset += 4;
    }

    let mut axes = Vec::new();
    if reader.has_record(offset) {
        let record = reader.record(offset)?;
        if keyword(&record) == "BHCH" {
            axes = record.split_whitespace().skip(1).map(String::from).collect();
            offset += MTZ_RECORD_LEN;
        }
    }

    Ok((
        BatchHeader {
            number,
            title,
            ints,
            floats,
            axes,
        },
        offset,
    ))
}

/// Space group from the SYMM records, or from the catalog when they are absent
fn spacegroup_from_header(header: &MtzHeader) -> Result<Option<SpaceGroup>> {
    let info = header.syminf.as_ref();
    if !header.symm.is_empty() {
        let (number, hm, pg) = info
            .map(|s| (s.number, s.hm.clone(), s.point_group.clone()))
            .unwrap_or_default();
        return SpaceGroup::from_ops(number, hm, pg, header.symm.clone()).map(Some);
    }
    if let Some(info) = info {
        if let Ok(sg) = SpaceGroup::from_number(info.number) {
            return Ok(Some(sg));
        }
        if let Ok(sg) = SpaceGroup::from_hm(&info.hm) {
            return Ok(Some(sg));
        }
    }
    Ok(None)
}

// ======================== WRITING ========================

struct OutputColumn {
    record: ColumnRecord,
    values: Vec<f32>,
}

/// Write a table as a little-endian MTZ file, replacing `path` atomically
pub fn write_mtz(table: &ReflectionTable, path: &Path, config: &CodecConfig) -> Result<()> {
    let bytes = encode_mtz(table, config, Endian::Little)?;
    write_atomically(path, &bytes)?;
    info!(
        "Wrote {} reflections to {} ({} bytes)",
        table.len(),
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Build the complete MTZ image of a table
pub fn encode_mtz(table: &ReflectionTable, config: &CodecConfig, endian: Endian) -> Result<Vec<u8>> {
    let cell = table
        .cell()
        .ok_or(Error::MissingCrystalContext("unit cell"))?;
    let spacegroup = table
        .spacegroup()
        .ok_or(Error::MissingCrystalContext("space group"))?;

    let mut flat = table.clone();
    flat.reset_index();
    let hkl_labels = flat.hkl_labels()?;
    let hkls = flat.miller_indices()?;

    let datasets = if table.attrs.datasets.is_empty() {
        default_datasets(cell, config)
    } else {
        table.attrs.datasets.clone()
    };
    let base_id = datasets.iter().map(|d| d.id).min().unwrap_or(0);
    let data_id = datasets.iter().map(|d| d.id).max().unwrap_or(0);

    let mut order: Vec<String> = hkl_labels.to_vec();
    order.extend(flat.labels().into_iter().filter(|l| !hkl_labels.contains(l)));

    let mut columns: Vec<OutputColumn> = Vec::with_capacity(order.len());
    for label in &order {
        let dtype = flat
            .column_type(label)
            .unwrap_or(ColumnType::Untyped);
        let code = match dtype.mtz_code() {
            Some(code) => code,
            None if config.skip_problem_types => {
                warn!("Skipping column {} of type {}: no MTZ type code", label, dtype);
                continue;
            }
            None => {
                return Err(Error::AmbiguousColumnType {
                    column: label.clone(),
                    dtype: dtype.name().to_string(),
                })
            }
        };
        let values: Vec<f32> = match hkl_labels.iter().position(|l| l == label) {
            Some(axis) => hkls.iter().map(|h| h[axis] as f32).collect(),
            None => flat.values(label)?.to_f64().iter().map(|&v| v as f32).collect(),
        };
        let (min, max) = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<(f32, f32)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 0.0));
        let is_index = dtype == ColumnType::HklIndex;
        let dataset_id = table
            .attrs
            .column_datasets
            .get(label)
            .copied()
            .filter(|id| datasets.iter().any(|d| d.id == *id))
            .unwrap_or(if is_index { base_id } else { data_id });
        columns.push(OutputColumn {
            record: ColumnRecord {
                label: label.clone(),
                code,
                min: f64::from(min),
                max: f64::from(max),
                dataset_id,
            },
            values,
        });
    }

    let batches = output_batches(table, &flat);
    let resolution = if cell.is_crystal() && !hkls.is_empty() {
        let d = cell.d_spacings(&hkls)?;
        d.iter()
            .map(|d| 1.0 / (d * d))
            .filter(|x| x.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
    } else {
        None
    };

    let nrefl = flat.len();
    let ncol = columns.len();
    let header = MtzHeader {
        version: "MTZ:V1.1".to_string(),
        title: if table.attrs.title.is_empty() {
            config.title.clone()
        } else {
            table.attrs.title.clone()
        },
        ncol,
        nrefl,
        nbatch: batches.len(),
        cell: Some(cell.parameters()),
        sort: [0; 5],
        syminf: Some(SymmetryInfo {
            nsym: spacegroup.order(),
            nsymp: spacegroup.n_primitive_ops(),
            lattice: spacegroup.lattice_type(),
            number: spacegroup.number,
            hm: spacegroup.hm.clone(),
            point_group: spacegroup.point_group.clone(),
        }),
        symm: spacegroup.ops().to_vec(),
        resolution,
        missing: None,
        columns: columns.iter().map(|c| c.record.clone()).collect(),
        datasets,
        batch_numbers: batches.iter().map(|b| b.number).collect(),
        history: table.attrs.history.clone(),
    };

    let data_words = (nrefl as u64) * (ncol as u64);
    let header_word = MTZ_DATA_START_WORD + data_words;
    let mut out: Vec<u8> = Vec::with_capacity(DATA_START + 4 * data_words as usize + 4096);
    out.extend_from_slice(MAGIC);
    match i32::try_from(header_word) {
        Ok(word) => {
            out.extend_from_slice(&endian.i32_bytes(word));
            out.extend_from_slice(&endian.stamp());
        }
        Err(_) => {
            out.extend_from_slice(&endian.i32_bytes(-1));
            out.extend_from_slice(&endian.stamp());
            out.extend_from_slice(&endian.i64_bytes(header_word as i64));
        }
    }
    out.resize(DATA_START, 0);

    for row in 0..nrefl {
        for column in &columns {
            out.extend_from_slice(&endian.f32_bytes(column.values[row]));
        }
    }

    for record in header.records() {
        out.extend(pad_record(&record));
    }
    out.extend(pad_record(&format!("MTZHIST {:>3}", header.history.len())));
    for line in &header.history {
        out.extend(pad_record(line));
    }
    if !batches.is_empty() {
        out.extend(pad_record("MTZBATS"));
        for batch in &batches {
            let (nint, nreal) = (batch.ints.len(), batch.floats.len());
            out.extend(pad_record(&format!(
                "BH {:>8} {:>8} {:>8} {:>8}",
                batch.number,
                nint + nreal,
                nint,
                nreal
            )));
            out.extend(pad_record(&format!("TITLE {}", batch.title)));
            for &i in &batch.ints {
                out.extend_from_slice(&endian.i32_bytes(i));
            }
            for &f in &batch.floats {
                out.extend_from_slice(&endian.f32_bytes(f));
            }
            let axes: String = batch.axes.iter().map(|a| format!("{:<8} ", a)).collect();
            out.extend(pad_record(&format!("BHCH {}", axes)));
        }
    }
    out.extend(pad_record("MTZENDOFHEADERS"));

    debug!(
        "Encoded MTZ: {} columns, {} reflections, {} batches",
        ncol,
        nrefl,
        batches.len()
    );
    Ok(out)
}

fn default_datasets(cell: &UnitCell, config: &CodecConfig) -> Vec<DatasetRecord> {
    let mut base = DatasetRecord::new(0, BASE_DATASET, BASE_DATASET, BASE_DATASET);
    base.cell = Some(cell.parameters());
    let mut data = DatasetRecord::new(
        1,
        &config.project_name,
        &config.crystal_name,
        &config.dataset_name,
    );
    data.cell = Some(cell.parameters());
    data.wavelength = config.wavelength;
    vec![base, data]
}

/// Batch headers to write: the table's own, or synthesized from its batch column
fn output_batches(table: &ReflectionTable, flat: &ReflectionTable) -> Vec<BatchHeader> {
    if table.merged() {
        if !table.attrs.batches.is_empty() {
            debug!("Merged table: dropping {} batch headers", table.attrs.batches.len());
        }
        return Vec::new();
    }
    if !table.attrs.batches.is_empty() {
        return table.attrs.batches.clone();
    }
    let batch_column = flat
        .columns()
        .find(|(_, dtype, _)| *dtype == ColumnType::Batch)
        .map(|(_, _, values)| values.to_f64());
    match batch_column {
        Some(values) => {
            let numbers: BTreeSet<i32> = values
                .iter()
                .filter(|v| v.is_finite())
                .map(|v| v.round() as i32)
                .collect();
            debug!("Synthesizing {} batch headers", numbers.len());
            numbers.into_iter().map(BatchHeader::new).collect()
        }
        None => {
            warn!("Writing an unmerged table without batches; it will read back as merged");
            Vec::new()
        }
    }
}
