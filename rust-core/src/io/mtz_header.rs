use serde::{Deserialize, Serialize};

use crate::config::MTZ_RECORD_LEN;
use crate::dataset::DatasetRecord;
use crate::symmetries::SymOp;

/// Byte order of the numeric parts of an MTZ file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Decode the machine stamp; the high nibble of the first byte names the
    /// real-number format (4 = little-endian IEEE, 1 = big-endian IEEE).
    pub fn from_stamp(stamp: &[u8]) -> Option<Self> {
        match stamp.first()? >> 4 {
            4 => Some(Endian::Little),
            1 => Some(Endian::Big),
            _ => None,
        }
    }

    pub fn stamp(self) -> [u8; 4] {
        match self {
            Endian::Little => [0x44, 0x41, 0x00, 0x00],
            Endian::Big => [0x11, 0x11, 0x00, 0x00],
        }
    }

    pub fn i32_bytes(self, value: i32) -> [u8; 4] {
        match self {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        }
    }

    pub fn i64_bytes(self, value: i64) -> [u8; 8] {
        match self {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        }
    }

    pub fn f32_bytes(self, value: f32) -> [u8; 4] {
        match self {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        }
    }

    pub fn read_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Endian::Little => i32::from_le_bytes(bytes),
            Endian::Big => i32::from_be_bytes(bytes),
        }
    }

    pub fn read_i64(self, bytes: [u8; 8]) -> i64 {
        match self {
            Endian::Little => i64::from_le_bytes(bytes),
            Endian::Big => i64::from_be_bytes(bytes),
        }
    }

    pub fn read_f32(self, bytes: [u8; 4]) -> f32 {
        match self {
            Endian::Little => f32::from_le_bytes(bytes),
            Endian::Big => f32::from_be_bytes(bytes),
        }
    }
}

/// Contents of the `SYMINF` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymmetryInfo {
    pub nsym: usize,
    pub nsymp: usize,
    pub lattice: char,
    pub number: u16,
    pub hm: String,
    pub point_group: String,
}

/// One `COLUMN` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub label: String,
    pub code: char,
    pub min: f64,
    pub max: f64,
    pub dataset_id: i32,
}

/// The text header of an MTZ file, up to and including `END`, plus history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MtzHeader {
    pub version: String,
    pub title: String,
    pub ncol: usize,
    pub nrefl: usize,
    pub nbatch: usize,
    pub cell: Option<[f64; 6]>,
    pub sort: [i32; 5],
    pub syminf: Option<SymmetryInfo>,
    pub symm: Vec<SymOp>,
    /// 1/d² range
    pub resolution: Option<(f64, f64)>,
    /// Numeric missing-value sentinel; `None` when missing values are NaN
    pub missing: Option<f32>,
    pub columns: Vec<ColumnRecord>,
    pub datasets: Vec<DatasetRecord>,
    pub batch_numbers: Vec<i32>,
    pub history: Vec<String>,
}

fn parse_num<T: std::str::FromStr>(token: Option<&str>, what: &str) -> Result<T, String> {
    token
        .ok_or_else(|| format!("missing {what}"))?
        .parse()
        .map_err(|_| format!("invalid {what}"))
}

fn parse_cell(tokens: &[&str]) -> Result<[f64; 6], String> {
    if tokens.len() < 6 {
        return Err("cell needs six parameters".to_string());
    }
    let mut cell = [0.0; 6];
    for (slot, token) in cell.iter_mut().zip(tokens) {
        *slot = token
            .parse()
            .map_err(|_| format!("invalid cell parameter '{token}'"))?;
    }
    Ok(cell)
}

/// Split `"  12 some name"` into the dataset id and the trimmed remainder
fn split_id(rest: &str) -> Result<(i32, String), String> {
    let rest = rest.trim_start();
    let (id, name) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let id = id.parse().map_err(|_| format!("invalid dataset id '{id}'"))?;
    Ok((id, name.trim().to_string()))
}

impl MtzHeader {
    fn dataset_mut(&mut self, id: i32) -> &mut DatasetRecord {
        if let Some(pos) = self.datasets.iter().position(|d| d.id == id) {
            return &mut self.datasets[pos];
        }
        self.datasets.push(DatasetRecord::new(id, "", "", ""));
        let last = self.datasets.len() - 1;
        &mut self.datasets[last]
    }

    /// Parse one main-header record (anything between `VERS` and `END`).
    ///
    /// Unknown keywords are ignored.
    pub fn parse_record(&mut self, record: &str) -> Result<(), String> {
        let record = record.trim_end();
        let (keyword, rest) = record.split_once(' ').unwrap_or((record, ""));
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let keyword = keyword.to_ascii_uppercase();

        match keyword.as_str() {
            "VERS" => self.version = rest.trim().to_string(),
            "TITLE" => self.title = rest.trim().to_string(),
            "NCOL" => {
                self.ncol = parse_num(tokens.first().copied(), "column count")?;
                self.nrefl = parse_num(tokens.get(1).copied(), "reflection count")?;
                self.nbatch = parse_num(tokens.get(2).copied().or(Some("0")), "batch count")?;
            }
            "CELL" => self.cell = Some(parse_cell(&tokens)?),
            "SORT" => {
                for (slot, token) in self.sort.iter_mut().zip(&tokens) {
                    *slot = token.parse().unwrap_or(0);
                }
            }
            "SYMINF" => self.syminf = Some(parse_syminf(rest)?),
            "SYMM" => {
                let op = SymOp::parse(rest).map_err(|e| e.to_string())?;
                self.symm.push(op);
            }
            "RESO" => {
                let lo = parse_num(tokens.first().copied(), "resolution")?;
                let hi = parse_num(tokens.get(1).copied(), "resolution")?;
                self.resolution = Some((lo, hi));
            }
            "VALM" => {
                self.missing = match tokens.first() {
                    Some(t) if t.eq_ignore_ascii_case("NAN") => None,
                    Some(t) => Some(t.parse().map_err(|_| format!("invalid VALM '{t}'"))?),
                    None => None,
                }
            }
            "COLUMN" => {
                let label = tokens.first().ok_or("COLUMN record without label")?;
                let code = tokens
                    .get(1)
                    .and_then(|t| t.chars().next())
                    .ok_or("COLUMN record without type")?;
                self.columns.push(ColumnRecord {
                    label: label.to_string(),
                    code,
                    min: tokens.get(2).and_then(|t| t.parse().ok()).unwrap_or(0.0),
                    max: tokens.get(3).and_then(|t| t.parse().ok()).unwrap_or(0.0),
                    dataset_id: tokens.get(4).and_then(|t| t.parse().ok()).unwrap_or(0),
                });
            }
            "PROJECT" => {
                let (id, name) = split_id(rest)?;
                self.dataset_mut(id).project = name;
            }
            "CRYSTAL" => {
                let (id, name) = split_id(rest)?;
                self.dataset_mut(id).crystal = name;
            }
            "DATASET" => {
                let (id, name) = split_id(rest)?;
                self.dataset_mut(id).dataset = name;
            }
            "DCELL" => {
                let id = parse_num(tokens.first().copied(), "dataset id")?;
                let cell = parse_cell(&tokens[1.min(tokens.len())..])?;
                self.dataset_mut(id).cell = Some(cell);
            }
            "DWAVEL" => {
                let id = parse_num(tokens.first().copied(), "dataset id")?;
                let wavelength = parse_num(tokens.get(1).copied(), "wavelength")?;
                self.dataset_mut(id).wavelength = wavelength;
            }
            "BATCH" => {
                for token in &tokens {
                    let number = token
                        .parse()
                        .map_err(|_| format!("invalid batch number '{token}'"))?;
                    self.batch_numbers.push(number);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Main header records, `VERS` through `END`, unpadded
    pub fn records(&self) -> Vec<String> {
        let mut out = vec![
            format!("VERS {}", self.version),
            format!("TITLE {}", self.title),
            format!("NCOL {:>8} {:>12} {:>8}", self.ncol, self.nrefl, self.nbatch),
        ];
        if let Some(c) = &self.cell {
            out.push(format!(
                "CELL  {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                c[0], c[1], c[2], c[3], c[4], c[5]
            ));
        }
        out.push(format!(
            "SORT  {:>3} {:>3} {:>3} {:>3} {:>3}",
            self.sort[0], self.sort[1], self.sort[2], self.sort[3], self.sort[4]
        ));
        if let Some(s) = &self.syminf {
            out.push(format!(
                "SYMINF {:>3} {:>2} {} {:>5} {:>22} PG{}",
                s.nsym,
                s.nsymp,
                s.lattice,
                s.number,
                format!("'{}'", s.hm),
                s.point_group
            ));
        }
        for op in &self.symm {
            out.push(format!("SYMM {}", op.triplet().to_uppercase().replace(',', ",  ")));
        }
        if let Some((lo, hi)) = self.resolution {
            out.push(format!("RESO {:<20.12} {:<20.12}", lo, hi));
        }
        match self.missing {
            Some(v) => out.push(format!("VALM {}", v)),
            None => out.push("VALM NAN".to_string()),
        }
        for col in &self.columns {
            out.push(format!(
                "COLUMN {:<30} {} {:>17.4} {:>17.4} {:>4}",
                col.label, col.code, col.min, col.max, col.dataset_id
            ));
        }
        out.push(format!("NDIF {:>8}", self.datasets.len()));
        for d in &self.datasets {
            out.push(format!("PROJECT {:>7} {}", d.id, d.project));
            out.push(format!("CRYSTAL {:>7} {}", d.id, d.crystal));
            out.push(format!("DATASET {:>7} {}", d.id, d.dataset));
            let c = d.cell.unwrap_or([0.0; 6]);
            out.push(format!(
                "DCELL {:>8} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                d.id, c[0], c[1], c[2], c[3], c[4], c[5]
            ));
            out.push(format!("DWAVEL {:>8} {:>10.5}", d.id, d.wavelength));
        }
        for chunk in self.batch_numbers.chunks(12) {
            let numbers: String = chunk.iter().map(|n| format!("{:>6}", n)).collect();
            out.push(format!("BATCH {}", numbers));
        }
        out.push("END".to_string());
        out
    }
}

fn parse_syminf(rest: &str) -> Result<SymmetryInfo, String> {
    let (head, quoted) = rest.split_once('\'').unwrap_or((rest, ""));
    let (hm, tail) = quoted.split_once('\'').unwrap_or((quoted, ""));
    let tokens: Vec<&str> = head.split_whitespace().collect();
    let point_group = tail
        .split_whitespace()
        .next()
        .map(|pg| pg.strip_prefix("PG").unwrap_or(pg).to_string())
        .unwrap_or_default();
    Ok(SymmetryInfo {
        nsym: parse_num(tokens.first().copied(), "SYMINF operator count")?,
        nsymp: parse_num(tokens.get(1).copied(), "SYMINF primitive count")?,
        lattice: tokens
            .get(2)
            .and_then(|t| t.chars().next())
            .unwrap_or('P'),
        number: parse_num(tokens.get(3).copied(), "space group number")?,
        hm: hm.trim().to_string(),
        point_group,
    })
}

/// Pad (or cut) a record to the fixed 80-byte MTZ record length
pub fn pad_record(text: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = text
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .take(MTZ_RECORD_LEN)
        .collect();
    bytes.resize(MTZ_RECORD_LEN, b' ');
    bytes
}
