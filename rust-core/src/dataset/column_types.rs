use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int32Array, UInt64Array};
use arrow::compute;
use arrow::datatypes::{DataType, Float64Type, Int32Type};
use arrow::error::ArrowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::INDEX_TOLERANCE;
use crate::error::{Error, Result};

// Well-known column labels
pub const H_LABEL: &str = "H";
pub const K_LABEL: &str = "K";
pub const L_LABEL: &str = "L";
pub const MISYM_LABEL: &str = "M/ISYM";
pub const CENTRIC_LABEL: &str = "CENTRIC";
pub const ABSENT_LABEL: &str = "ABSENT";
pub const DHKL_LABEL: &str = "dHKL";
pub const EPSILON_LABEL: &str = "EPSILON";
pub const BIN_LABEL: &str = "bin";
pub const BATCH_LABEL: &str = "BATCH";

/// Crystallographic column tag.
///
/// Every tag but `Bool` and `Untyped` corresponds to an MTZ column type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    HklIndex,
    Intensity,
    Amplitude,
    AnomalousDifference,
    StandardDeviation,
    FriedelAmplitude,
    FriedelAmplitudeStdDev,
    FriedelIntensity,
    FriedelIntensityStdDev,
    NormalizedAmplitude,
    Phase,
    Weight,
    HendricksonLattman,
    Batch,
    MIsym,
    Integer,
    Real,
    Bool,
    Untyped,
}

impl ColumnType {
    pub const MTZ_TYPES: [ColumnType; 17] = [
        ColumnType::HklIndex,
        ColumnType::Intensity,
        ColumnType::Amplitude,
        ColumnType::AnomalousDifference,
        ColumnType::StandardDeviation,
        ColumnType::FriedelAmplitude,
        ColumnType::FriedelAmplitudeStdDev,
        ColumnType::FriedelIntensity,
        ColumnType::FriedelIntensityStdDev,
        ColumnType::NormalizedAmplitude,
        ColumnType::Phase,
        ColumnType::Weight,
        ColumnType::HendricksonLattman,
        ColumnType::Batch,
        ColumnType::MIsym,
        ColumnType::Integer,
        ColumnType::Real,
    ];

    /// One-letter MTZ type code, `None` for tags MTZ cannot store
    pub fn mtz_code(&self) -> Option<char> {
        let code = match self {
            ColumnType::HklIndex => 'H',
            ColumnType::Intensity => 'J',
            ColumnType::Amplitude => 'F',
            ColumnType::AnomalousDifference => 'D',
            ColumnType::StandardDeviation => 'Q',
            ColumnType::FriedelAmplitude => 'G',
            ColumnType::FriedelAmplitudeStdDev => 'L',
            ColumnType::FriedelIntensity => 'K',
            ColumnType::FriedelIntensityStdDev => 'M',
            ColumnType::NormalizedAmplitude => 'E',
            ColumnType::Phase => 'P',
            ColumnType::Weight => 'W',
            ColumnType::HendricksonLattman => 'A',
            ColumnType::Batch => 'B',
            ColumnType::MIsym => 'Y',
            ColumnType::Integer => 'I',
            ColumnType::Real => 'R',
            ColumnType::Bool | ColumnType::Untyped => return None,
        };
        Some(code)
    }

    pub fn from_mtz_code(code: char) -> Option<Self> {
        Self::MTZ_TYPES
            .iter()
            .copied()
            .find(|t| t.mtz_code() == Some(code.to_ascii_uppercase()))
    }

    /// Tags whose values are integral by nature
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::HklIndex | ColumnType::Batch | ColumnType::MIsym | ColumnType::Integer
        )
    }

    pub fn is_phase(&self) -> bool {
        *self == ColumnType::Phase
    }

    /// Friedel-pair tags (one column per half of an anomalous pair)
    pub fn is_friedel(&self) -> bool {
        matches!(
            self,
            ColumnType::FriedelAmplitude
                | ColumnType::FriedelAmplitudeStdDev
                | ColumnType::FriedelIntensity
                | ColumnType::FriedelIntensityStdDev
        )
    }

    /// Tag of the single column a Friedel pair collapses into when unmerged
    pub fn friedel_collapsed(&self) -> Self {
        match self {
            ColumnType::FriedelAmplitude => ColumnType::Amplitude,
            ColumnType::FriedelIntensity => ColumnType::Intensity,
            ColumnType::FriedelAmplitudeStdDev | ColumnType::FriedelIntensityStdDev => {
                ColumnType::StandardDeviation
            }
            other => *other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::HklIndex => "HKL",
            ColumnType::Intensity => "Intensity",
            ColumnType::Amplitude => "SFAmplitude",
            ColumnType::AnomalousDifference => "AnomalousDifference",
            ColumnType::StandardDeviation => "Stddev",
            ColumnType::FriedelAmplitude => "FriedelSFAmplitude",
            ColumnType::FriedelAmplitudeStdDev => "StddevFriedelSF",
            ColumnType::FriedelIntensity => "FriedelIntensity",
            ColumnType::FriedelIntensityStdDev => "StddevFriedelI",
            ColumnType::NormalizedAmplitude => "NormalizedSFAmplitude",
            ColumnType::Phase => "Phase",
            ColumnType::Weight => "Weight",
            ColumnType::HendricksonLattman => "HendricksonLattman",
            ColumnType::Batch => "Batch",
            ColumnType::MIsym => "M/ISYM",
            ColumnType::Integer => "MTZInt",
            ColumnType::Real => "MTZReal",
            ColumnType::Bool => "bool",
            ColumnType::Untyped => "untyped",
        }
    }

    /// Whether values of this storage kind can carry the tag
    pub fn accepts(&self, values: &ColumnValues) -> bool {
        match (self, values) {
            (ColumnType::Bool, ColumnValues::Bool(_)) => true,
            (ColumnType::Bool, _) | (_, ColumnValues::Bool(_)) => false,
            (ColumnType::Untyped, _) => true,
            (t, ColumnValues::Int(_)) => t.is_integer(),
            (_, ColumnValues::Float(_)) => true,
        }
    }

    /// Fallback tag for values whose previous tag no longer fits
    pub fn infer(values: &ColumnValues) -> Self {
        match values {
            ColumnValues::Bool(_) => ColumnType::Bool,
            _ => ColumnType::Untyped,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column storage backed by an Arrow array.
///
/// Arrays never hold nulls; missing floats are NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Int(Int32Array),
    Float(Float64Array),
    Bool(BooleanArray),
}

impl ColumnValues {
    pub fn ints(values: Vec<i32>) -> Self {
        ColumnValues::Int(Int32Array::from(values))
    }

    pub fn floats(values: Vec<f64>) -> Self {
        ColumnValues::Float(Float64Array::from(values))
    }

    pub fn bools(values: Vec<bool>) -> Self {
        ColumnValues::Bool(BooleanArray::from(values))
    }

    /// Typed view of an Arrow array; `None` for other data types or arrays with nulls
    pub fn from_array(array: &ArrayRef) -> Option<Self> {
        if array.null_count() > 0 {
            return None;
        }
        match array.data_type() {
            DataType::Int32 => array.as_primitive_opt::<Int32Type>().cloned().map(ColumnValues::Int),
            DataType::Float64 => array
                .as_primitive_opt::<Float64Type>()
                .cloned()
                .map(ColumnValues::Float),
            DataType::Boolean => array.as_boolean_opt().cloned().map(ColumnValues::Bool),
            _ => None,
        }
    }

    pub fn to_array(&self) -> ArrayRef {
        match self {
            ColumnValues::Int(a) => Arc::new(a.clone()),
            ColumnValues::Float(a) => Arc::new(a.clone()),
            ColumnValues::Bool(a) => Arc::new(a.clone()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Int(a) => a.len(),
            ColumnValues::Float(a) => a.len(),
            ColumnValues::Bool(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ColumnValues::Int(_) => "int",
            ColumnValues::Float(_) => "float",
            ColumnValues::Bool(_) => "bool",
        }
    }

    /// Zero-copy view of `len` rows starting at `offset`. Callers check bounds.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        match self {
            ColumnValues::Int(a) => ColumnValues::Int(a.slice(offset, len)),
            ColumnValues::Float(a) => ColumnValues::Float(a.slice(offset, len)),
            ColumnValues::Bool(a) => ColumnValues::Bool(a.slice(offset, len)),
        }
    }

    /// Gather rows by position with the Arrow `take` kernel
    pub fn take(&self, rows: &[usize]) -> Result<Self> {
        let indices = UInt64Array::from_iter_values(rows.iter().map(|&r| r as u64));
        let taken = compute::take(self.to_array().as_ref(), &indices, None)?;
        Self::from_array(&taken).ok_or_else(|| {
            Error::Arrow(ArrowError::InvalidArgumentError(format!(
                "take produced a {} array",
                taken.data_type()
            )))
        })
    }

    pub fn get_f64(&self, row: usize) -> Option<f64> {
        if row >= self.len() {
            return None;
        }
        Some(match self {
            ColumnValues::Int(a) => f64::from(a.value(row)),
            ColumnValues::Float(a) => a.value(row),
            ColumnValues::Bool(a) => f64::from(u8::from(a.value(row))),
        })
    }

    /// Values as floats; booleans become 0/1
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            ColumnValues::Int(a) => a.values().iter().map(|&x| f64::from(x)).collect(),
            ColumnValues::Float(a) => a.values().to_vec(),
            ColumnValues::Bool(a) => a.values().iter().map(|b| f64::from(u8::from(b))).collect(),
        }
    }

    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            ColumnValues::Int(a) => Some(a.values().as_ref()),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            ColumnValues::Float(a) => Some(a.values().as_ref()),
            _ => None,
        }
    }

    /// Booleans unpacked from the bitmap
    pub fn to_bools(&self) -> Option<Vec<bool>> {
        match self {
            ColumnValues::Bool(a) => Some(a.values().iter().collect()),
            _ => None,
        }
    }

    /// Integer storage if every value lies within `INDEX_TOLERANCE` of an integer.
    ///
    /// On failure returns the first offending row.
    pub fn to_integral(&self) -> std::result::Result<Vec<i32>, usize> {
        match self {
            ColumnValues::Int(a) => Ok(a.values().to_vec()),
            ColumnValues::Bool(a) => Ok(a.values().iter().map(i32::from).collect()),
            ColumnValues::Float(a) => a
                .values()
                .iter()
                .enumerate()
                .map(|(row, &x)| {
                    let rounded = x.round();
                    if x.is_finite()
                        && (x - rounded).abs() <= INDEX_TOLERANCE
                        && rounded.abs() <= f64::from(i32::MAX)
                    {
                        Ok(rounded as i32)
                    } else {
                        Err(row)
                    }
                })
                .collect(),
        }
    }

    /// Smallest and largest non-missing value
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.to_f64()
            .into_iter()
            .filter(|x| !x.is_nan())
            .fold(None, |acc, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
    }
}

impl From<Vec<i32>> for ColumnValues {
    fn from(v: Vec<i32>) -> Self {
        ColumnValues::ints(v)
    }
}

impl From<Vec<f64>> for ColumnValues {
    fn from(v: Vec<f64>) -> Self {
        ColumnValues::floats(v)
    }
}

impl From<Vec<bool>> for ColumnValues {
    fn from(v: Vec<bool>) -> Self {
        ColumnValues::bools(v)
    }
}
