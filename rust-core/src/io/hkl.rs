use log::{debug, info, warn};
use std::fmt::Write as _;
use std::path::Path;

use crate::dataset::ReflectionTable;
use crate::error::{Error, Result};
use crate::io::write_atomically;

// Largest magnitudes that fit the 8.2 fields
const MAX_POSITIVE: f64 = 99999.99;
const MAX_NEGATIVE: f64 = -9999.99;

/// Write `value` and `sigma` as SHELX HKLF-4 text.
///
/// Rows with a missing value or sigma are skipped. If any value would overflow
/// its field, value and sigma are scaled down together.
pub fn write_hkl(
    table: &ReflectionTable,
    path: &Path,
    value: &str,
    sigma: &str,
    batch: Option<&str>,
) -> Result<()> {
    let hkls = table.miller_indices()?;
    let values = table.values(value)?.to_f64();
    let sigmas = table.values(sigma)?.to_f64();
    let batches = match batch {
        Some(label) => Some(
            table
                .values(label)?
                .to_integral()
                .map_err(|row| Error::InvalidArgument(format!("batch column {label}: non-integer value at row {row}")))?,
        ),
        None => None,
    };

    let rows: Vec<usize> = (0..hkls.len())
        .filter(|&i| values[i].is_finite() && sigmas[i].is_finite())
        .collect();
    if rows.len() < hkls.len() {
        debug!("Skipping {} rows with missing data", hkls.len() - rows.len());
    }

    let scale = overflow_scale(rows.iter().flat_map(|&i| [values[i], sigmas[i]]));
    if scale < 1.0 {
        warn!("Values of {} overflow the HKL format; scaling by {:.6}", value, scale);
    }

    let mut text = String::with_capacity(rows.len() * 34 + 40);
    for &i in &rows {
        let h = &hkls[i];
        // Writing into a String cannot fail
        let _ = write!(
            text,
            "{:4}{:4}{:4}{:8.2}{:8.2}",
            h.x,
            h.y,
            h.z,
            values[i] * scale,
            sigmas[i] * scale
        );
        if let Some(batches) = &batches {
            let _ = write!(text, "{:4}", batches[i]);
        }
        text.push('\n');
    }
    text.push_str(&format!("{:4}{:4}{:4}{:8.2}{:8.2}", 0, 0, 0, 0.0, 0.0));
    if batches.is_some() {
        text.push_str(&format!("{:4}", 0));
    }
    text.push('\n');

    write_atomically(path, text.as_bytes())?;
    info!("Wrote {} reflections to {}", rows.len(), path.display());
    Ok(())
}

/// Factor that brings every value into the printable range (1.0 when none overflow)
fn overflow_scale(values: impl Iterator<Item = f64>) -> f64 {
    let (lo, hi) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let mut scale: f64 = 1.0;
    if hi > MAX_POSITIVE {
        scale = scale.min(MAX_POSITIVE / hi);
    }
    if lo < MAX_NEGATIVE {
        scale = scale.min(MAX_NEGATIVE / lo);
    }
    scale
}
