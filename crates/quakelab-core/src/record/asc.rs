use super::is_plain_decimal;
use crate::domain::{AccelerationRecord, AccelerationUnit, EngineError, ParserResult};
use std::collections::BTreeMap;
use tracing::warn;

const DEFAULT_SAMPLING_INTERVAL_S: f64 = 0.01;
const KEY_SAMPLING_INTERVAL: &str = "SAMPLING_INTERVAL_S";
const KEY_NDATA: &str = "NDATA";

/// Parse a European-style ASC record.
///
/// Leading `key: value` lines are metadata; the first line that is a plain
/// decimal number starts the data block, one value per line with comma
/// decimal separators normalised to points. `dt` comes from the
/// SAMPLING_INTERVAL_S key (default 0.01 s) and the expected count from
/// NDATA (default: whatever was parsed).
pub(super) fn parse(source: &str) -> ParserResult<AccelerationRecord> {
    let lines: Vec<&str> = source.lines().collect();

    let data_start = lines
        .iter()
        .position(|line| is_plain_decimal(line.trim()))
        .unwrap_or(lines.len());

    let mut metadata = BTreeMap::new();
    for line in &lines[..data_start] {
        if let Some((key, value)) = line.split_once(':') {
            metadata.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    let mut samples = Vec::new();
    for (offset, raw_line) in lines[data_start..].iter().enumerate() {
        let line = raw_line.trim().replace(',', ".");
        if line.is_empty() {
            continue;
        }
        match line.parse::<f64>() {
            Ok(value) => samples.push(value),
            Err(_) => {
                warn!(
                    line_number = data_start + offset + 1,
                    content = %line,
                    "skipping invalid ASC data line"
                );
            }
        }
    }

    let dt = match metadata.get(KEY_SAMPLING_INTERVAL) {
        Some(value) => value.parse::<f64>().map_err(|_| {
            EngineError::format(
                "FORMAT.ASC_HEADER",
                format!("invalid {KEY_SAMPLING_INTERVAL} value '{value}'"),
            )
        })?,
        None => DEFAULT_SAMPLING_INTERVAL_S,
    };

    let ndata = match metadata.get(KEY_NDATA) {
        Some(value) => value.parse::<usize>().map_err(|_| {
            EngineError::format(
                "FORMAT.ASC_HEADER",
                format!("invalid {KEY_NDATA} value '{value}'"),
            )
        })?,
        None => samples.len(),
    };

    if samples.len() != ndata {
        return Err(EngineError::format(
            "FORMAT.ASC_COUNT",
            format!(
                "number of acceleration points ({}) does not match NDATA ({ndata})",
                samples.len()
            ),
        ));
    }

    AccelerationRecord::new(dt, AccelerationUnit::CmPerS2, samples, metadata)
}
