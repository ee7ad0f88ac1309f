use super::{METADATA_DATE, METADATA_LOCATION, METADATA_ORIENTATION};
use crate::domain::{AccelerationRecord, AccelerationUnit, EngineError, ParserResult};
use std::collections::BTreeMap;

const METADATA_LINE: usize = 1;
const HEADER_LINE: usize = 3;
const DATA_START_LINE: usize = 4;

/// Parse a PEER NGA AT2 record.
///
/// Line 1 is comma-separated metadata (location, date, ..., orientation);
/// line 3 declares `NPTS = <int>` and `DT = <float> SEC`; everything after
/// is whitespace-separated acceleration in g. The parsed sample count must
/// match the declared NPTS.
pub(super) fn parse(source: &str) -> ParserResult<AccelerationRecord> {
    let lines: Vec<&str> = source.lines().collect();

    if lines.len() <= DATA_START_LINE {
        return Err(EngineError::format(
            "FORMAT.AT2_HEADER",
            format!(
                "AT2 record needs at least {} header lines, got {}",
                DATA_START_LINE,
                lines.len()
            ),
        ));
    }

    let mut metadata = BTreeMap::new();
    let metadata_fields: Vec<&str> = lines[METADATA_LINE].trim().split(',').collect();
    if let Some(location) = metadata_fields.first() {
        metadata.insert(METADATA_LOCATION.to_string(), location.trim().to_string());
    }
    if let Some(date) = metadata_fields.get(1) {
        metadata.insert(METADATA_DATE.to_string(), date.trim().to_string());
    }
    if let Some(orientation) = metadata_fields.last() {
        metadata.insert(
            METADATA_ORIENTATION.to_string(),
            orientation.trim().to_string(),
        );
    }

    let header = lines[HEADER_LINE].trim();
    let npts = find_npts(header).ok_or_else(|| {
        EngineError::format(
            "FORMAT.AT2_HEADER",
            format!("NPTS information missing or malformed in '{header}'"),
        )
    })?;
    let dt = find_dt(header).ok_or_else(|| {
        EngineError::format(
            "FORMAT.AT2_HEADER",
            format!("DT information missing or malformed in '{header}'"),
        )
    })?;

    let mut samples = Vec::with_capacity(npts);
    for (offset, line) in lines[DATA_START_LINE..].iter().enumerate() {
        for token in line.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| {
                EngineError::format(
                    "FORMAT.AT2_SAMPLE",
                    format!(
                        "invalid acceleration value '{}' at line {}",
                        token,
                        DATA_START_LINE + offset + 1
                    ),
                )
            })?;
            samples.push(value);
        }
    }

    if samples.len() != npts {
        return Err(EngineError::format(
            "FORMAT.AT2_COUNT",
            format!(
                "number of acceleration points ({}) does not match NPTS ({npts})",
                samples.len()
            ),
        ));
    }

    AccelerationRecord::new(dt, AccelerationUnit::G, samples, metadata)
}

/// `NPTS<ws>=<ws><digits>`, anywhere in the header line.
fn find_npts(header: &str) -> Option<usize> {
    let value = value_after_key(header, "NPTS")?;
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// `DT<ws>=<ws><float><ws>SEC`, anywhere in the header line. The value may
/// contain only digits and decimal points; exponents never appear in this
/// field.
fn find_dt(header: &str) -> Option<f64> {
    let value = value_after_key(header, "DT")?;
    let number: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if number.is_empty() {
        return None;
    }

    let rest = value[number.len()..].trim_start();
    if !rest.starts_with("SEC") {
        return None;
    }

    number.parse().ok()
}

fn value_after_key<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(relative) = header[search_from..].find(key) {
        let key_start = search_from + relative;
        let after_key = header[key_start + key.len()..].trim_start();
        if let Some(after_equals) = after_key.strip_prefix('=') {
            return Some(after_equals.trim_start());
        }
        search_from = key_start + key.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::domain::AccelerationUnit;

    const FIXTURE: &str = "PEER NGA STRONG MOTION DATABASE RECORD\n\
         IMPERIAL VALLEY, 10/15/1979, EL CENTRO ARRAY #5, 140\n\
        ACCELERATION TIME SERIES IN UNITS OF G\n\
        NPTS=   6, DT=   .0200 SEC\n\
           .10000E-01   .20000E-01  -.30000E-01\n\
           .40000E-01  -.50000E-01   .60000E-01\n";

    #[test]
    fn parses_header_metadata_and_samples() {
        let record = parse(FIXTURE).expect("fixture should parse");

        assert_eq!(record.len(), 6);
        assert!((record.dt() - 0.02).abs() < 1.0e-12);
        assert_eq!(record.unit(), AccelerationUnit::G);
        assert_eq!(record.metadata()["location"], "IMPERIAL VALLEY");
        assert_eq!(record.metadata()["date"], "10/15/1979");
        assert_eq!(record.metadata()["orientation"], "140");
        assert!((record.samples()[2] + 0.03).abs() < 1.0e-12);
        assert!((record.time(5) - 0.1).abs() < 1.0e-12);
    }

    #[test]
    fn count_mismatch_fails_with_format_error() {
        let truncated = "h\nA, B, C\nh\nNPTS= 5, DT= 0.01 SEC\n1.0 2.0 3.0 4.0\n";
        let error = parse(truncated).expect_err("4 of 5 samples should fail");
        assert_eq!(error.code(), "FORMAT.AT2_COUNT");
    }

    #[test]
    fn missing_npts_or_dt_fails_with_format_error() {
        let no_dt = "h\nA, B, C\nh\nNPTS= 2 DURATION UNKNOWN\n0.0 0.0\n";
        assert_eq!(
            parse(no_dt).expect_err("missing DT").code(),
            "FORMAT.AT2_HEADER"
        );

        let no_npts = "h\nA, B, C\nh\nDT= 0.01 SEC\n0.0 0.0\n";
        assert_eq!(
            parse(no_npts).expect_err("missing NPTS").code(),
            "FORMAT.AT2_HEADER"
        );
    }

    #[test]
    fn whitespace_elastic_header_variants_parse() {
        let spaced = "h\nA, B, C\nh\nNPTS = 2 , DT = 0.005 SEC\n0.0 1.0\n";
        let record = parse(spaced).expect("spaced header should parse");
        assert_eq!(record.len(), 2);
        assert!((record.dt() - 0.005).abs() < 1.0e-12);
    }

    #[test]
    fn bad_sample_token_fails_with_format_error() {
        let garbage = "h\nA, B, C\nh\nNPTS= 2, DT= 0.01 SEC\n0.0 oops\n";
        assert_eq!(
            parse(garbage).expect_err("bad token").code(),
            "FORMAT.AT2_SAMPLE"
        );
    }
}
