//! Strong-motion record parsing.
//!
//! Two textual formats are supported, dispatched by a declared tag rather
//! than inheritance: PEER NGA `AT2` files and European `ASC` files. Both
//! parsers are pure functions over the decoded text and return the same
//! [`AccelerationRecord`]; parsing is all-or-nothing.

mod asc;
mod at2;

use crate::domain::{AccelerationRecord, EngineError, ParserResult};
use std::fs;
use std::path::Path;

pub const METADATA_LOCATION: &str = "location";
pub const METADATA_DATE: &str = "date";
pub const METADATA_ORIENTATION: &str = "orientation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFormat {
    At2,
    Asc,
}

impl RecordFormat {
    /// Case-insensitive lookup from a file extension such as `AT2` or `asc`.
    pub fn from_extension(extension: &str) -> ParserResult<Self> {
        let trimmed = extension.trim().trim_start_matches('.');
        if trimmed.eq_ignore_ascii_case("at2") {
            Ok(Self::At2)
        } else if trimmed.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else {
            Err(EngineError::config(
                "CONFIG.RECORD_FORMAT",
                format!("unknown record format '{extension}', expected AT2 or ASC"),
            ))
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::At2 => "AT2",
            Self::Asc => "ASC",
        }
    }
}

/// Parse decoded record text in the declared format.
pub fn parse_record(format: RecordFormat, source: &str) -> ParserResult<AccelerationRecord> {
    match format {
        RecordFormat::At2 => at2::parse(source),
        RecordFormat::Asc => asc::parse(source),
    }
}

/// Read a record from disk, inferring the format from the file extension
/// unless one is supplied.
pub fn parse_record_file(
    path: impl AsRef<Path>,
    format: Option<RecordFormat>,
) -> ParserResult<AccelerationRecord> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => {
            let extension = path.extension().and_then(|ext| ext.to_str()).ok_or_else(|| {
                EngineError::config(
                    "CONFIG.RECORD_FORMAT",
                    format!("cannot infer record format from '{}'", path.display()),
                )
            })?;
            RecordFormat::from_extension(extension)?
        }
    };

    let source = fs::read_to_string(path).map_err(|source| {
        EngineError::io_system(
            "IO.RECORD_READ",
            format!("failed to read record '{}': {source}", path.display()),
        )
    })?;

    parse_record(format, &source)
}

/// Whether a trimmed line is a plain decimal number: optional sign, digits,
/// optional fractional part. This is the terminator test the ASC format uses
/// to split metadata from data, so its acceptance set must stay put
/// (no exponents, no leading decimal point, no comma decimals).
pub(crate) fn is_plain_decimal(line: &str) -> bool {
    let mut chars = line.chars().peekable();
    if chars.peek() == Some(&'-') {
        chars.next();
    }

    let mut integer_digits = 0usize;
    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        integer_digits += 1;
    }
    if integer_digits == 0 {
        return false;
    }

    if chars.peek() == Some(&'.') {
        chars.next();
        let mut fraction_digits = 0usize;
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            fraction_digits += 1;
        }
        if fraction_digits == 0 {
            return false;
        }
    }

    chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::{is_plain_decimal, RecordFormat};

    #[test]
    fn format_lookup_is_case_insensitive() {
        assert_eq!(RecordFormat::from_extension("AT2").unwrap(), RecordFormat::At2);
        assert_eq!(RecordFormat::from_extension(".at2").unwrap(), RecordFormat::At2);
        assert_eq!(RecordFormat::from_extension("asc").unwrap(), RecordFormat::Asc);

        let error = RecordFormat::from_extension("csv").expect_err("unknown format");
        assert_eq!(error.code(), "CONFIG.RECORD_FORMAT");
    }

    #[test]
    fn plain_decimal_acceptance_set_is_preserved() {
        for accepted in ["0", "-3", "12.5", "-0.001", "42"] {
            assert!(is_plain_decimal(accepted), "should accept {accepted:?}");
        }
        for rejected in ["", "-", ".5", "1.", "1e3", "0,5", "abc", "1.2.3", "+1"] {
            assert!(!is_plain_decimal(rejected), "should reject {rejected:?}");
        }
    }
}
