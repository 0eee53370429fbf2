use crate::types::{HeaderRecord, HeaderValue, SpectralError, SpectralResult};
use std::path::Path;

/// Token that must open the first line of an ENVI header
pub const HEADER_MARKER: &str = "ENVI";

/// Key whose brace-delimited value is kept as a single string
const DESCRIPTION_KEY: &str = "description";

/// ENVI header (.hdr) parser
pub struct HeaderParser;

impl HeaderParser {
    /// Read and parse a header file from disk
    pub fn parse_file<P: AsRef<Path>>(path: P) -> SpectralResult<HeaderRecord> {
        let path = path.as_ref();
        log::debug!("Reading ENVI header: {}", path.display());

        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                SpectralError::NotFound(format!("{}: {}", path.display(), e))
            }
            _ => SpectralError::Io(e),
        })?;

        Self::parse_bytes(&bytes)
    }

    /// Parse raw header bytes; undecodable input is treated as a binary file
    pub fn parse_bytes(bytes: &[u8]) -> SpectralResult<HeaderRecord> {
        let text = std::str::from_utf8(bytes).map_err(|_| {
            SpectralError::Format(
                "File does not appear to be an ENVI header (appears to be a binary file)".to_string(),
            )
        })?;
        Self::parse(text)
    }

    /// Parse header text into a [`HeaderRecord`]
    pub fn parse(text: &str) -> SpectralResult<HeaderRecord> {
        let mut lines = text.lines();

        let first = lines.next().unwrap_or("");
        if !first.trim().starts_with(HEADER_MARKER) {
            return Err(SpectralError::Format(format!(
                "File does not appear to be an ENVI header (missing \"{}\" at beginning of first line)",
                HEADER_MARKER
            )));
        }

        let mut record = HeaderRecord::default();

        while let Some(line) = lines.next() {
            if line.starts_with(';') {
                continue;
            }
            let (key, value) = match line.split_once('=') {
                Some(parts) => parts,
                None => continue,
            };

            let key = key.trim().to_lowercase();
            let value = value.trim();

            if !value.starts_with('{') {
                record.insert(key, HeaderValue::Scalar(value.to_string()));
                continue;
            }

            let block = Self::collect_brace_block(&key, value, &mut lines)?;
            let parsed = if key == DESCRIPTION_KEY {
                let inner = block.trim_matches(|c: char| c == '{' || c == '}').trim();
                HeaderValue::Scalar(inner.to_string())
            } else {
                HeaderValue::List(Self::split_list(&block))
            };
            record.insert(key, parsed);
        }

        log::debug!("Parsed ENVI header with {} keys", record.len());
        Ok(record)
    }

    /// Accumulate a brace value that may continue over several lines
    fn collect_brace_block<'a, I>(key: &str, first: &str, lines: &mut I) -> SpectralResult<String>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut block = first.to_string();

        while !block.ends_with('}') {
            let line = lines.next().ok_or_else(|| {
                SpectralError::Format(format!("Unterminated brace block for key '{}'", key))
            })?;
            let line = line.trim();
            if line.starts_with(';') {
                continue;
            }
            block.push('\n');
            block.push_str(line);
        }

        Ok(block)
    }

    /// Strip the outer braces and split on commas, keeping empty tokens
    fn split_list(block: &str) -> Vec<String> {
        let inner = &block[1..block.len() - 1];
        inner.split(',').map(|token| token.trim().to_string()).collect()
    }
}

impl HeaderRecord {
    /// Parse a scalar entry as an unsigned integer (e.g. `samples`, `lines`, `bands`)
    pub fn get_usize(&self, key: &str) -> SpectralResult<Option<usize>> {
        match self.get(key) {
            None => Ok(None),
            Some(HeaderValue::Scalar(s)) => s.parse::<usize>().map(Some).map_err(|e| {
                SpectralError::Format(format!("Header key '{}' is not an integer ({}): {}", key, s, e))
            }),
            Some(HeaderValue::List(_)) => Err(SpectralError::Format(format!(
                "Header key '{}' holds a list, expected a scalar",
                key
            ))),
        }
    }

    /// Parse a list entry as floating-point numbers
    pub fn get_f64_list(&self, key: &str) -> SpectralResult<Option<Vec<f64>>> {
        let items = match self.get(key) {
            None => return Ok(None),
            Some(HeaderValue::List(items)) => items,
            Some(HeaderValue::Scalar(_)) => {
                return Err(SpectralError::Format(format!(
                    "Header key '{}' holds a scalar, expected a list",
                    key
                )))
            }
        };

        items
            .iter()
            .map(|item| {
                item.parse::<f64>().map_err(|e| {
                    SpectralError::Format(format!("Header key '{}' has non-numeric entry '{}': {}", key, item, e))
                })
            })
            .collect::<SpectralResult<Vec<f64>>>()
            .map(Some)
    }

    /// Band-centre wavelengths in header order, if present
    pub fn wavelengths(&self) -> SpectralResult<Option<Vec<f64>>> {
        self.get_f64_list("wavelength")
    }

    pub fn description(&self) -> Option<&str> {
        self.get_scalar(DESCRIPTION_KEY)
    }
}

/// Convenience wrapper around [`HeaderParser::parse_file`]
pub fn parse_header_file<P: AsRef<Path>>(path: P) -> SpectralResult<HeaderRecord> {
    HeaderParser::parse_file(path)
}
