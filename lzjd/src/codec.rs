//! Line-oriented text format of digests, `lzjd:<name>:<base64>`.
//!
//! The base64 payload is the sketch packed as big-endian `i32`s and zero-padded to
//! `k` entries. Because a sketch is strictly ascending, padding starts where the
//! decoded values stop increasing. A trailing `0` right before the padding is read as
//! padding too, so a short sketch that genuinely contains the hash `0` loses it.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use base64::Engine;
use byteorder::{BigEndian, ByteOrder};

use crate::errors::{LzjdError, Result};
use crate::sketch::Sketch;

/// Prefix of every digest line.
pub const PREFIX: &str = "lzjd:";

/// A named sketch, as stored in one digest line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestRecord {
    /// Printable path of the digested input.
    pub name: String,
    /// Sketch of the input.
    pub sketch: Sketch,
}

impl DigestRecord {
    /// Creates a record.
    pub fn new<S>(name: S, sketch: Sketch) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            sketch,
        }
    }

    /// Formats the record as a digest line without the trailing newline,
    /// padding the sketch to `k` entries.
    pub fn to_line(&self, k: usize) -> Result<String> {
        if self.name.contains(&['\n', '\r'][..]) {
            return Err(LzjdError::input(format!(
                "Name must not contain a line break: {:?}",
                self.name
            )));
        }
        Ok(format!(
            "{PREFIX}{}:{}",
            self.name,
            encode_sketch(&self.sketch, k)
        ))
    }

    /// Parses a digest line; `line_no` is only used in error messages.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let line = line.trim();
        let rest = line
            .strip_prefix(PREFIX)
            .ok_or_else(|| LzjdError::decode(line_no, format!("missing {PREFIX:?} prefix")))?;
        let colon = rest
            .rfind(':')
            .ok_or_else(|| LzjdError::decode(line_no, "missing ':' before the sketch"))?;
        let sketch =
            decode_sketch(&rest[colon + 1..]).map_err(|msg| LzjdError::decode(line_no, msg))?;
        Ok(Self::new(&rest[..colon], sketch))
    }
}

/// Encodes a sketch into standard base64 with padding,
/// packing `max(k, sketch.len())` big-endian `i32`s.
pub fn encode_sketch(sketch: &Sketch, k: usize) -> String {
    let mut bytes = vec![0; k.max(sketch.len()) * 4];
    BigEndian::write_i32_into(sketch.as_slice(), &mut bytes[..sketch.len() * 4]);
    base64::engine::general_purpose::STANDARD.encode(&bytes)
}

/// Decodes a sketch from its base64 form, removing the zero padding.
pub fn decode_sketch(b64: &str) -> Result<Sketch, String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| format!("invalid base64: {e}"))?;
    if bytes.len() % 4 != 0 {
        return Err(format!(
            "sketch of {} bytes is not a multiple of 4",
            bytes.len()
        ));
    }
    let mut values = vec![0; bytes.len() / 4];
    BigEndian::read_i32_into(&bytes, &mut values);
    Ok(strip_padding(values))
}

fn strip_padding(mut values: Vec<i32>) -> Sketch {
    if values.is_empty() {
        return Sketch::default();
    }
    let ascending = 1 + values.windows(2).take_while(|w| w[0] < w[1]).count();
    if ascending == values.len() {
        return Sketch::from_unsorted(values);
    }
    if values[ascending..].iter().all(|&v| v == 0) {
        let len = if values[ascending - 1] == 0 {
            ascending - 1
        } else {
            ascending
        };
        values.truncate(len);
        return Sketch::from_unsorted(values);
    }
    log::debug!("Sketch of {} values is not sorted; sorting", values.len());
    Sketch::from_unsorted(values)
}

/// Reads digest records from `rdr`, skipping blank lines.
/// Malformed lines are logged and skipped; only read failures are returned as errors.
pub fn read_digests<R>(rdr: R, source: &Path) -> Result<Vec<DigestRecord>>
where
    R: BufRead,
{
    let mut records = vec![];
    for (i, line) in rdr.lines().enumerate() {
        let line = line.map_err(|e| LzjdError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match DigestRecord::parse(&line, i + 1) {
            Ok(record) => records.push(record),
            Err(e) => log::error!("{}: {e}", source.display()),
        }
    }
    Ok(records)
}

/// Reads every digest record of the file at `path`.
pub fn read_digest_file<P>(path: P) -> Result<Vec<DigestRecord>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LzjdError::io(path, e))?;
    read_digests(BufReader::new(file), path)
}
