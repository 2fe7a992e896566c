use crate::error::{ExchangeError, Result};
use crate::normalize::{is_numeric, normalize_number};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::debug;

/// Timestamp format used by call logs, e.g. `17.03.2024 14:05:09`.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

pub struct Extraction<R> {
    pub records: Vec<R>,
    /// Rows that were present but unusable.
    pub skipped: usize,
}

impl<R> Default for Extraction<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// Turns the text of one input file into records. `origin` only labels errors.
pub trait Extractor {
    type Record;

    fn extract(&self, content: &str, origin: &Path) -> Result<Extraction<Self::Record>>;
}

fn reader(content: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub full_name: String,
    /// As written in the file.
    pub number: String,
}

/// `Full Name, number` rows under a single header line.
pub struct ContactExtractor;

impl Extractor for ContactExtractor {
    type Record = ContactRecord;

    fn extract(&self, content: &str, origin: &Path) -> Result<Extraction<ContactRecord>> {
        let mut extraction = Extraction::default();

        for result in reader(content, true).records() {
            let record = result.map_err(|e| ExchangeError::csv(origin, e))?;
            match (record.get(0), record.get(1)) {
                (Some(name), Some(number)) if !normalize_number(number).is_empty() => {
                    extraction.records.push(ContactRecord {
                        full_name: name.to_string(),
                        number: number.to_string(),
                    });
                }
                _ => {
                    debug!(line = ?record.position().map(|p| p.line()), "skipping contact row");
                    extraction.skipped += 1;
                }
            }
        }

        Ok(extraction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Normalized
    pub caller: String,
    /// Normalized
    pub callee: String,
    /// `None` when the timestamp could not be parsed.
    pub timestamp: Option<NaiveDateTime>,
    /// Seconds
    pub duration: u64,
}

/// `caller, callee, dd.mm.YYYY HH:MM:SS, HH:MM:SS` rows, no header.
pub struct CallExtractor;

impl Extractor for CallExtractor {
    type Record = CallRecord;

    fn extract(&self, content: &str, origin: &Path) -> Result<Extraction<CallRecord>> {
        let mut extraction = Extraction::default();

        for result in reader(content, false).records() {
            let record = result.map_err(|e| ExchangeError::csv(origin, e))?;
            if record.len() < 4 {
                extraction.skipped += 1;
                continue;
            }

            let caller = normalize_number(&record[0]);
            let callee = normalize_number(&record[1]);
            if !is_numeric(&caller) || !is_numeric(&callee) {
                debug!(%caller, %callee, "skipping call with invalid number");
                extraction.skipped += 1;
                continue;
            }

            extraction.records.push(CallRecord {
                caller,
                callee,
                timestamp: NaiveDateTime::parse_from_str(&record[2], TIMESTAMP_FORMAT).ok(),
                duration: parse_duration(&record[3]),
            });
        }

        Ok(extraction)
    }
}

/// One number per line; blank lines are ignored.
pub struct BlocklistExtractor;

impl Extractor for BlocklistExtractor {
    type Record = String;

    fn extract(&self, content: &str, _origin: &Path) -> Result<Extraction<String>> {
        let records = content
            .lines()
            .map(normalize_number)
            .filter(|number| !number.is_empty())
            .collect();

        Ok(Extraction {
            records,
            skipped: 0,
        })
    }
}

/// Seconds in an `HH:MM:SS` duration; 0 if it is malformed.
pub fn parse_duration(raw: &str) -> u64 {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return 0;
    };

    match (hours.parse::<u64>(), minutes.parse::<u64>(), seconds.parse::<u64>()) {
        (Ok(h), Ok(m), Ok(s)) => h
            .checked_mul(3600)
            .zip(m.checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .and_then(|hm| hm.checked_add(s))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Formats seconds as `HH:MM:SS`.
pub fn format_duration(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
