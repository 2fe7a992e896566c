//! Loaders for the exchange's text inputs: contacts, blocklist and call log.

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, Result};
use crate::exchange::Exchange;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub mod extractor;

use extractor::{BlocklistExtractor, CallExtractor, ContactExtractor, Extractor};

const PROGRESS_EVERY: usize = 10_000;

/// What a single loader did with its file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    /// Calls involving a blocked number. Historical calls are still recorded.
    pub blocked: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub contacts: LoadReport,
    pub blocklist: LoadReport,
    pub calls: LoadReport,
}

/// `Ok(None)` when the file does not exist.
fn read_input(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        warn!(path = %path.display(), "input file not found");
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| ExchangeError::io(path, e))
}

pub fn load_contacts(exchange: &mut Exchange, path: &Path) -> Result<LoadReport> {
    let Some(content) = read_input(path)? else {
        return Ok(LoadReport::default());
    };

    let extraction = ContactExtractor.extract(&content, path)?;
    let mut report = LoadReport {
        skipped: extraction.skipped,
        ..LoadReport::default()
    };
    for contact in &extraction.records {
        if exchange.add_contact(&contact.full_name, &contact.number) {
            report.loaded += 1;
        } else {
            report.skipped += 1;
        }
    }

    info!(path = %path.display(), loaded = report.loaded, directory = exchange.directory.len(), "loaded contacts");
    Ok(report)
}

pub fn load_blocklist(exchange: &mut Exchange, path: &Path) -> Result<LoadReport> {
    let Some(content) = read_input(path)? else {
        return Ok(LoadReport::default());
    };

    let extraction = BlocklistExtractor.extract(&content, path)?;
    let mut report = LoadReport::default();
    for number in &extraction.records {
        if exchange.block(number) {
            report.loaded += 1;
        } else {
            report.skipped += 1;
        }
    }

    info!(path = %path.display(), blocked = exchange.blocklist.len(), "loaded blocklist");
    Ok(report)
}

/// Loads a call log, stopping after `max_calls` recorded calls if given.
/// A limit of 0 loads everything.
///
/// Rows whose timestamp does not parse are stamped by the graph's clock.
pub fn load_calls(exchange: &mut Exchange, path: &Path, max_calls: Option<usize>) -> Result<LoadReport> {
    let Some(content) = read_input(path)? else {
        return Ok(LoadReport::default());
    };

    let max_calls = max_calls.filter(|&max| max > 0);
    let extraction = CallExtractor.extract(&content, path)?;
    let mut report = LoadReport {
        skipped: extraction.skipped,
        ..LoadReport::default()
    };

    for call in extraction.records {
        if max_calls.is_some_and(|max| report.loaded >= max) {
            info!(max_calls = ?max_calls, "call limit reached");
            break;
        }

        if exchange.is_blocked(&call.caller) || exchange.is_blocked(&call.callee) {
            report.blocked += 1;
        }

        let recorded = exchange
            .graph
            .add_call(&call.caller, &call.callee, call.duration, call.timestamp)
            .is_some();
        if recorded {
            report.loaded += 1;
            if report.loaded % PROGRESS_EVERY == 0 {
                info!(loaded = report.loaded, "loading calls");
            }
        } else {
            report.skipped += 1;
        }
    }

    info!(
        path = %path.display(),
        loaded = report.loaded,
        blocked = report.blocked,
        skipped = report.skipped,
        "loaded calls"
    );
    Ok(report)
}

/// Contacts first so calls land on existing nodes, then the blocklist so
/// blocked historical calls are counted.
pub fn import_all(exchange: &mut Exchange, config: &ExchangeConfig) -> Result<ImportSummary> {
    let contacts = load_contacts(exchange, &config.contacts_path())?;
    let blocklist = load_blocklist(exchange, &config.blocklist_path())?;
    let calls = load_calls(exchange, &config.calls_path(), config.max_calls)?;

    Ok(ImportSummary {
        contacts,
        blocklist,
        calls,
    })
}
