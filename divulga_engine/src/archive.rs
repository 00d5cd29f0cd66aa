//! In-archive streaming extraction.
//!
//! A downloaded payload is either a ZIP (walked entry by entry) or a flat
//! delimited text file (treated as a single-entry archive named after its
//! resource). Entries are handed out as streaming readers; nothing here
//! materializes a whole inner file.

use std::io::{BufRead, BufReader, Cursor};

use zip::ZipArchive;

use crate::error::SkipReason;
use crate::observer::FetchObserver;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

fn is_zip(payload: &[u8]) -> bool {
    payload.starts_with(ZIP_MAGIC)
}

fn is_tabular_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".csv") || lower.ends_with(".txt")
}

/// Walks every readable `.csv`/`.txt` entry in `payload`, handing
/// `(name, reader)` to `handle` one entry at a time.
///
/// An entry that cannot be opened is skipped with an observation and the
/// walk continues: one corrupt member never abandons the archive. The
/// walk itself cannot fail.
pub fn for_each_entry<F>(
    payload: &[u8],
    resource_name: &str,
    observer: &dyn FetchObserver,
    mut handle: F,
) where
    F: FnMut(&str, &mut dyn BufRead),
{
    if !is_zip(payload) {
        let mut reader = BufReader::new(Cursor::new(payload));
        handle(resource_name, &mut reader);
        return;
    }

    let mut archive = match ZipArchive::new(Cursor::new(payload)) {
        Ok(archive) => archive,
        Err(err) => {
            observer.on_skip(&SkipReason::ArchiveEntryCorrupt {
                entry: resource_name.to_string(),
                detail: format!("unreadable zip: {err}"),
            });
            return;
        }
    };

    for index in 0..archive.len() {
        let entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                observer.on_skip(&SkipReason::ArchiveEntryCorrupt {
                    entry: format!("{resource_name}#{index}"),
                    detail: err.to_string(),
                });
                continue;
            }
        };
        if entry.is_dir() || !is_tabular_name(entry.name()) {
            continue;
        }
        let name = entry.name().to_string();
        let mut reader = BufReader::new(entry);
        handle(&name, &mut reader);
    }
}
