//! Streaming row filter: one CSV entry in, target-key matches out.
//!
//! Rows are consumed one at a time from whatever reader the extractor
//! provides; memory use is bounded by one row plus the matches, never by
//! the dataset. Millions of rows with a handful of hits stay cheap.

use std::io::BufRead;

use crate::error::SkipReason;
use crate::observer::FetchObserver;
use crate::parse::{decode_text, digits_only};
use crate::record::{NormalizedRecord, RawRow};
use crate::schema::RecordKind;

/// Emit a progress observation every this many rows.
const PROGRESS_INTERVAL: u64 = 50_000;

/// Candidate delimiters, least likely first so that ties (an empty or
/// single-column header) fall back to the portal's usual `;`.
const DELIMITERS: &[u8] = b"\t,;";

/// Picks the delimiter that splits the header line into the most fields.
fn detect_delimiter(header: &str) -> u8 {
    DELIMITERS
        .iter()
        .copied()
        .max_by_key(|&d| header.matches(d as char).count())
        .unwrap_or(b';')
}

/// Streams one decoded CSV entry and returns the rows whose kind-specific
/// key matches `target_key`, compared digits-only. Non-matching rows are
/// dropped immediately, never accumulated.
///
/// Row-level problems are skipped and counted; an I/O failure underneath
/// (a truncated archive entry, typically) ends this entry but is still
/// only a skip from the caller's point of view.
pub fn filter_entry<R: BufRead>(
    mut reader: R,
    entry_name: &str,
    kind: RecordKind,
    target_key: &str,
    observer: &dyn FetchObserver,
) -> Vec<NormalizedRecord> {
    let target = digits_only(target_key);
    let mut matches: Vec<NormalizedRecord> = Vec::new();

    // Header line: column names plus delimiter detection.
    let mut header_bytes = Vec::new();
    match reader.read_until(b'\n', &mut header_bytes) {
        Ok(0) => return matches,
        Ok(_) => {}
        Err(err) => {
            observer.on_skip(&SkipReason::ArchiveEntryCorrupt {
                entry: entry_name.to_string(),
                detail: err.to_string(),
            });
            return matches;
        }
    }
    let header_line = decode_text(&header_bytes);
    let header_line = header_line
        .trim_start_matches('\u{feff}')
        .trim_end_matches(['\r', '\n']);
    let delimiter = detect_delimiter(header_line);
    let columns: Vec<String> = header_line
        .split(delimiter as char)
        .map(|c| c.trim().trim_matches('"').to_lowercase())
        .collect();

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows_seen = 0u64;
    let mut row = csv::ByteRecord::new();
    loop {
        match csv_reader.read_byte_record(&mut row) {
            Ok(false) => break,
            Ok(true) => {}
            Err(err) => {
                observer.on_skip(&SkipReason::RowDecodeError {
                    entry: entry_name.to_string(),
                    detail: err.to_string(),
                });
                // A bad row is survivable; a broken reader is not.
                if matches!(err.kind(), csv::ErrorKind::Io(_)) {
                    break;
                }
                continue;
            }
        }
        rows_seen += 1;
        if rows_seen % PROGRESS_INTERVAL == 0 {
            observer.on_progress(rows_seen, matches.len() as u64);
        }

        let mut raw = RawRow::new();
        for (column, value) in columns.iter().zip(row.iter()) {
            raw.push(column, decode_text(value).trim().to_string());
        }
        let Some(record) = NormalizedRecord::from_row(kind, &raw) else {
            continue;
        };
        if record.filter_key() == Some(target.as_str()) {
            matches.push(record);
        }
    }

    if rows_seen > 0 {
        observer.on_progress(rows_seen, matches.len() as u64);
    }
    matches
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::observer::NoopObserver;

    const REVENUE_CSV: &str = "\
NR_CPF_CANDIDATO;VR_RECEITA;NM_DOADOR
111.111.111-11;80.000,00;DOADORA UM
22222222222;50,00;DOADOR DOIS
11111111111;1.500,00;DOADORA TRES
";

    #[test]
    fn yields_only_digit_equal_matches() {
        let matches = filter_entry(
            Cursor::new(REVENUE_CSV),
            "receitas_candidatos_2022_SP.csv",
            RecordKind::Revenue,
            "11111111111",
            &NoopObserver,
        );
        assert_eq!(matches.len(), 2);
        for record in &matches {
            assert_eq!(record.filter_key(), Some("11111111111"));
        }
    }

    #[test]
    fn formatted_target_key_matches_digits() {
        let matches = filter_entry(
            Cursor::new(REVENUE_CSV),
            "receitas.csv",
            RecordKind::Revenue,
            "111.111.111-11",
            &NoopObserver,
        );
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn no_match_yields_nothing() {
        let matches = filter_entry(
            Cursor::new(REVENUE_CSV),
            "receitas.csv",
            RecordKind::Revenue,
            "99999999999",
            &NoopObserver,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn comma_delimiter_detected() {
        let csv = "NR_CPF_CANDIDATO,VR_RECEITA\n11111111111,\"10,00\"\n";
        let matches = filter_entry(
            Cursor::new(csv),
            "receitas.csv",
            RecordKind::Revenue,
            "11111111111",
            &NoopObserver,
        );
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn tab_delimiter_detected() {
        let csv = "NR_CPF_CANDIDATO\tVR_RECEITA\n11111111111\t10,00\n";
        let matches = filter_entry(
            Cursor::new(csv),
            "receitas.txt",
            RecordKind::Revenue,
            "11111111111",
            &NoopObserver,
        );
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn quoted_headers_and_crlf() {
        let csv = "\"NR_CPF_CANDIDATO\";\"VR_RECEITA\"\r\n\"11111111111\";\"25,00\"\r\n";
        let matches = filter_entry(
            Cursor::new(csv),
            "receitas.csv",
            RecordKind::Revenue,
            "11111111111",
            &NoopObserver,
        );
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn invalid_rows_are_skipped_not_fatal() {
        let csv = "\
NR_CPF_CANDIDATO;VR_RECEITA
not-a-cpf;10,00
11111111111;#NULO#
11111111111;30,00
";
        let matches = filter_entry(
            Cursor::new(csv),
            "receitas.csv",
            RecordKind::Revenue,
            "11111111111",
            &NoopObserver,
        );
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let matches = filter_entry(
            Cursor::new(""),
            "vazio.csv",
            RecordKind::Revenue,
            "11111111111",
            &NoopObserver,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn latin1_rows_decode_via_fallback() {
        // ISO-8859-1 "JOÃO" carries a lone 0xC3, which is invalid UTF-8.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"NR_CPF_CANDIDATO;VR_RECEITA;NM_DOADOR\n");
        bytes.extend_from_slice(b"11111111111;10,00;JO\xC3O\n");
        let matches = filter_entry(
            Cursor::new(bytes),
            "receitas_2010.txt",
            RecordKind::Revenue,
            "11111111111",
            &NoopObserver,
        );
        assert_eq!(matches.len(), 1);
        let NormalizedRecord::Revenue(revenue) = &matches[0] else {
            panic!("expected revenue variant");
        };
        assert_eq!(revenue.donor_name.as_deref(), Some("JOÃO"));
    }
}
