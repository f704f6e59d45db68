//! Container decomposition: SEC header plus `<DOCUMENT>` segments
//!
//! A raw container is a single text blob: metadata terminated by one
//! `<SEC-HEADER>…</SEC-HEADER>` span, followed by zero or more segments
//! delimited by literal `<DOCUMENT>`/`</DOCUMENT>` markers. Each segment
//! declares `TYPE`, `SEQUENCE`, `FILENAME`, and optionally `DESCRIPTION` in
//! fixed order, then carries its payload inside `<TEXT>…</TEXT>`.
//!
//! Segments are processed strictly in source order because two policies
//! terminate a container early: a segment whose metadata does not match
//! abandons all remaining segments (earlier results are kept), and in
//! text-only mode the first GRAPHIC segment stops the container entirely.

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ParseError, Result};
use crate::filename::{self, UniquifyMode};
use crate::types::{DocumentRecord, RawContainer};
use crate::uuencode;

// Patterns are compile-time constants
#[allow(clippy::expect_used)]
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<SEC-HEADER>.*</SEC-HEADER>").expect("valid header pattern")
});

// Strict fixed-order match over the segment metadata fields
#[allow(clippy::expect_used)]
static SEGMENT_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<TYPE>(?P<TYPE>.+?)[\n]+?",
        r"<SEQUENCE>(?P<SEQ>.+?)[\n]+",
        r"<FILENAME>(?P<FNAME>.+?)[\n]",
        r"(?:<DESCRIPTION>(?P<DESC>.+?)[\n])?",
    ))
    .expect("valid segment metadata pattern")
});

/// Decompose one raw container into its constituent documents
///
/// Resolves the shared filename prefix from the configured template
/// (pattern-mode uniquification, since every document of this container
/// shares the prefix and differs only in suffix), writes the header and each
/// surviving segment to disk, and returns one [`DocumentRecord`] per written
/// file. The header is always record 0 with type `"SEC Header"`.
///
/// GRAPHIC payloads are uudecoded and written as `.jpg` unless `text_only`
/// is set, in which case the container stops at its first GRAPHIC segment.
/// All other payloads are written verbatim as `.html`.
pub async fn decompose(container: &RawContainer, config: &Config) -> Result<Vec<DocumentRecord>> {
    let identifier = &container.filing.identifier;
    let text = tokio::fs::read_to_string(&container.temp_path).await?;

    let prefix_rel = filename::resolve(&config.processing.filename_template, &container.filing)?;
    let base = config.fetch_cache_dir().join(&prefix_rel);
    let base = filename::uniquify(&base, UniquifyMode::Pattern)?;
    if let Some(parent) = base.parent() {
        // Concurrent creation is idempotent
        tokio::fs::create_dir_all(parent).await?;
    }
    let prefix = base.to_string_lossy().into_owned();

    let mut records = Vec::new();

    let header = HEADER_RE
        .find(&text)
        .ok_or_else(|| ParseError::MissingHeader {
            identifier: identifier.clone(),
        })?;
    let header_path = PathBuf::from(format!("{prefix}header.txt"));
    tokio::fs::write(&header_path, header.as_str()).await?;
    records.push(DocumentRecord {
        identifier: identifier.clone(),
        sequence: "0".to_string(),
        doc_type: "SEC Header".to_string(),
        server_filename: "HEADER".to_string(),
        description: Some("Header file".to_string()),
        local_path: header_path,
    });

    for segment in segments(&text) {
        let Some(meta) = SEGMENT_META_RE.captures(segment) else {
            // Fail fast: keep what was written, abandon the rest of this container
            warn!(
                identifier = %identifier,
                segment,
                "segment metadata did not match, abandoning remaining segments"
            );
            break;
        };

        let doc_type = meta["TYPE"].to_string();
        let sequence = meta["SEQ"].to_string();
        let server_filename = meta["FNAME"].to_string();
        let description = meta.name("DESC").map(|m| m.as_str().to_string());
        let payload = payload_of(segment);

        let local_path = if doc_type == "GRAPHIC" {
            if config.processing.text_only {
                // The first GRAPHIC ends the whole container in text-only mode
                debug!(
                    identifier = %identifier,
                    sequence = %sequence,
                    "GRAPHIC segment in text-only mode, stopping container"
                );
                break;
            }
            let bytes =
                uuencode::decode(payload).map_err(|e| ParseError::InvalidEncoding {
                    identifier: identifier.clone(),
                    message: e.to_string(),
                })?;
            let path = PathBuf::from(format!("{prefix}{sequence}.jpg"));
            tokio::fs::write(&path, &bytes).await?;
            path
        } else {
            let path = PathBuf::from(format!("{prefix}{sequence}.html"));
            tokio::fs::write(&path, payload).await?;
            path
        };

        records.push(DocumentRecord {
            identifier: identifier.clone(),
            sequence,
            doc_type,
            server_filename,
            description,
            local_path,
        });
    }

    debug!(identifier = %identifier, documents = records.len(), "container decomposed");
    Ok(records)
}

/// Paired `<DOCUMENT>`/`</DOCUMENT>` spans in source order
fn segments(text: &str) -> Vec<&str> {
    const OPEN: &str = "<DOCUMENT>";
    const CLOSE: &str = "</DOCUMENT>";
    let starts = text.match_indices(OPEN).map(|(i, _)| i + OPEN.len());
    let ends: Vec<usize> = text.match_indices(CLOSE).map(|(i, _)| i).collect();
    starts
        .zip(ends)
        .filter(|&(s, e)| s <= e)
        .map(|(s, e)| &text[s..e])
        .collect()
}

/// The payload between `<TEXT>\n` and the character before `</TEXT`
fn payload_of(segment: &str) -> &str {
    let Some(open) = segment.find("<TEXT>\n") else {
        return "";
    };
    let start = open + "<TEXT>\n".len();
    let end = segment
        .find("</TEXT")
        .map(|p| p.saturating_sub(1))
        .unwrap_or(segment.len());
    segment.get(start..end).unwrap_or("")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilingReference;
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn filing() -> FilingReference {
        FilingReference {
            identifier: "edgar/data/1645148/0001213900-15-004775.txt".to_string(),
            company_name: "Acme Corp.".to_string(),
            date_filed: NaiveDate::from_ymd_opt(2015, 3, 14).unwrap(),
            form_type: "8-K".to_string(),
            cik: "1645148".to_string(),
        }
    }

    fn segment(doc_type: &str, seq: &str, fname: &str, desc: Option<&str>, body: &str) -> String {
        let desc_line = desc.map(|d| format!("<DESCRIPTION>{d}\n")).unwrap_or_default();
        format!(
            "<DOCUMENT>\n<TYPE>{doc_type}\n<SEQUENCE>{seq}\n<FILENAME>{fname}\n{desc_line}<TEXT>\n{body}\n</TEXT>\n</DOCUMENT>\n"
        )
    }

    fn header_block() -> &'static str {
        "<SEC-HEADER>ACCESSION NUMBER: 0001213900-15-004775\n</SEC-HEADER>"
    }

    fn graphic_payload() -> String {
        "begin 644 chart.jpg\n#0V%T\n`\nend\n".to_string()
    }

    async fn write_container(dir: &TempDir, body: &str) -> (RawContainer, Config) {
        let mut config = Config::default();
        config.storage.work_dir = dir.path().to_path_buf();
        let cache = config.fetch_cache_dir();
        tokio::fs::create_dir_all(&cache).await.unwrap();
        let temp_path = cache.join("raw-test.txt");
        tokio::fs::write(&temp_path, body).await.unwrap();
        let container = RawContainer {
            filing: filing(),
            temp_path,
            accessed: Utc::now(),
        };
        (container, config)
    }

    #[tokio::test]
    async fn well_formed_container_yields_header_and_documents() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "{}\n{}{}",
            header_block(),
            segment("8-K", "1", "form8k.htm", Some("FORM 8-K"), "<html>main</html>"),
            segment("EX-99.1", "2", "press.htm", None, "<html>press</html>"),
        );
        let (container, config) = write_container(&dir, &body).await;

        let records = decompose(&container, &config).await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].doc_type, "SEC Header");
        assert_eq!(records[0].sequence, "0");
        let header_text = tokio::fs::read_to_string(&records[0].local_path).await.unwrap();
        assert_eq!(header_text, header_block());

        assert_eq!(records[1].doc_type, "8-K");
        assert_eq!(records[1].sequence, "1");
        assert_eq!(records[1].server_filename, "form8k.htm");
        assert_eq!(records[1].description.as_deref(), Some("FORM 8-K"));
        let doc_text = tokio::fs::read_to_string(&records[1].local_path).await.unwrap();
        assert_eq!(doc_text, "<html>main</html>");

        assert_eq!(records[2].description, None);
        assert!(records[2].local_path.to_string_lossy().ends_with("2.html"));
    }

    #[tokio::test]
    async fn text_only_stops_at_first_graphic() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "{}\n{}{}{}",
            header_block(),
            segment("8-K", "1", "form8k.htm", None, "<html>main</html>"),
            segment("EX-99.1", "2", "press.htm", None, "<html>press</html>"),
            segment("GRAPHIC", "3", "chart.gif", Some("CHART"), &graphic_payload()),
        );
        let (container, config) = write_container(&dir, &body).await;

        let records = decompose(&container, &config).await.unwrap();

        // Header + the two text segments; processing halted before the GRAPHIC
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.is_graphic()));
        let jpgs: Vec<_> = walkdir::WalkDir::new(dir.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "jpg"))
            .collect();
        assert!(jpgs.is_empty(), "no .jpg may be written in text-only mode");
    }

    #[tokio::test]
    async fn graphic_is_decoded_when_text_only_is_off() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "{}\n{}{}",
            header_block(),
            segment("GRAPHIC", "1", "chart.gif", None, &graphic_payload()),
            segment("8-K", "2", "form8k.htm", None, "<html>main</html>"),
        );
        let (container, mut config) = write_container(&dir, &body).await;
        config.processing.text_only = false;

        let records = decompose(&container, &config).await.unwrap();

        assert_eq!(records.len(), 3);
        assert!(records[1].is_graphic());
        assert!(records[1].local_path.to_string_lossy().ends_with("1.jpg"));
        let bytes = tokio::fs::read(&records[1].local_path).await.unwrap();
        assert_eq!(bytes, b"Cat");
        // Segments after the GRAPHIC are still processed
        assert_eq!(records[2].sequence, "2");
    }

    #[tokio::test]
    async fn malformed_segment_abandons_the_rest() {
        let dir = TempDir::new().unwrap();
        // Second segment misses <FILENAME>, third is well-formed again
        let broken = "<DOCUMENT>\n<TYPE>EX-99.1\n<SEQUENCE>2\n<TEXT>\norphan\n</TEXT>\n</DOCUMENT>\n";
        let body = format!(
            "{}\n{}{}{}",
            header_block(),
            segment("8-K", "1", "form8k.htm", None, "<html>main</html>"),
            broken,
            segment("EX-99.2", "3", "extra.htm", None, "<html>extra</html>"),
        );
        let (container, config) = write_container(&dir, &body).await;

        let records = decompose(&container, &config).await.unwrap();

        // Header + first segment only; everything after the bad segment is dropped
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence, "1");
    }

    #[tokio::test]
    async fn missing_header_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let body = segment("8-K", "1", "form8k.htm", None, "<html>main</html>");
        let (container, config) = write_container(&dir, &body).await;

        let err = decompose(&container, &config).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Parse(ParseError::MissingHeader { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_graphic_payload_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "{}\n{}",
            header_block(),
            segment("GRAPHIC", "1", "chart.gif", None, "<html>not encoded</html>"),
        );
        let (container, mut config) = write_container(&dir, &body).await;
        config.processing.text_only = false;

        let err = decompose(&container, &config).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Parse(ParseError::InvalidEncoding { .. })
        ));
    }

    #[tokio::test]
    async fn sibling_containers_get_distinct_prefixes() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "{}\n{}",
            header_block(),
            segment("8-K", "1", "form8k.htm", None, "<html>main</html>"),
        );
        let (container, config) = write_container(&dir, &body).await;

        let first = decompose(&container, &config).await.unwrap();
        let second = decompose(&container, &config).await.unwrap();

        // The second run may not overwrite the first run's files
        assert_ne!(first[0].local_path, second[0].local_path);
        assert!(second[0].local_path.to_string_lossy().contains("acmecorp"));
    }

    #[test]
    fn payload_extraction_strips_the_trailing_newline() {
        let seg = "<TYPE>X\n<SEQUENCE>1\n<FILENAME>a\n<TEXT>\nline one\nline two\n</TEXT>\n";
        assert_eq!(payload_of(seg), "line one\nline two");
    }

    #[test]
    fn payload_is_empty_when_markers_are_missing() {
        assert_eq!(payload_of("<TYPE>X\n<SEQUENCE>1\n<FILENAME>a\n"), "");
    }
}
