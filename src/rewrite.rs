//! Rewrites GRAPHIC server filenames to local basenames in sibling documents
//!
//! Archive documents reference their embedded media by the filename the
//! attachment had on the server. After decomposition those attachments live
//! under resolved local names, so each non-GRAPHIC sibling gets every
//! GRAPHIC's server filename replaced with the local basename — plain
//! literal substitution, no escaping or pattern semantics.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::types::DocumentRecord;

/// Fix media references across every container's documents
///
/// Containers without a GRAPHIC are left untouched. A sibling whose file
/// cannot be read or written is logged as a warning and skipped; the rest of
/// the batch proceeds.
pub async fn rewrite_references(documents: &[DocumentRecord]) {
    // Group by container, preserving encounter order
    let mut order: Vec<&str> = Vec::new();
    let mut by_container: HashMap<&str, Vec<&DocumentRecord>> = HashMap::new();
    for doc in documents {
        let entry = by_container.entry(doc.identifier.as_str()).or_default();
        if entry.is_empty() {
            order.push(doc.identifier.as_str());
        }
        entry.push(doc);
    }

    for identifier in order {
        let Some(docs) = by_container.get(identifier) else {
            continue;
        };
        let graphics: Vec<&DocumentRecord> =
            docs.iter().copied().filter(|d| d.is_graphic()).collect();
        if graphics.is_empty() {
            continue;
        }

        for doc in docs.iter().filter(|d| !d.is_graphic()) {
            match rewrite_file(doc, &graphics).await {
                Ok(()) => {
                    debug!(
                        identifier = %identifier,
                        path = ?doc.local_path,
                        graphics = graphics.len(),
                        "media references rewritten"
                    );
                }
                Err(e) => {
                    warn!(
                        identifier = %identifier,
                        path = ?doc.local_path,
                        error = %e,
                        "failed to rewrite media references"
                    );
                }
            }
        }
    }
}

async fn rewrite_file(
    doc: &DocumentRecord,
    graphics: &[&DocumentRecord],
) -> std::io::Result<()> {
    let mut text = tokio::fs::read_to_string(&doc.local_path).await?;
    for graphic in graphics {
        text = text.replace(&graphic.server_filename, graphic.local_basename());
    }
    tokio::fs::write(&doc.local_path, text).await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record(identifier: &str, doc_type: &str, server: &str, local: PathBuf) -> DocumentRecord {
        DocumentRecord {
            identifier: identifier.to_string(),
            sequence: "1".to_string(),
            doc_type: doc_type.to_string(),
            server_filename: server.to_string(),
            description: None,
            local_path: local,
        }
    }

    #[tokio::test]
    async fn replaces_server_name_with_local_basename() {
        let dir = TempDir::new().unwrap();
        let html_path = dir.path().join("20150314_acme_1.html");
        tokio::fs::write(&html_path, "<p>before</p><img src=\"X.GIF\"><p>after</p>")
            .await
            .unwrap();

        let docs = vec![
            record("edgar/a.txt", "8-K", "form8k.htm", html_path.clone()),
            record(
                "edgar/a.txt",
                "GRAPHIC",
                "X.GIF",
                dir.path().join("picA.jpg"),
            ),
        ];

        rewrite_references(&docs).await;

        let text = tokio::fs::read_to_string(&html_path).await.unwrap();
        assert_eq!(text, "<p>before</p><img src=\"picA.jpg\"><p>after</p>");
    }

    #[tokio::test]
    async fn containers_without_graphics_are_untouched() {
        let dir = TempDir::new().unwrap();
        let html_path = dir.path().join("doc.html");
        let original = "<img src=\"X.GIF\">";
        tokio::fs::write(&html_path, original).await.unwrap();

        let docs = vec![record("edgar/a.txt", "8-K", "form8k.htm", html_path.clone())];
        rewrite_references(&docs).await;

        let text = tokio::fs::read_to_string(&html_path).await.unwrap();
        assert_eq!(text, original);
    }

    #[tokio::test]
    async fn graphics_only_substitute_within_their_own_container() {
        let dir = TempDir::new().unwrap();
        let html_path = dir.path().join("doc.html");
        let original = "<img src=\"X.GIF\">";
        tokio::fs::write(&html_path, original).await.unwrap();

        // The GRAPHIC belongs to a different container
        let docs = vec![
            record("edgar/a.txt", "8-K", "form8k.htm", html_path.clone()),
            record(
                "edgar/b.txt",
                "GRAPHIC",
                "X.GIF",
                dir.path().join("picA.jpg"),
            ),
        ];
        rewrite_references(&docs).await;

        let text = tokio::fs::read_to_string(&html_path).await.unwrap();
        assert_eq!(text, original);
    }

    #[tokio::test]
    async fn every_graphic_is_substituted_once_per_sibling() {
        let dir = TempDir::new().unwrap();
        let html_path = dir.path().join("doc.html");
        tokio::fs::write(&html_path, "a.gif b.gif a.gif").await.unwrap();

        let docs = vec![
            record("edgar/a.txt", "8-K", "form8k.htm", html_path.clone()),
            record("edgar/a.txt", "GRAPHIC", "a.gif", dir.path().join("1.jpg")),
            record("edgar/a.txt", "GRAPHIC", "b.gif", dir.path().join("2.jpg")),
        ];
        rewrite_references(&docs).await;

        let text = tokio::fs::read_to_string(&html_path).await.unwrap();
        assert_eq!(text, "1.jpg 2.jpg 1.jpg");
    }

    #[tokio::test]
    async fn unreadable_sibling_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.html");
        let present = dir.path().join("here.html");
        tokio::fs::write(&present, "X.GIF").await.unwrap();

        let docs = vec![
            record("edgar/a.txt", "8-K", "gone.htm", missing),
            record("edgar/a.txt", "EX-99", "here.htm", present.clone()),
            record("edgar/a.txt", "GRAPHIC", "X.GIF", dir.path().join("p.jpg")),
        ];
        rewrite_references(&docs).await;

        // The surviving sibling was still rewritten
        let text = tokio::fs::read_to_string(&present).await.unwrap();
        assert_eq!(text, "p.jpg");
    }
}
