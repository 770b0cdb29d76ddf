//! Remove a document's chunks and registration

use crate::error::Result;
use crate::store::VectorStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of removing a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveStats {
    pub chunks_deleted: u64,
    pub document_removed: bool,
}

/// Delete all chunks for a document and drop its registration.
///
/// Idempotent: removing an unknown document reports zero deletions.
pub async fn cmd_remove(
    store: &VectorStore,
    doc_id: &str,
    collection: &str,
) -> Result<RemoveStats> {
    let chunks_deleted = store.delete_by_source(doc_id, collection).await?;
    let document_removed = store.remove_document(doc_id, collection).await? > 0;

    info!(
        doc_id = doc_id,
        collection = collection,
        chunks_deleted,
        "Removed document"
    );

    Ok(RemoveStats {
        chunks_deleted,
        document_removed,
    })
}

/// Print removal stats to the console
pub fn print_remove_stats(doc_id: &str, stats: &RemoveStats) {
    if stats.chunks_deleted == 0 && !stats.document_removed {
        println!("Nothing to remove for '{}'", doc_id);
    } else {
        println!(
            "✓ Removed '{}': {} chunks deleted",
            doc_id, stats.chunks_deleted
        );
    }
}
