//! List registered documents

use crate::error::Result;
use crate::store::{DocumentRecord, VectorStore};

/// List documents registered in a collection
pub async fn cmd_list_documents(
    store: &VectorStore,
    collection: &str,
) -> Result<Vec<DocumentRecord>> {
    store.list_documents(collection).await
}

/// Print document listing to the console
pub fn print_documents(collection: &str, docs: &[DocumentRecord]) {
    if docs.is_empty() {
        println!("No documents registered in collection '{}'.", collection);
        return;
    }

    println!("\nDocuments in '{}':\n", collection);
    for doc in docs {
        let name = doc.display_name.as_deref().unwrap_or("(unnamed)");
        println!("  {}  {}", doc.id, name);
        if let Some(path) = &doc.stored_path {
            println!("      path: {}", path);
        }
        if let Some(owner) = &doc.owner_id {
            println!("      owner: {}", owner);
        }
    }
}
