//! Command implementations

mod docs;
mod init;
mod ingest;
mod query;
mod reindex;
mod remove;
mod status;

pub use docs::*;
pub use init::*;
pub use ingest::*;
pub use query::*;
pub use reindex::*;
pub use remove::*;
pub use status::*;
