pub mod cli;
pub mod config;
pub mod error;
pub mod frontend;
pub mod index;
pub mod indexer;
pub mod model;
pub mod patch;
pub mod util;

pub use error::{ErrorKind, PatchError};
pub use index::CodebaseIndex;
pub use indexer::{IndexOptions, Indexer, index_codebase};
pub use model::{ChangeOutcome, EditRequest};
pub use patch::{ChangeApplier, apply_changes};
