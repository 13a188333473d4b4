//! Schema documents: loading, `$ref` resolution and the typed node model

pub mod deref;
pub mod loader;
pub mod node;
pub mod refs;

pub use deref::{dereference, dereference_file, Dereferencer};
pub use loader::{bundled, load_bundled, load_from_directory, DocumentKind, LoadConfig, SchemaDocument};
pub use node::{NodeKind, SchemaNode};
pub use refs::RefGraph;
