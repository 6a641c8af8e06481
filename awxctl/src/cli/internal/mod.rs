//! Helpers shared by the CLI commands.

mod resource;

pub use self::resource::{ResolvedResources, ResourceResolver};
