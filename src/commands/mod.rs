//! CLI commands implementation

pub mod build;
pub mod init;
pub mod query;
pub mod status;

pub use build::*;
pub use init::*;
pub use query::*;
pub use status::*;
