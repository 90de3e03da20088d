//! # fgate-core: foundational types for fgate
//!
//! Leaf crate of the workspace. Defines the identifiers and records shared
//! by the gateway client, the API service and the CLI.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for gateway identifiers.** `FileSystemId`,
//!    `ContentId` and `FileSystemToken` are validated at construction. A
//!    content identifier is also used as a directory name under the upload
//!    directory, so its alphabet is restricted.
//!
//! 2. **Sanitized names only.** `FileName` can only be built through
//!    [`sanitize::sanitize_file_name`]; a `FileName` never contains a path
//!    separator and never resolves outside the directory it is joined to.
//!
//! 3. **Explicit commit status.** Gateway `info` responses are decoded into
//!    [`CommitStatus`]; only `Committed` confirms an upload.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fgate-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod record;
pub mod sanitize;

pub use error::ValidationError;
pub use identity::{ContentId, FileSystemId, FileSystemToken};
pub use record::{CommitStatus, FileRecord, FileSystemRecord};
pub use sanitize::{sanitize_file_name, FileName};
