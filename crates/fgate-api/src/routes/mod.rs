//! # API Route Modules
//!
//! - `files`: list uploaded files and accept multipart uploads.
//! - `download`: stream a stored file back by content id.
//!
//! Health probes and `/metrics` live in the crate root next to [`crate::app`].

pub mod download;
pub mod files;
