//! `coldstore-cli`
//!
//! **Responsibility:** the interaction shell of the cold-storage ledger.
//!
//! This crate provides:
//! - Form input parsing and the bill preview
//! - Explicit edit-session state (load a record, change it, submit)
//! - Command dispatch against any `RecordStore`
//! - Plain-text and JSON rendering
//!
//! Storage and billing rules live in `coldstore-infra` / `coldstore-inventory`;
//! this crate only collects input and shows results.

pub mod commands;
pub mod form;
pub mod render;
pub mod session;

pub use commands::{Cli, Command, execute};
pub use form::{BillArgs, EditArgs, FormArgs};
pub use session::{EditSession, Submission};
