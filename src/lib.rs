#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod dock;
pub mod error;
pub mod memory_writer;
pub mod observability;
pub mod persistence;

pub use config::Config;
pub use dock::{DockLayoutNode, DockLayoutState, PaneId};
pub use error::MuxError;
pub use memory_writer::{MemoryWriterPolicy, MemoryWriterStreamContext};
