//! The image pipeline: one inbound image in, up to three replies out.

pub mod composer;
pub mod services;
pub mod worker;

pub use composer::{ComposerSettings, EmissionReport, ResponseComposer};
pub use services::Services;
pub use worker::{run_worker, spawn_worker};
