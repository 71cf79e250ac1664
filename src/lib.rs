#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod nuke;

pub use config::Config;
pub use error::{DeskError, Result};
