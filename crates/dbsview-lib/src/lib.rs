pub mod config;
pub mod dbs;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod filters;
pub mod io;
pub mod markers;
pub mod montage;
pub mod selection;
pub mod session;
pub mod signal;
pub mod view;

pub use error::{Error, Result};
pub use session::Session;
pub use signal::*;
