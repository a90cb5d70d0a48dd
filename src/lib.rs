#[cfg(feature = "cli")]
pub mod cli;
pub mod engine;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod probe;
pub mod util;

pub use engine::check_proxy;
pub use error::{ErrorKind, ProbeError};
pub use model::{ProbeConfig, ProbeResult, ProbeTarget};
