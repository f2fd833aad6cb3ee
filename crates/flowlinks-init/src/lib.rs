//! Provisioning for the flowlinks hosting site.
//!
//! Creates a hosting site whose every URL rewrites to the redirect server,
//! uploads the bundled landing and 404 pages, releases it, seeds the default
//! link record, and reports the outcome to the extension runtime.

pub mod assets;
pub mod config;
mod error;
pub mod hosting;
pub mod provision;
pub mod runtime;

pub use config::InitConfig;
pub use error::{InitError, Result};
pub use hosting::HostingClient;
pub use provision::{Deployment, Plan, Provisioner};
pub use runtime::{ExtensionsRuntime, LogReporter, ProcessingState, StateReporter};
