//! Navigation core for a phone-style shell hosting lazily loaded
//! sub-applications, plus a set of bundled applications to drive it.

pub mod apps;
pub mod cli;
pub mod config;
pub mod shell;

pub use config::ShellConfig;
pub use shell::{PhoneShell, ShellError};
