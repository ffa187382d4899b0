pub mod builtin;
pub mod error;
pub mod execute;
pub mod jobs;
pub mod parser;
pub mod prelude;
pub mod prompt;
pub mod signal;
pub mod terminal;
pub mod utils;

use once_cell::sync::Lazy;

use crate::prelude::*;

pub const JSH_VERSION: &str = "v0.1.0";

/// The shell's own pid, recorded before any fork so the REPL's catch site
/// can tell the parent apart from a child that never reached exec.
pub static SHELL_PID: Lazy<Pid> = Lazy::new(getpid);
