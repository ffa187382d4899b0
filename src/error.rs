use nix::errno::Errno;

use std::fmt::{self, Display};

pub type ShResult<T> = Result<T, ShErr>;

/// Everything the REPL can catch. User mistakes and OS failures are printed
/// and the loop continues; `CleanExit` is not an error at all, it lets `exit`
/// and `quit` unwind to the single catch site at the top of the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ShErr {
	Parse(String),
	Usage(String),
	NoSuchJob(String),
	NoSuchProcess(String),
	UnknownPid(i32),
	CmdNotFound(String),
	Io(String),
	ErrNo(Errno),
	Internal(String),

	// Not an actual error, used to propagate `exit` and `quit` to the REPL
	CleanExit(i32),
}

impl ShErr {
	pub fn from_io() -> Self {
		Self::Io(std::io::Error::last_os_error().to_string())
	}

	pub fn usage(msg: impl Into<String>) -> Self {
		Self::Usage(msg.into())
	}

	pub fn internal(msg: impl Into<String>) -> Self {
		Self::Internal(msg.into())
	}
}

impl From<std::io::Error> for ShErr {
	fn from(value: std::io::Error) -> Self {
		Self::Io(value.to_string())
	}
}

impl From<Errno> for ShErr {
	fn from(value: Errno) -> Self {
		Self::ErrNo(value)
	}
}

impl Display for ShErr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ShErr::Parse(msg) => write!(f, "Parse Error: {}", msg),
			ShErr::Usage(usage) => write!(f, "Usage: {}.", usage),
			ShErr::NoSuchJob(ctx) => write!(f, "{}:  No such job.", ctx),
			ShErr::NoSuchProcess(ctx) => write!(f, "{}:  No such process.", ctx),
			ShErr::UnknownPid(pid) => write!(f, "No process with pid {}.", pid),
			ShErr::CmdNotFound(name) => write!(f, "{}: Command not found.", name),
			ShErr::Io(msg) => write!(f, "I/O Error: {}", msg),
			ShErr::ErrNo(no) => write!(f, "ERRNO: {}", no),
			ShErr::Internal(msg) => write!(f, "Internal Error: {}", msg),
			ShErr::CleanExit(_) => write!(f, ""),
		}
	}
}
