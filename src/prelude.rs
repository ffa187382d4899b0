pub use std::{
	collections::{
		BTreeMap,
		HashMap,
		VecDeque
	},
	env,
	ffi::CString,
	fmt::{
		self,
		Display
	},
	os::fd::{
		AsFd,
		AsRawFd,
		BorrowedFd,
		IntoRawFd,
		RawFd
	},
	path::{
		Path,
		PathBuf
	}
};

pub use libc::{
	STDERR_FILENO,
	STDIN_FILENO,
	STDOUT_FILENO
};
pub use nix::{
	errno::Errno,
	fcntl::{
		open,
		OFlag
	},
	sys::{
		signal::{
			kill,
			killpg,
			Signal
		},
		stat::Mode,
		wait::WaitStatus
	},
	unistd::{
		close,
		dup2,
		execvp,
		fork,
		getpgrp,
		getpid,
		isatty,
		pipe,
		setpgid,
		ForkResult,
		Pid
	}
};
pub use bitflags::bitflags;
pub use crate::error::{
	ShErr,
	ShResult
};
