use nix::unistd::tcsetpgrp;
use once_cell::sync::Lazy;

use crate::prelude::*;

/// The shell's own process group, fixed at startup.
pub static SHELL_PGID: Lazy<Pid> = Lazy::new(getpgrp);

/// Make `pgid` the controlling terminal's foreground process group. ENOTTY
/// just means there is no controlling terminal to hand over; anything else
/// fails the current command.
pub fn give_terminal_to(pgid: Pid) -> ShResult<()> {
	let stdin = unsafe { BorrowedFd::borrow_raw(STDIN_FILENO) };
	match tcsetpgrp(stdin, pgid) {
		Ok(()) | Err(Errno::ENOTTY) => Ok(()),
		Err(e) => Err(ShErr::ErrNo(e)),
	}
}

/// The shell holds the terminal whenever no foreground job does.
pub fn take_terminal_back() -> ShResult<()> {
	give_terminal_to(*SHELL_PGID)
}
