use nix::sys::signal::{sigaction, sigprocmask, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};

use crate::jobs::{self, ProcState};
use crate::prelude::*;

/// The signals that race with job table mutation. Block these before
/// touching the table anywhere outside a handler.
pub fn job_control_set() -> SigSet {
	let mut set = SigSet::empty();
	set.add(Signal::SIGCHLD);
	set.add(Signal::SIGINT);
	set.add(Signal::SIGTSTP);
	set.add(Signal::SIGCONT);
	set
}

/// Scoped signal mask. Blocks `set` on construction and puts the previous
/// mask back when dropped, no matter how the scope is left.
pub struct SigMaskGuard {
	prev: SigSet,
}

impl SigMaskGuard {
	pub fn block(set: &SigSet) -> ShResult<Self> {
		let mut prev = SigSet::empty();
		sigprocmask(SigmaskHow::SIG_BLOCK, Some(set), Some(&mut prev))?;
		Ok(Self { prev })
	}

	/// Atomically swap in the saved mask and sleep until a signal is
	/// delivered and handled. sigsuspend always comes back with EINTR, so
	/// the result carries no information.
	pub fn suspend(&self) {
		let _ = self.prev.suspend();
	}
}

impl Drop for SigMaskGuard {
	fn drop(&mut self) {
		let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.prev), None);
	}
}

pub fn unblock(set: &SigSet) -> ShResult<()> {
	sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(set), None)?;
	Ok(())
}

/// Install `handler` for `signal` with restart-on-EINTR semantics. Every
/// handler runs with the whole job-control set masked so two handlers can
/// never interleave over the table.
pub fn install(signal: Signal, handler: SigHandler) -> ShResult<()> {
	let action = SigAction::new(handler, SaFlags::SA_RESTART, job_control_set());
	unsafe { sigaction(signal, &action) }?;
	Ok(())
}

pub fn install_handlers() -> ShResult<()> {
	install(Signal::SIGCHLD, SigHandler::Handler(sigchld_handler))?;
	install(Signal::SIGINT, SigHandler::Handler(forward_handler))?;
	install(Signal::SIGTSTP, SigHandler::Handler(forward_handler))?;
	install(Signal::SIGQUIT, SigHandler::Handler(sigquit_handler))?;
	// Never let terminal handoff stop the shell itself
	install(Signal::SIGTTIN, SigHandler::SigIgn)?;
	install(Signal::SIGTTOU, SigHandler::SigIgn)?;
	Ok(())
}

/// Put back the default dispositions. Forked children call this before
/// exec so Ctrl-C and Ctrl-Z reach them the normal way.
pub fn restore_defaults() -> ShResult<()> {
	for signal in [
		Signal::SIGCHLD,
		Signal::SIGINT,
		Signal::SIGTSTP,
		Signal::SIGQUIT,
		Signal::SIGTTIN,
		Signal::SIGTTOU,
	] {
		install(signal, SigHandler::SigDfl)?;
	}
	Ok(())
}

fn proc_state_for(status: &WaitStatus) -> Option<(Pid, ProcState)> {
	match status {
		WaitStatus::Exited(pid, _) => Some((*pid, ProcState::Terminated)),
		WaitStatus::Signaled(pid, _, _) => Some((*pid, ProcState::Terminated)),
		WaitStatus::Stopped(pid, _) => Some((*pid, ProcState::Stopped)),
		WaitStatus::Continued(pid) => Some((*pid, ProcState::Running)),
		_ => None,
	}
}

/// SIGCHLD: drain every waitable event without blocking and fold each one
/// into the job table. WUNTRACED and WCONTINUED make stops and resumes
/// visible, not just exits.
extern "C" fn sigchld_handler(_: libc::c_int) {
	let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
	loop {
		let status = match waitpid(None, Some(flags)) {
			Ok(WaitStatus::StillAlive) | Err(_) => break,
			Ok(status) => status,
		};
		let Some((pid, state)) = proc_state_for(&status) else { continue };
		jobs::with_jobs_in_handler(|table| {
			if let Some(num) = table.set_process_state(pid, state) {
				table.synchronize(num);
			}
		});
	}
}

/// SIGINT / SIGTSTP at the shell: pass it along to the foreground job's
/// process group if there is one, otherwise swallow it.
extern "C" fn forward_handler(signo: libc::c_int) {
	let Ok(signal) = Signal::try_from(signo) else { return };
	jobs::with_jobs_in_handler(|table| {
		if let Some(pgid) = table.foreground_pgid() {
			let _ = killpg(pgid, signal);
		}
	});
}

extern "C" fn sigquit_handler(_: libc::c_int) {
	std::process::exit(0);
}
