use log::debug;

use crate::jobs::{self, JobCmdFlags, JobState, Process};
use crate::parser::{Command, Pipeline};
use crate::prelude::*;
use crate::signal::{self, SigMaskGuard};
use crate::terminal;
use crate::utils::RustFd;

use super::wait_foreground;

/// Launch a pipeline as one job: N children wired by N-1 pipes, all placed
/// in a process group led by the first child.
pub fn launch(pl: Pipeline) -> ShResult<()> {
	let count = pl.commands.len();

	// Open redirection targets up front so a bad path fails the whole
	// command before anything has forked.
	let infd = pl
		.input
		.as_deref()
		.map(|path| RustFd::open(path, OFlag::O_RDONLY, Mode::empty()))
		.transpose()?;
	let outfd = pl
		.output
		.as_deref()
		.map(|path| {
			let flags = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC;
			RustFd::open(path, flags, Mode::from_bits(0o644).unwrap())
		})
		.transpose()?;

	let mut pipes = Vec::with_capacity(count.saturating_sub(1));
	for _ in 1..count {
		pipes.push(RustFd::pipe()?);
	}

	// Blocked from here through the fork loop. Children inherit the
	// blocked mask and open it themselves right before exec.
	let guard = SigMaskGuard::block(&signal::job_control_set())?;

	let state = if pl.background { JobState::Background } else { JobState::Foreground };
	let num = jobs::write_jobs(|table| table.add_job(state))??;

	let mut pgid: Option<Pid> = None;
	for (i, cmd) in pl.commands.iter().enumerate() {
		match unsafe { fork() } {
			Ok(ForkResult::Child) => {
				exec_child(i, cmd, pgid, &pl, &pipes, infd.as_ref(), outfd.as_ref());
			}
			Ok(ForkResult::Parent { child }) => {
				let pgid = *pgid.get_or_insert(child);
				// The parent repeats the child's setpgid so group
				// membership does not depend on which side runs first.
				let _ = setpgid(child, pgid);
				jobs::write_jobs(|table| {
					table.add_process(num, Process::new(child, cmd.to_string()))
				})??;
			}
			Err(e) => {
				// Partial pipeline: kill what exists and let the reaper
				// collect it. Pipes and redirection fds close on drop.
				if let Some(pgid) = pgid {
					let _ = killpg(pgid, Signal::SIGKILL);
				} else {
					jobs::write_jobs(|table| table.synchronize(num))?;
				}
				return Err(ShErr::Io(format!("fork failed: {}", e)))
			}
		}
	}
	debug!("launched job [{}] with pgid {:?}", num, pgid);

	// The parent is neither producer nor consumer on any pipe
	drop(pipes);
	drop(infd);
	drop(outfd);

	if pl.background {
		let line = jobs::read_jobs(|table| {
			table.get_job(num).map(|job| job.display(JobCmdFlags::PIDS))
		})?;
		if let Some(line) = line {
			println!("{}", line);
		}
	} else if let Some(pgid) = pgid {
		if let Err(e) = terminal::give_terminal_to(pgid) {
			jobs::write_jobs(|table| {
				if let Some(job) = table.get_job_mut(num) {
					job.set_state(JobState::Background);
				}
			})?;
			return Err(e)
		}
		wait_foreground(&guard)?;
	}
	Ok(())
}

/// Everything between fork and exec. Never returns: the image is replaced
/// or the process exits.
fn exec_child(
	i: usize,
	cmd: &Command,
	pgid: Option<Pid>,
	pl: &Pipeline,
	pipes: &[(RustFd, RustFd)],
	infd: Option<&RustFd>,
	outfd: Option<&RustFd>,
) -> ! {
	let count = pl.commands.len();
	let pid = getpid();
	let _ = setpgid(pid, pgid.unwrap_or(pid));
	let _ = signal::restore_defaults();

	let wired = (|| -> ShResult<()> {
		if i == 0 {
			if let Some(fd) = infd {
				fd.dup2(&STDIN_FILENO)?;
			}
		}
		if i == count - 1 {
			if let Some(fd) = outfd {
				fd.dup2(&STDOUT_FILENO)?;
			}
		}
		if i > 0 {
			pipes[i - 1].0.dup2(&STDIN_FILENO)?;
		}
		if i < count - 1 {
			pipes[i].1.dup2(&STDOUT_FILENO)?;
		}
		Ok(())
	})();

	// Close every inherited pipe end and the original redirection fds.
	// Anything left open past exec would keep a reader from seeing EOF.
	for (r_pipe, w_pipe) in pipes {
		let _ = close(r_pipe.as_raw_fd());
		let _ = close(w_pipe.as_raw_fd());
	}
	if let Some(fd) = infd {
		let _ = close(fd.as_raw_fd());
	}
	if let Some(fd) = outfd {
		let _ = close(fd.as_raw_fd());
	}
	if let Err(e) = wired {
		eprintln!("{}", e);
		std::process::exit(1);
	}

	let _ = signal::unblock(&signal::job_control_set());

	let Ok(command) = CString::new(cmd.command.as_str()) else {
		std::process::exit(1)
	};
	let argv = cmd
		.argv()
		.into_iter()
		.filter_map(|arg| CString::new(arg).ok())
		.collect::<Vec<_>>();

	let Err(e) = execvp(&command, &argv);
	match e {
		Errno::ENOENT => eprintln!("{}", ShErr::CmdNotFound(cmd.command.clone())),
		_ => eprintln!("{}: {}", cmd.command, e),
	}
	std::process::exit(127)
}
