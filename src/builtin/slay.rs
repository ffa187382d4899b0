use log::debug;

use crate::jobs::{self, ProcState};
use crate::prelude::*;
use crate::signal::{self, SigMaskGuard};

use super::parse_number;

enum Target {
	One(Pid),
	Group,
}

/// `slay`, `halt` and `cont` share one shape and differ only in the signal
/// they deliver. Two arguments name a job and a process index within it.
/// One argument names a pid the table knows about, or failing that a whole
/// job by number.
pub fn send_signal(name: &str, args: &[String], sig: Signal) -> ShResult<()> {
	let usage = || ShErr::usage(format!("{0} <jobid> <index> | {0} <pid>", name));

	let _guard = SigMaskGuard::block(&signal::job_control_set())?;
	let (target, num) = match args {
		[arg] => {
			let raw: i32 = parse_number(arg).ok_or_else(usage)?;
			let pid = Pid::from_raw(raw);
			let owner = jobs::read_jobs(|table| table.job_with_process(pid).map(|job| job.num()))?;
			match owner {
				Some(num) => (Target::One(pid), num),
				None if jobs::read_jobs(|table| table.contains_job(raw as usize))? => {
					(Target::Group, raw as usize)
				}
				None => return Err(ShErr::UnknownPid(raw)),
			}
		}
		[job_arg, idx_arg] => {
			let num: usize = parse_number(job_arg).ok_or_else(usage)?;
			let idx: usize = parse_number(idx_arg).ok_or_else(usage)?;
			let pid = jobs::read_jobs(|table| -> ShResult<Pid> {
				let job = table
					.get_job(num)
					.ok_or_else(|| ShErr::NoSuchJob(format!("{} {} {}", name, num, idx)))?;
				let process = job
					.processes()
					.get(idx)
					.ok_or_else(|| ShErr::NoSuchProcess(format!("{} {} {}", name, num, idx)))?;
				Ok(process.pid())
			})??;
			(Target::One(pid), num)
		}
		_ => return Err(usage()),
	};

	debug!("{} sends {:?} to job [{}]", name, sig, num);
	jobs::write_jobs(|table| -> ShResult<()> {
		match target {
			Target::One(pid) => {
				kill(pid, sig)?;
				if sig == Signal::SIGCONT {
					table.set_process_state(pid, ProcState::Running);
				}
			}
			Target::Group => {
				let job = table
					.get_job_mut(num)
					.ok_or_else(|| ShErr::internal("job vanished mid-builtin"))?;
				job.killpg(sig)?;
				if sig == Signal::SIGCONT {
					job.mark_continued();
				}
			}
		}
		table.synchronize(num);
		Ok(())
	})??;
	Ok(())
}
