use log::debug;

use crate::execute;
use crate::jobs::{self, JobState};
use crate::prelude::*;
use crate::signal::{self, SigMaskGuard};
use crate::terminal;

use super::parse_number;

/// Shared path for `fg` and `bg`: continue every member of the job, then
/// either adopt it as the foreground job and wait on it, or leave it
/// running in the background.
pub fn continue_job(args: &[String], fg: bool) -> ShResult<()> {
	let name = if fg { "fg" } else { "bg" };
	let num = parse_jobnum(args, name)?;

	let guard = SigMaskGuard::block(&signal::job_control_set())?;

	let pgid = jobs::write_jobs(|table| -> ShResult<Pid> {
		let job = table
			.get_job_mut(num)
			.ok_or_else(|| ShErr::NoSuchJob(format!("{} {}", name, num)))?;
		job.killpg(Signal::SIGCONT)?;
		job.mark_continued();
		job.set_state(if fg { JobState::Foreground } else { JobState::Background });
		job.pgid().ok_or_else(|| ShErr::internal("job has no process group"))
	})??;
	jobs::write_jobs(|table| table.synchronize(num))?;
	debug!("continued job [{}] as {}", num, name);

	if fg {
		terminal::give_terminal_to(pgid)?;
		execute::wait_foreground(&guard)?;
	}
	Ok(())
}

fn parse_jobnum(args: &[String], name: &str) -> ShResult<usize> {
	let [arg] = args else {
		return Err(ShErr::usage(format!("{} <jobid>", name)))
	};
	parse_number(arg).ok_or_else(|| ShErr::usage(format!("{} <jobid>", name)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn jobnum_argument_is_required_and_numeric() {
		assert_eq!(parse_jobnum(&[], "fg"), Err(ShErr::Usage("fg <jobid>".into())));
		assert_eq!(
			parse_jobnum(&["three".into()], "fg"),
			Err(ShErr::Usage("fg <jobid>".into()))
		);
		assert_eq!(
			parse_jobnum(&["3".into(), "4".into()], "bg"),
			Err(ShErr::Usage("bg <jobid>".into()))
		);
		assert_eq!(parse_jobnum(&["3".into()], "fg"), Ok(3));
	}
}
