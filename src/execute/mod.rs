pub mod pipeline;

use crate::builtin::{self, BUILTINS};
use crate::jobs;
use crate::parser::Pipeline;
use crate::prelude::*;
use crate::signal::SigMaskGuard;
use crate::terminal;

/// Route a parsed pipeline: the leading command either names a builtin or
/// the whole pipeline is launched as a job.
pub fn dispatch(pl: Pipeline) -> ShResult<()> {
	let Some(first) = pl.commands.first() else {
		return Err(ShErr::internal("dispatched an empty pipeline"))
	};
	if BUILTINS.contains(&first.command.as_str()) {
		builtin::dispatch(pl)
	} else {
		pipeline::launch(pl)
	}
}

/// Park the shell until no foreground job remains, then reclaim the
/// terminal. The caller must already hold a mask guard over the
/// job-control set; the table check cannot race the reaper because
/// delivery only happens inside `suspend`.
pub fn wait_foreground(guard: &SigMaskGuard) -> ShResult<()> {
	while jobs::read_jobs(|table| table.has_foreground_job())? {
		guard.suspend();
	}
	terminal::take_terminal_back()
}
