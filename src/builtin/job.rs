use crate::jobs::{self, JobCmdFlags};
use crate::prelude::*;

pub fn jobs(args: &[String]) -> ShResult<()> {
	let flags = parse_flags(args)?;
	let listing = jobs::read_jobs(|table| table.listing(flags))?;
	if !listing.is_empty() {
		println!("{}", listing);
	}
	Ok(())
}

fn parse_flags(args: &[String]) -> ShResult<JobCmdFlags> {
	let mut flags = JobCmdFlags::empty();
	for arg in args {
		let mut chars = arg.chars().peekable();
		if chars.peek().is_none_or(|ch| *ch != '-') {
			return Err(ShErr::usage("jobs [-prs]"))
		}
		chars.next(); // Ignore the hyphen
		for ch in chars {
			let flag = match ch {
				'p' => JobCmdFlags::PIDS,
				'r' => JobCmdFlags::RUNNING,
				's' => JobCmdFlags::STOPPED,
				_ => return Err(ShErr::usage("jobs [-prs]")),
			};
			flags |= flag;
		}
	}
	Ok(flags)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flag_parsing() {
		assert_eq!(parse_flags(&[]).unwrap(), JobCmdFlags::empty());
		assert_eq!(parse_flags(&["-p".into()]).unwrap(), JobCmdFlags::PIDS);
		assert_eq!(
			parse_flags(&["-rs".into()]).unwrap(),
			JobCmdFlags::RUNNING | JobCmdFlags::STOPPED
		);
		assert!(parse_flags(&["-x".into()]).is_err());
		assert!(parse_flags(&["p".into()]).is_err());
	}
}
