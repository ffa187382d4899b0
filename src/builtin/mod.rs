pub mod control;
pub mod fg;
pub mod job;
pub mod slay;

use std::str::FromStr;

use crate::parser::Pipeline;
use crate::prelude::*;

pub const BUILTINS: [&str; 8] = [
	"quit", "exit", "jobs", "fg", "bg", "slay", "halt", "cont",
];

/// Builtins get the whole pipeline; everything after the leading name is an
/// argument. The ones that send signals do their table work under a mask
/// guard and `synchronize` before letting go.
pub fn dispatch(pl: Pipeline) -> ShResult<()> {
	let Some(cmd) = pl.commands.first() else {
		return Err(ShErr::internal("dispatched an empty builtin"))
	};
	match cmd.command.as_str() {
		"quit" | "exit" => control::exit(),
		"jobs" => job::jobs(&cmd.tokens),
		"fg" => fg::continue_job(&cmd.tokens, true),
		"bg" => fg::continue_job(&cmd.tokens, false),
		"slay" => slay::send_signal("slay", &cmd.tokens, Signal::SIGKILL),
		"halt" => slay::send_signal("halt", &cmd.tokens, Signal::SIGSTOP),
		"cont" => slay::send_signal("cont", &cmd.tokens, Signal::SIGCONT),
		name => Err(ShErr::internal(format!("not a builtin: {}", name))),
	}
}

/// The one rule for numeric builtin arguments: all ASCII digits, nothing
/// trailing, parsed as the target type.
pub(crate) fn parse_number<T: FromStr>(arg: &str) -> Option<T> {
	if arg.is_empty() || !arg.chars().all(|ch| ch.is_ascii_digit()) {
		return None
	}
	arg.parse().ok()
}

#[cfg(test)]
mod tests {
	use super::parse_number;

	#[test]
	fn numbers_must_be_bare_digits() {
		assert_eq!(parse_number::<usize>("42"), Some(42));
		assert_eq!(parse_number::<usize>("0"), Some(0));
		assert_eq!(parse_number::<usize>(""), None);
		assert_eq!(parse_number::<usize>("4x"), None);
		assert_eq!(parse_number::<usize>("-3"), None);
		assert_eq!(parse_number::<usize>("12 "), None);
		assert_eq!(parse_number::<i32>("12345"), Some(12345));
	}
}
