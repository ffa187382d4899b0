use log::debug;
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use once_cell::sync::Lazy;

use jsh::prelude::*;
use jsh::{execute, jobs, parser, prompt, signal, terminal, JSH_VERSION, SHELL_PID};

fn set_termios() -> Option<Termios> {
	if !isatty(std::io::stdin().as_raw_fd()).unwrap_or(false) {
		return None
	}
	let orig = termios::tcgetattr(std::io::stdin()).ok()?;
	let mut tio = orig.clone();
	tio.local_flags &= !LocalFlags::ECHOCTL;
	termios::tcsetattr(std::io::stdin(), SetArg::TCSANOW, &tio).ok()?;
	Some(orig)
}

fn restore_termios(orig: &Option<Termios>) {
	if let Some(termios) = orig {
		let _ = termios::tcsetattr(std::io::stdin(), SetArg::TCSANOW, termios);
	}
}

fn initialize_globals() {
	/*
	 * These are set using Lazy; dereference them very early so every one
	 * exists before the first signal handler can fire.
	 */
	Lazy::force(&SHELL_PID);
	Lazy::force(&terminal::SHELL_PGID);
	jobs::init_job_table();
}

struct CliOpts {
	hist_path: Option<PathBuf>,
}

fn parse_args() -> CliOpts {
	let mut hist_path = env::var("HOME")
		.ok()
		.map(|home| PathBuf::from(format!("{}/.jsh_hist", home)));

	let mut args = env::args().skip(1);
	while let Some(arg) = args.next() {
		match arg.as_str() {
			"--version" => {
				println!("{}", JSH_VERSION);
				std::process::exit(0);
			}
			"--no-history" => hist_path = None,
			"--history" => hist_path = args.next().map(PathBuf::from),
			_ => {
				eprintln!("jsh: unknown option: {}", arg);
				std::process::exit(2);
			}
		}
	}
	CliOpts { hist_path }
}

fn repl(reader: &mut prompt::LineReader) -> i32 {
	loop {
		let line = match reader.readline() {
			Ok(Some(line)) => line,
			Ok(None) => return 0,
			Err(e) => {
				eprintln!("{}", e);
				return 1
			}
		};
		if line.trim().is_empty() {
			continue
		}

		let result = parser::parse(&line).and_then(execute::dispatch);
		match result {
			Ok(()) => {}
			Err(ShErr::CleanExit(code)) => return code,
			Err(e) => {
				eprintln!("{}", e);
				// An error that escaped from between fork and exec must
				// never fall back into the loop as a second shell
				if getpid() != *SHELL_PID {
					std::process::exit(0);
				}
			}
		}
	}
}

fn main() {
	env_logger::init();
	initialize_globals();

	if let Err(e) = signal::install_handlers() {
		eprintln!("jsh: failed to install signal handlers: {}", e);
		std::process::exit(1);
	}

	let opts = parse_args();
	let termios = set_termios();

	let mut reader = match prompt::LineReader::new(opts.hist_path) {
		Ok(reader) => reader,
		Err(e) => {
			eprintln!("jsh: {}", e);
			std::process::exit(1);
		}
	};

	debug!("shell pid {} pgid {}", *SHELL_PID, *terminal::SHELL_PGID);
	let code = repl(&mut reader);

	reader.save_history();
	restore_termios(&termios);
	std::process::exit(code);
}
