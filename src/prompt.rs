use log::debug;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

use crate::prelude::*;

/// The line reader: a rustyline editor plus an optional history file it
/// loads at startup and saves on clean exit.
pub struct LineReader {
	rl: Editor<(), DefaultHistory>,
	hist_path: Option<PathBuf>,
}

impl LineReader {
	pub fn new(hist_path: Option<PathBuf>) -> ShResult<Self> {
		let config = build_editor_config()?;
		let mut rl: Editor<(), DefaultHistory> =
			Editor::with_config(config).map_err(|e| ShErr::internal(e.to_string()))?;
		if let Some(path) = &hist_path {
			if rl.load_history(path).is_err() {
				debug!("no previous history at {}", path.display());
			}
		}
		Ok(Self { rl, hist_path })
	}

	/// Prompt and read one line. Ok(None) means EOF; Ctrl-C at the prompt
	/// just redraws it.
	pub fn readline(&mut self) -> ShResult<Option<String>> {
		loop {
			match self.rl.readline("jsh> ") {
				Ok(line) => return Ok(Some(line)),
				Err(ReadlineError::Eof) => return Ok(None),
				Err(ReadlineError::Interrupted) => continue,
				Err(e) => return Err(ShErr::Io(e.to_string())),
			}
		}
	}

	pub fn save_history(&mut self) {
		if let Some(path) = &self.hist_path {
			if let Err(e) = self.rl.save_history(path) {
				eprintln!("Failed to save history: {}", e);
			}
		}
	}
}

fn build_editor_config() -> ShResult<Config> {
	let config = Config::builder()
		.max_history_size(1000)
		.map_err(|e| ShErr::internal(e.to_string()))?
		.history_ignore_dups(true)
		.map_err(|e| ShErr::internal(e.to_string()))?
		.auto_add_history(true)
		.build();
	Ok(config)
}
