use log::trace;

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::error::{ShErr, ShResult};

/// One stage of a pipeline: a command name plus its argument tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
	pub command: String,
	pub tokens: Vec<String>,
}

impl Command {
	pub fn argv(&self) -> Vec<String> {
		let mut argv = Vec::with_capacity(self.tokens.len() + 1);
		argv.push(self.command.clone());
		argv.extend(self.tokens.iter().cloned());
		argv
	}
}

impl std::fmt::Display for Command {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.argv().join(" "))
	}
}

/// What one input line parses into: commands wired stdout-to-stdin in order,
/// optional file redirections at the ends, and a background flag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
	pub commands: Vec<Command>,
	pub input: Option<PathBuf>,
	pub output: Option<PathBuf>,
	pub background: bool,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
	Word(String),
	Pipe,
	RedirectIn,
	RedirectOut,
	Background,
}

fn build_word(chars: &mut VecDeque<char>) -> ShResult<String> {
	let mut singlequote = false;
	let mut doublequote = false;
	let mut word = String::new();

	while let Some(&c) = chars.front() {
		match c {
			'"' if !singlequote => {
				doublequote = !doublequote;
				chars.pop_front();
			}
			'\'' if !doublequote => {
				singlequote = !singlequote;
				chars.pop_front();
			}
			' ' | '\t' | '|' | '<' | '>' | '&' if !singlequote && !doublequote => break,
			_ => {
				word.push(c);
				chars.pop_front();
			}
		}
	}
	if singlequote || doublequote {
		return Err(ShErr::Parse("unterminated quote".into()))
	}
	Ok(word)
}

fn tokenize(line: &str) -> ShResult<VecDeque<Token>> {
	let mut chars = line.chars().collect::<VecDeque<char>>();
	let mut tokens = VecDeque::new();

	while let Some(&c) = chars.front() {
		match c {
			' ' | '\t' => {
				chars.pop_front();
			}
			'|' => {
				chars.pop_front();
				tokens.push_back(Token::Pipe);
			}
			'<' => {
				chars.pop_front();
				tokens.push_back(Token::RedirectIn);
			}
			'>' => {
				chars.pop_front();
				tokens.push_back(Token::RedirectOut);
			}
			'&' => {
				chars.pop_front();
				tokens.push_back(Token::Background);
			}
			_ => {
				let word = build_word(&mut chars)?;
				tokens.push_back(Token::Word(word));
			}
		}
	}
	trace!("tokenized line into: {:?}", tokens);
	Ok(tokens)
}

/// Turn one line of input into a `Pipeline`.
pub fn parse(line: &str) -> ShResult<Pipeline> {
	let mut tokens = tokenize(line)?;
	let mut pipeline = Pipeline::default();
	let mut words: Vec<String> = vec![];

	fn commit(words: &mut Vec<String>, pipeline: &mut Pipeline) -> ShResult<()> {
		if words.is_empty() {
			return Err(ShErr::Parse("expected a command".into()))
		}
		let mut tokens = std::mem::take(words);
		let command = tokens.remove(0);
		pipeline.commands.push(Command { command, tokens });
		Ok(())
	}

	while let Some(token) = tokens.pop_front() {
		match token {
			Token::Word(word) => words.push(word),
			Token::Pipe => commit(&mut words, &mut pipeline)?,
			Token::RedirectIn => {
				let Some(Token::Word(path)) = tokens.pop_front() else {
					return Err(ShErr::Parse("expected a path after `<`".into()))
				};
				if pipeline.input.is_some() {
					return Err(ShErr::Parse("more than one input redirection".into()))
				}
				pipeline.input = Some(PathBuf::from(path));
			}
			Token::RedirectOut => {
				let Some(Token::Word(path)) = tokens.pop_front() else {
					return Err(ShErr::Parse("expected a path after `>`".into()))
				};
				if pipeline.output.is_some() {
					return Err(ShErr::Parse("more than one output redirection".into()))
				}
				pipeline.output = Some(PathBuf::from(path));
			}
			Token::Background => {
				if !tokens.is_empty() {
					return Err(ShErr::Parse("`&` must be the last token on the line".into()))
				}
				pipeline.background = true;
			}
		}
	}
	commit(&mut words, &mut pipeline)?;
	Ok(pipeline)
}
