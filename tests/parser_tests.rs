use jsh::parser;

use std::path::PathBuf;

#[test]
fn test_simple_command() {
    let pipeline = parser::parse("echo Hello, world!").unwrap();

    assert_eq!(pipeline.commands.len(), 1);
    assert_eq!(pipeline.commands[0].command, "echo");
    assert_eq!(pipeline.commands[0].tokens, vec!["Hello,", "world!"]);
    assert_eq!(pipeline.input, None);
    assert_eq!(pipeline.output, None);
    assert!(!pipeline.background);
}

#[test]
fn test_pipeline_stages_keep_their_order() {
    let pipeline = parser::parse("cat notes.txt | sort | uniq -c").unwrap();

    assert_eq!(pipeline.commands.len(), 3);
    assert_eq!(pipeline.commands[0].command, "cat");
    assert_eq!(pipeline.commands[1].command, "sort");
    assert_eq!(pipeline.commands[2].command, "uniq");
    assert_eq!(pipeline.commands[2].tokens, vec!["-c"]);
}

#[test]
fn test_redirections() {
    let pipeline = parser::parse("sort < unsorted.txt > sorted.txt").unwrap();

    assert_eq!(pipeline.commands.len(), 1);
    assert_eq!(pipeline.input, Some(PathBuf::from("unsorted.txt")));
    assert_eq!(pipeline.output, Some(PathBuf::from("sorted.txt")));
}

#[test]
fn test_redirections_with_pipeline() {
    let pipeline = parser::parse("cat < in.txt | wc -w > out.txt").unwrap();

    assert_eq!(pipeline.commands.len(), 2);
    assert_eq!(pipeline.input, Some(PathBuf::from("in.txt")));
    assert_eq!(pipeline.output, Some(PathBuf::from("out.txt")));
}

#[test]
fn test_background_flag() {
    let pipeline = parser::parse("sleep 30 &").unwrap();

    assert!(pipeline.background);
    assert_eq!(pipeline.commands[0].command, "sleep");
    assert_eq!(pipeline.commands[0].tokens, vec!["30"]);
}

#[test]
fn test_background_must_be_last() {
    assert!(parser::parse("sleep & 30").is_err());
}

#[test]
fn test_double_quoted_args() {
    let pipeline = parser::parse("echo \"Hello, world!\" bye").unwrap();

    assert_eq!(pipeline.commands[0].tokens, vec!["Hello, world!", "bye"]);
}

#[test]
fn test_single_quoted_args() {
    let pipeline = parser::parse("echo 'single quoted arg'").unwrap();

    assert_eq!(pipeline.commands[0].tokens, vec!["single quoted arg"]);
}

#[test]
fn test_unterminated_quote() {
    assert!(parser::parse("echo \"oops").is_err());
}

#[test]
fn test_operators_bind_without_spaces() {
    let pipeline = parser::parse("ls|wc>count.txt").unwrap();

    assert_eq!(pipeline.commands.len(), 2);
    assert_eq!(pipeline.commands[0].command, "ls");
    assert_eq!(pipeline.commands[1].command, "wc");
    assert_eq!(pipeline.output, Some(PathBuf::from("count.txt")));
}

#[test]
fn test_missing_redirection_target() {
    assert!(parser::parse("echo hello >").is_err());
    assert!(parser::parse("wc <").is_err());
}

#[test]
fn test_missing_command_around_pipe() {
    assert!(parser::parse("| wc").is_err());
    assert!(parser::parse("ls |").is_err());
    assert!(parser::parse("ls | | wc").is_err());
}

#[test]
fn test_empty_input_is_an_error() {
    assert!(parser::parse("").is_err());
    assert!(parser::parse("   ").is_err());
}
