use argbind::{Config, Parser, Record, report};
use expect_test::{Expect, expect};

use crate::NO_ENV;

#[derive(Record, Default, Debug)]
struct List {
    #[arg(tag = "--limit", default = "10")]
    pub limit: u32,
}

/// Manage a thing.
#[derive(Record, Default, Debug)]
struct Tool {
    #[arg(tag = "-v,--verbose")]
    pub verbose: bool,

    #[arg(tag = "subcommand:ls")]
    pub list: Option<List>,
}

struct Outcome {
    status: Result<(), i32>,
    stdout: String,
    stderr: String,
}

fn run(config: Config, args: &[&str]) -> Outcome {
    let parser = Parser::<Tool>::new(config).unwrap();
    let argv: Vec<&str> = std::iter::once("tool").chain(args.iter().copied()).collect();

    let mut tool = Tool::default();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let status = report(&parser, &mut tool, &argv, NO_ENV, &mut stdout, &mut stderr);

    Outcome {
        status,
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

fn tool_config() -> Config {
    Config::new().program("tool").version("1.0")
}

#[test]
fn success_writes_nothing() {
    let outcome = run(tool_config(), &["-v", "ls"]);

    assert_eq!(outcome.status, Ok(()));
    assert_eq!(outcome.stdout, "");
    assert_eq!(outcome.stderr, "");
}

fn check_stdout(args: &[&str], expect: Expect) {
    let outcome = run(tool_config(), args);

    assert_eq!(outcome.status, Err(0));
    assert_eq!(outcome.stderr, "");
    expect.assert_eq(&outcome.stdout);
}

#[test]
fn help_goes_to_stdout() {
    check_stdout(
        &["--help"],
        expect![[r#"
            Manage a thing.
            Usage: tool [--verbose] <command> [<args>]

            Options:
              --verbose, -v
              --help, -h             display this help and exit
              --version              display version and exit

            Commands:
              ls
        "#]],
    );
}

#[test]
fn help_describes_the_deepest_subcommand() {
    check_stdout(
        &["ls", "--help"],
        expect![[r#"
            Usage: tool ls [--verbose] [--limit LIMIT]

            Options:
              --limit LIMIT          [default: 10]
              --help, -h             display this help and exit
              --version              display version and exit

            Global options:
              --verbose, -v
        "#]],
    );
}

#[test]
fn help_wins_over_errors() {
    let outcome = run(tool_config(), &["--bogus", "-h"]);

    assert_eq!(outcome.status, Err(0));
    assert!(outcome.stdout.starts_with("Manage a thing.\n"));
    assert_eq!(outcome.stderr, "");
}

#[test]
fn version() {
    check_stdout(&["--version"], expect!["1.0\n"]);

    let outcome = run(Config::new().program("tool"), &["--version"]);
    assert_eq!(outcome.status, Err(0));
    assert_eq!(outcome.stdout, "tool\n");
}

#[test]
fn errors_go_to_stderr() {
    let outcome = run(tool_config(), &["--bogus"]);

    assert_eq!(outcome.status, Err(2));
    assert_eq!(outcome.stdout, "");
    expect![[r#"
        Usage: tool [--verbose] <command> [<args>]
        error: unknown argument --bogus
    "#]]
    .assert_eq(&outcome.stderr);
}

#[test]
fn errors_show_the_usage_of_the_subcommand_reached() {
    let outcome = run(tool_config(), &["ls", "--limit", "many"]);

    assert_eq!(outcome.status, Err(2));
    expect![[r#"
        Usage: tool ls [--verbose] [--limit LIMIT]
        error: error processing --limit: invalid value "many": invalid digit found in string
    "#]]
    .assert_eq(&outcome.stderr);
}
