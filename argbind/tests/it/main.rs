mod environment;
mod exit;
mod schema;
mod subcommands;
mod usage;

use std::fmt;

use argbind::{Config, Error, Parser, Record};
use expect_test::Expect;

pub const NO_ENV: &[&str] = &[];

pub fn config() -> Config {
    Config::new().program("prog")
}

/// Parse `args` (split on whitespace, not including the program name) into a
/// fresh `R`.
pub fn parse_with<R: Record + Default>(config: Config, args: &str, env: &[&str]) -> Result<R, Error> {
    let parser = Parser::<R>::new(config).expect("schema should be valid");
    let argv: Vec<&str> = std::iter::once("prog")
        .chain(args.split_ascii_whitespace())
        .collect();

    let mut dest = R::default();
    parser.parse(&mut dest, &argv, env).map(|()| dest)
}

pub fn parse<R: Record + Default>(args: &str) -> Result<R, Error> {
    parse_with(config(), args, NO_ENV)
}

pub fn parse_env<R: Record + Default>(args: &str, env: &[&str]) -> Result<R, Error> {
    parse_with(config(), args, env)
}

/// Check the outcome of a parse: the pretty-printed value on success, or the
/// error message on failure.
pub fn check<R: Record + Default + fmt::Debug>(args: &str, expect: Expect) {
    match parse::<R>(args) {
        Ok(value) => expect.assert_debug_eq(&value),
        Err(err) => expect.assert_eq(&err.to_string()),
    }
}
