/*!
Process glue: turning the outcome of a parse into output and an exit status.
[`report`] takes its streams as arguments, so it can be exercised with
in-memory buffers; [`must_parse`] wires it up to the real process.
*/

use std::ffi::OsString;
use std::io::{self, Write};

use tracing::warn;

use crate::config::Config;
use crate::engine::Parser;
use crate::reflect::Record;
use crate::usage;

/// Exit status for a help or version request.
const SUCCESS: i32 = 0;

/// Exit status for any parse or schema failure.
const USAGE: i32 = 2;

fn check_write(result: io::Result<()>) {
    if let Err(err) = result {
        warn!(error = %err, "failed to write to output stream");
    }
}

/**
Parse into `dest` and report the outcome. On success, returns `Ok(())` having
written nothing. Otherwise, returns the exit status the process should use:

- `--help`: the help message for the deepest subcommand reached goes to
  `stdout`; status 0.
- `--version`: the configured version (or, without one, the program name)
  goes to `stdout`; status 0.
- Any failure: the usage line and the error go to `stderr`; status 2.
*/
pub fn report<R, A, E>(
    parser: &Parser<R>,
    dest: &mut R,
    argv: &[A],
    env: &[E],
    stdout: &mut (impl Write + ?Sized),
    stderr: &mut (impl Write + ?Sized),
) -> Result<(), i32>
where
    R: Record,
    A: AsRef<str>,
    E: AsRef<str>,
{
    let mut resolver = parser.resolver(dest);
    let result = resolver.run(argv, env);
    let leaf = resolver.leaf();

    match result {
        Ok(()) => Ok(()),
        Err(error) if error.is_help() => {
            check_write(usage::write_help(stdout, parser, leaf));
            Err(SUCCESS)
        }
        Err(error) if error.is_version() => {
            let config = parser.config();
            check_write(match config.version {
                Some(ref version) => writeln!(stdout, "{version}"),
                None => writeln!(stdout, "{}", config.program_name()),
            });
            Err(SUCCESS)
        }
        Err(error) => {
            check_write(usage::write_error(stderr, parser, leaf, &error));
            Err(USAGE)
        }
    }
}

/// Arguments that aren't valid unicode can't be bound; they're converted
/// lossily, so that conversion errors show what was received.
fn lossy(values: impl Iterator<Item = OsString>) -> Vec<String> {
    values
        .map(|value| value.to_string_lossy().into_owned())
        .collect()
}

/**
Parse the process's own command line and environment into a new `R`, or
exit. Help and version requests exit with status 0; every failure, including
a problem with the declaration of `R` itself, exits with status 2.
*/
pub fn must_parse<R: Record + Default>(config: Config) -> R {
    let parser = match Parser::<R>::new(config) {
        Ok(parser) => parser,
        Err(error) => {
            check_write(writeln!(io::stderr(), "error: {error}"));
            std::process::exit(USAGE);
        }
    };

    let argv = lossy(std::env::args_os());
    let env = lossy(std::env::vars_os().map(|(key, value)| {
        let mut pair = key;
        pair.push("=");
        pair.push(value);
        pair
    }));

    let mut dest = R::default();

    match report(
        &parser,
        &mut dest,
        &argv,
        &env,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    ) {
        Ok(()) => dest,
        Err(code) => std::process::exit(code),
    }
}
