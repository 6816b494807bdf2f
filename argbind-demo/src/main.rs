mod error;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;
use argbind::{Config, Continuation, Record, Value, is_flag};
use lazy_format::lazy_format;
use tracing::{debug, info};

use crate::error::{ExecError, StoreError};

#[derive(Value, Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Format {
    #[default]
    Text,
    Json,
}

/// Options shared by every subcommand.
#[derive(Record, Debug, Default)]
struct Common {
    /// Print more about what's going on.
    #[arg(tag = "-v,--verbose")]
    pub verbose: bool,

    #[arg(tag = "--format,env", default = "text", help = "output format (text or json)")]
    pub format: Format,
}

/// Look up one key.
#[derive(Record, Debug, Default)]
struct Get {
    /// The key to look up.
    #[arg(tag = "positional,required")]
    pub key: String,

    /// Print this instead of failing when the key is absent.
    #[arg(placeholder = "VALUE")]
    pub fallback: Option<String>,
}

/// List keys.
#[derive(Record, Debug, Default)]
struct List {
    /// Only show keys starting with this.
    #[arg(tag = "-p,--prefix")]
    pub prefix: Option<String>,

    /// Skip these keys; may be given more than once.
    #[arg(tag = "--skip,separate")]
    pub skip: Vec<String>,

    #[arg(tag = "--limit,help:stop after this many keys", default = "100")]
    pub limit: usize,
}

/// Run a program with the store's contents in its environment.
#[derive(Record, Debug, Default)]
#[arg(dispatch = exec_dispatch)]
struct Exec {
    /// Print the command instead of running it.
    #[arg(tag = "--dry-run")]
    pub dry_run: bool,

    #[arg(tag = "-")]
    pub command: Vec<String>,
}

/// Options up to the program name belong to `exec`; everything from the
/// program name onward is passed through untouched.
fn exec_dispatch(continuation: &mut Continuation<'_, '_, '_>) -> Result<(), argbind::Error> {
    let remaining = continuation.remaining();
    let split = remaining
        .iter()
        .position(|token| !is_flag(token))
        .unwrap_or(remaining.len());
    let (options, command) = remaining.split_at(split);

    continuation.resolve(options)?;

    let dest = continuation
        .destination::<Exec>()
        .ok_or_else(|| argbind::Error::custom("exec has no destination"))?;
    dest.command = command.iter().map(|&token| token.to_owned()).collect();

    Ok(())
}

/// A tiny key-value store, to show off argbind.
#[derive(Record, Debug, Default)]
struct Args {
    #[arg(embed)]
    common: Common,

    /// The store file, one key=value pair per line.
    #[arg(tag = "-s,--store,env", default = "store.txt", placeholder = "FILE")]
    pub store: PathBuf,

    #[arg(tag = "subcommand")]
    pub get: Option<Box<Get>>,

    #[arg(tag = "subcommand:ls")]
    pub list: Option<Box<List>>,

    #[arg(tag = "subcommand")]
    pub exec: Option<Box<Exec>>,
}

fn load(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|error| StoreError::Read {
        path: path.to_owned(),
        error,
    })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.split_once('=')
                .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
                .ok_or(StoreError::Malformed { line: index + 1 })
        })
        .collect()
}

fn get(store: &BTreeMap<String, String>, format: Format, get: &Get) -> anyhow::Result<()> {
    let value = match (store.get(&get.key), &get.fallback) {
        (Some(value), _) | (None, Some(value)) => value,
        (None, None) => return Err(StoreError::Missing(get.key.clone()).into()),
    };

    match format {
        Format::Text => println!("{value}"),
        Format::Json => println!("{{{:?}: {value:?}}}", get.key),
    }

    Ok(())
}

fn list(store: &BTreeMap<String, String>, format: Format, list: &List) {
    let keys = store
        .keys()
        .filter(|key| {
            list.prefix
                .as_deref()
                .is_none_or(|prefix| key.starts_with(prefix))
        })
        .filter(|key| !list.skip.contains(key))
        .take(list.limit);

    for key in keys {
        match format {
            Format::Text => println!("{key}"),
            Format::Json => println!("{}", lazy_format!("{key:?}")),
        }
    }
}

fn exec(store: &BTreeMap<String, String>, exec: &Exec) -> anyhow::Result<()> {
    let (program, args) = exec.command.split_first().ok_or(ExecError::NoProgram)?;

    if exec.dry_run {
        let line: Vec<String> = store
            .iter()
            .map(|(key, value)| lazy_format!("{key}={value}").to_string())
            .chain(exec.command.iter().cloned())
            .collect();

        println!("{}", line.join(" "));
        return Ok(());
    }

    let status = Command::new(program)
        .args(args)
        .envs(store)
        .status()
        .map_err(|error| ExecError::Spawn {
            program: program.clone(),
            error,
        })?;

    info!(%status, "program exited");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Args = argbind::must_parse(
        Config::new()
            .version(env!("CARGO_PKG_VERSION"))
            .env_prefix("KV_")
            .epilogue("Set RUST_LOG=debug to see how the arguments were resolved."),
    );

    debug!(?args, "parsed arguments");

    let store = load(&args.store).with_context(|| {
        format!("couldn't load the store from {}", args.store.display())
    })?;

    if args.common.verbose {
        eprintln!("loaded {} keys from {}", store.len(), args.store.display());
    }

    let format = args.common.format;

    match (args.get, args.list, args.exec) {
        (Some(command), _, _) => get(&store, format, &command),
        (_, Some(command), _) => {
            list(&store, format, &command);
            Ok(())
        }
        (_, _, Some(command)) => exec(&store, &command),
        (None, None, None) => {
            list(&store, format, &List {
                limit: usize::MAX,
                ..List::default()
            });
            Ok(())
        }
    }
}
