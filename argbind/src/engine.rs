/*!
The resolution engine. A [`Resolver`] holds the state of one resolution pass
over a [`CommandTree`]: which arguments have been set, how deep into the
subcommands the command line has gone, and which arguments are in scope at
that depth. Each phase (command line, environment, defaults) has its own entry
point, with an overwriting companion.
*/

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use argbind_parser::{Cursor, Token};
use tracing::{debug, trace};

use crate::config::Config;
use crate::errors::{ConvertError, Error, SchemaError};
use crate::path::{self, Access};
use crate::reflect::{Record, Slot, ValueKind};
use crate::schema::{Argument, ArgumentId, Cardinality, Command, CommandId, CommandTree};

/// A compiled schema for the record type `R`. Build it once, then use it for
/// as many parses as you like.
pub struct Parser<R> {
    tree: CommandTree,
    config: Config,
    record: PhantomData<fn() -> R>,
}

impl<R> Parser<R> {
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<R: Record> Parser<R> {
    pub fn new(config: Config) -> Result<Self, SchemaError> {
        Ok(Self {
            tree: CommandTree::build(R::info(), &config)?,
            config,
            record: PhantomData,
        })
    }

    /// Start a resolution pass that writes into `dest`.
    pub fn resolver<'p, 'd>(&'p self, dest: &'d mut R) -> Resolver<'p, 'd> {
        Resolver {
            tree: &self.tree,
            config: &self.config,
            dest,
            seen: HashSet::new(),
            leaf: CommandTree::ROOT,
            in_scope: self.tree.root().arguments.clone(),
        }
    }

    /// Fill `dest` from `argv` (whose first element is the program name)
    /// and `env` (`KEY=VALUE` pairs). Nothing already set is overwritten.
    pub fn parse<A, E>(&self, dest: &mut R, argv: &[A], env: &[E]) -> Result<(), Error>
    where
        A: AsRef<str>,
        E: AsRef<str>,
    {
        self.resolver(dest).run(argv, env)
    }
}

impl<R> fmt::Debug for Parser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("tree", &self.tree)
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    CommandLine,
    Environment,
    Default,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Origin::CommandLine => "command line",
            Origin::Environment => "environment",
            Origin::Default => "default",
        })
    }
}

/// Whether a phase may replace values set before it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Preserve,
    Overwrite,
}

/// Bookkeeping for one command-line phase.
#[derive(Debug)]
struct ScanPhase {
    /// Arguments set before the phase began, which it leaves alone.
    preserved: HashSet<ArgumentId>,

    /// `separate` collections already cleared during the phase.
    appended: HashSet<ArgumentId>,
}

/// The state of a single resolution pass.
pub struct Resolver<'p, 'd> {
    tree: &'p CommandTree,
    config: &'p Config,
    dest: &'d mut dyn Record,
    seen: HashSet<ArgumentId>,
    leaf: CommandId,
    in_scope: Vec<ArgumentId>,
}

impl<'p, 'd> Resolver<'p, 'd> {
    /// The deepest command reached so far.
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> CommandId {
        self.leaf
    }

    #[inline]
    #[must_use]
    pub fn tree(&self) -> &'p CommandTree {
        self.tree
    }

    /// Every argument reachable at the current depth, in declaration
    /// order from the root down.
    #[inline]
    #[must_use]
    pub fn in_scope(&self) -> &[ArgumentId] {
        &self.in_scope
    }

    /// Has this argument received a value from any phase?
    #[inline]
    #[must_use]
    pub fn is_seen(&self, id: ArgumentId) -> bool {
        self.seen.contains(&id)
    }

    /// The dispatch names of the subcommands entered so far.
    #[must_use]
    pub fn subcommand_names(&self) -> Vec<&'p str> {
        let tree = self.tree;

        tree.lineage(self.leaf)
            .into_iter()
            .skip(1)
            .map(|id| tree.command(id).name.as_str())
            .collect()
    }

    /// Run every phase, then validate. The first element of `argv` is the
    /// program name. If the parse fails, but a `-h`, `--help`, or
    /// `--version` appeared before any `--`, the request takes priority.
    pub fn run<A, E>(&mut self, argv: &[A], env: &[E]) -> Result<(), Error>
    where
        A: AsRef<str>,
        E: AsRef<str>,
    {
        let args = argv.get(1..).unwrap_or_default();

        match self.run_phases(args, env) {
            Err(error) if !error.is_help() && !error.is_version() => {
                Err(self.builtin_request(args).unwrap_or(error))
            }
            result => result,
        }
    }

    fn run_phases<A, E>(&mut self, args: &[A], env: &[E]) -> Result<(), Error>
    where
        A: AsRef<str>,
        E: AsRef<str>,
    {
        self.process_command_line(args)?;

        if !self.config.ignore_env {
            self.process_environment(env)?;
        }

        if !self.config.ignore_default {
            self.process_defaults()?;
        }

        self.validate()
    }

    /// Scan command-line tokens (not including the program name). Arguments
    /// set before this call are left alone, though their tokens are still
    /// consumed.
    pub fn process_command_line<A: AsRef<str>>(&mut self, args: &[A]) -> Result<(), Error> {
        let tokens: Vec<&str> = args.iter().map(AsRef::<str>::as_ref).collect();
        self.scan(&tokens, Mode::Preserve)
    }

    /// Like [`process_command_line`][Self::process_command_line], but the
    /// last value given for an argument always wins.
    pub fn overwrite_with_command_line<A: AsRef<str>>(&mut self, args: &[A]) -> Result<(), Error> {
        let tokens: Vec<&str> = args.iter().map(AsRef::<str>::as_ref).collect();
        self.scan(&tokens, Mode::Overwrite)
    }

    /// Apply `KEY=VALUE` environment pairs to in-scope arguments that haven't
    /// been set yet.
    pub fn process_environment<E: AsRef<str>>(&mut self, env: &[E]) -> Result<(), Error> {
        self.environment(env, Mode::Preserve)
    }

    pub fn overwrite_with_environment<E: AsRef<str>>(&mut self, env: &[E]) -> Result<(), Error> {
        self.environment(env, Mode::Overwrite)
    }

    /// Apply declared defaults to in-scope arguments that haven't been set
    /// yet.
    pub fn process_defaults(&mut self) -> Result<(), Error> {
        self.defaults(Mode::Preserve)
    }

    pub fn overwrite_with_defaults(&mut self) -> Result<(), Error> {
        self.defaults(Mode::Overwrite)
    }

    /// Check that every required in-scope argument was set.
    pub fn validate(&self) -> Result<(), Error> {
        let tree = self.tree;

        let missing = self
            .in_scope
            .iter()
            .map(|&id| (id, tree.argument(id)))
            .find(|&(id, argument)| argument.required && !self.seen.contains(&id));

        match missing {
            None => Ok(()),
            Some((_, argument)) => Err(match argument.env {
                Some(ref env) if argument.is_env_only() => Error::RequiredEnv { env: env.clone() },
                Some(ref env) => Error::RequiredOrEnv {
                    name: argument.display_name(),
                    env: env.clone(),
                },
                None => Error::Required {
                    name: argument.display_name(),
                },
            }),
        }
    }

    fn scan(&mut self, tokens: &[&str], mode: Mode) -> Result<(), Error> {
        let mut phase = ScanPhase {
            preserved: match mode {
                Mode::Preserve => self.seen.clone(),
                Mode::Overwrite => HashSet::new(),
            },
            appended: HashSet::new(),
        };

        self.scan_within(tokens, &mut phase)
    }

    /// Scan `tokens` as part of an ongoing command-line phase. A dispatch
    /// hook re-entering the scan shares the phase of the scan that handed
    /// off to it.
    fn scan_within(&mut self, tokens: &[&str], phase: &mut ScanPhase) -> Result<(), Error> {
        let tree = self.tree;
        let mut positionals = Vec::new();
        let mut cursor = Cursor::new(tokens);

        while let Some(token) = cursor.next_token() {
            let option = match token {
                Token::Positional(text) => {
                    let subcommands = &tree.command(self.leaf).subcommands;

                    if cursor.is_positional_only() || subcommands.is_empty() {
                        positionals.push(text);
                        continue;
                    }

                    let command = tree
                        .find_subcommand(self.leaf, text)
                        .ok_or_else(|| Error::InvalidSubcommand(text.to_owned()))?;

                    self.enter(command)?;

                    if let Some(dispatch) = tree.command(command).dispatch {
                        debug!(command = text, "handing off to custom subcommand");

                        let mut continuation = Continuation {
                            resolver: self,
                            command,
                            remaining: cursor.rest(),
                            phase,
                        };

                        return (dispatch.0)(&mut continuation);
                    }

                    continue;
                }
                Token::Option(option) => option,
            };

            if option.is_help() && self.find_option(option.name).is_none() {
                return Err(Error::Help);
            }

            if option.is_version()
                && (self.config.version.is_some() || self.find_option("version").is_none())
            {
                return Err(Error::Version);
            }

            let id = self
                .find_option(option.name)
                .ok_or_else(|| Error::UnknownArgument(option.raw.to_owned()))?;
            let argument = tree.argument(id);
            let skip = phase.preserved.contains(&id);

            let mut take_value = || {
                option
                    .value
                    .or_else(|| cursor.take_value(|text| accepts_flag_like(argument, text)))
                    .ok_or_else(|| Error::MissingValue(option.raw.to_owned()))
            };

            match argument.cardinality {
                Cardinality::Zero => {
                    let value = option.value.unwrap_or("true");
                    if !skip {
                        self.assign(id, value, Origin::CommandLine)?;
                    }
                }
                Cardinality::One => {
                    let value = take_value()?;
                    if !skip {
                        self.assign(id, value, Origin::CommandLine)?;
                    }
                }
                Cardinality::Multiple if argument.separate => {
                    let value = take_value()?;
                    if !skip {
                        if phase.appended.insert(id) {
                            self.slot(id)?.clear();
                        }
                        self.append(id, value, Origin::CommandLine)?;
                    }
                }
                Cardinality::Multiple => {
                    let values: Vec<&str> = match option.value {
                        Some(value) => vec![value],
                        None => cursor.take_run().collect(),
                    };
                    if !skip {
                        self.replace(id, &values, Origin::CommandLine)?;
                    }
                }
            }

            if !skip {
                self.seen.insert(id);
            }
        }

        self.consume_positionals(&positionals, &phase.preserved)
    }

    fn consume_positionals(
        &mut self,
        tokens: &[&str],
        preserved: &HashSet<ArgumentId>,
    ) -> Result<(), Error> {
        let tree = self.tree;
        let mut remaining = tokens;

        for id in self.in_scope.clone() {
            let argument = tree.argument(id);
            if !argument.positional {
                continue;
            }

            let skip = preserved.contains(&id);

            match argument.cardinality {
                Cardinality::Multiple => {
                    if remaining.is_empty() {
                        break;
                    }
                    if !skip {
                        self.replace(id, remaining, Origin::CommandLine)?;
                    }
                    remaining = &[];
                }
                Cardinality::Zero | Cardinality::One => {
                    let Some((&first, rest)) = remaining.split_first() else {
                        break;
                    };
                    if !skip {
                        self.assign(id, first, Origin::CommandLine)?;
                    }
                    remaining = rest;
                }
            }

            if !skip {
                self.seen.insert(id);
            }
        }

        match remaining.first() {
            None => Ok(()),
            Some(&surplus) => Err(Error::TooManyPositionals(surplus.to_owned())),
        }
    }

    fn environment<E: AsRef<str>>(&mut self, env: &[E], mode: Mode) -> Result<(), Error> {
        let tree = self.tree;

        // Later pairs win, like repeated assignments in a shell.
        let vars: HashMap<&str, &str> = env
            .iter()
            .filter_map(|pair| pair.as_ref().split_once('='))
            .collect();

        for id in self.in_scope.clone() {
            let argument = tree.argument(id);

            let Some(ref name) = argument.env else {
                continue;
            };

            if mode == Mode::Preserve && self.seen.contains(&id) {
                continue;
            }

            let Some(&value) = vars.get(name.as_str()) else {
                continue;
            };

            match argument.cardinality {
                Cardinality::Multiple => {
                    let values = split_csv(name, value)?;
                    let values: Vec<&str> = values.iter().map(String::as_str).collect();
                    self.replace(id, &values, Origin::Environment)?;
                }
                Cardinality::Zero | Cardinality::One => {
                    self.assign(id, value, Origin::Environment)?;
                }
            }

            self.seen.insert(id);
        }

        Ok(())
    }

    fn defaults(&mut self, mode: Mode) -> Result<(), Error> {
        let tree = self.tree;

        for id in self.in_scope.clone() {
            let Some(default) = tree.argument(id).default else {
                continue;
            };

            if mode == Mode::Preserve && self.seen.contains(&id) {
                continue;
            }

            self.assign(id, default, Origin::Default)?;
            self.seen.insert(id);
        }

        Ok(())
    }

    /// Descend into a subcommand: allocate its record and bring its
    /// arguments into scope.
    fn enter(&mut self, id: CommandId) -> Result<(), Error> {
        let tree = self.tree;
        let command = tree.command(id);

        let path = command
            .path
            .as_ref()
            .ok_or_else(|| Error::Unreachable("the root command can't be entered".to_owned()))?;

        path::resolve_record(&mut *self.dest, path, Access::Allocate)
            .ok_or_else(|| Error::Unreachable(format!("no storage for subcommand at {path}")))?;

        debug!(command = command.name.as_str(), "entered subcommand");

        self.leaf = id;
        self.in_scope.extend_from_slice(&command.arguments);

        Ok(())
    }

    /// Find the in-scope option called `name`. Deeper subcommands shadow
    /// their ancestors.
    fn find_option(&self, name: &str) -> Option<ArgumentId> {
        let tree = self.tree;

        self.in_scope
            .iter()
            .rev()
            .copied()
            .find(|&id| tree.argument(id).matches(name))
    }

    /// A `-h`, `--help`, or `--version` before the first `--` that would be
    /// treated as a request by the scan.
    fn builtin_request<A: AsRef<str>>(&self, args: &[A]) -> Option<Error> {
        args.iter()
            .map(AsRef::<str>::as_ref)
            .take_while(|&arg| arg != "--")
            .find_map(|arg| match arg {
                "-h" | "--help" if self.find_option(arg.trim_start_matches('-')).is_none() => {
                    Some(Error::Help)
                }
                "--version"
                    if self.config.version.is_some() || self.find_option("version").is_none() =>
                {
                    Some(Error::Version)
                }
                _ => None,
            })
    }

    fn slot(&mut self, id: ArgumentId) -> Result<&mut dyn Slot, Error> {
        let tree = self.tree;
        let argument = tree.argument(id);

        path::resolve(&mut *self.dest, &argument.path, Access::Allocate)
            .ok_or_else(|| Error::Unreachable(format!("no storage for {}", argument.path)))
    }

    fn assign(&mut self, id: ArgumentId, text: &str, origin: Origin) -> Result<(), Error> {
        let tree = self.tree;
        let argument = tree.argument(id);
        trace!(argument = %argument.path, %origin, value = text, "assign");

        self.slot(id)?
            .assign(text)
            .map_err(|source| conversion_error(argument, origin, source))
    }

    fn append(&mut self, id: ArgumentId, text: &str, origin: Origin) -> Result<(), Error> {
        let tree = self.tree;
        let argument = tree.argument(id);
        trace!(argument = %argument.path, %origin, value = text, "append");

        self.slot(id)?
            .append(text)
            .map_err(|source| conversion_error(argument, origin, source))
    }

    /// Replace a collection's contents with `values`.
    fn replace(&mut self, id: ArgumentId, values: &[&str], origin: Origin) -> Result<(), Error> {
        self.slot(id)?.clear();

        values
            .iter()
            .try_for_each(|value| self.append(id, value, origin))
    }
}

impl fmt::Debug for Resolver<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("leaf", &self.leaf)
            .field("seen", &self.seen)
            .field("in_scope", &self.in_scope)
            .finish_non_exhaustive()
    }
}

/// Negative numbers look like options, but a numeric argument accepts them
/// anyway.
fn accepts_flag_like(argument: &Argument, text: &str) -> bool {
    argument
        .leaf()
        .is_some_and(|leaf| leaf.kind == ValueKind::Numeric && leaf.check(text).is_ok())
}

fn conversion_error(argument: &Argument, origin: Origin, source: ConvertError) -> Error {
    match origin {
        Origin::CommandLine => Error::Conversion {
            argument: argument.display_name(),
            source,
        },
        Origin::Environment => Error::Conversion {
            argument: format!(
                "environment variable {}",
                argument.env.as_deref().unwrap_or_default()
            ),
            source,
        },
        Origin::Default => Error::Default {
            argument: argument.display_name(),
            source,
        },
    }
}

/// Split a multi-valued environment variable as a single CSV record.
fn split_csv(name: &str, value: &str) -> Result<Vec<String>, Error> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |message: &str| Error::EnvironmentCsv {
        name: name.to_owned(),
        message: message.to_owned(),
    };

    // The reader recovers from stray quotes; they're rejected here instead.
    check_quotes(value).map_err(malformed)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(value.as_bytes());
    let mut record = csv::StringRecord::new();

    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(str::to_owned).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(err) => Err(malformed(&err.to_string())),
    }
}

/// Check the quoting of a single CSV record: quotes may only open a field,
/// a quoted field must be closed, and a closing quote must end its field.
fn check_quotes(record: &str) -> Result<(), &'static str> {
    const BARE_QUOTE: &str = "bare \" in non-quoted field";
    const BAD_QUOTE: &str = "extraneous or missing \" in quoted field";

    let mut chars = record.chars().peekable();

    loop {
        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next() {
                    None => return Err(BAD_QUOTE),
                    Some('"') => match chars.peek() {
                        Some('"') => {
                            chars.next();
                        }
                        None | Some(',') => break,
                        Some(_) => return Err(BAD_QUOTE),
                    },
                    Some(_) => {}
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                match c {
                    ',' => break,
                    '"' => return Err(BARE_QUOTE),
                    _ => {
                        chars.next();
                    }
                }
            }
        }

        match chars.next() {
            None => return Ok(()),
            Some(_) => continue,
        }
    }
}

/**
Handed to a custom subcommand's dispatch hook. The hook sees the tokens that
follow the subcommand name and decides what to do with them; it can re-enter
the standard scan with [`resolve`][Self::resolve] or
[`resolve_remaining`][Self::resolve_remaining], sharing the resolution state
of the outer pass.
*/
pub struct Continuation<'c, 'p, 'd> {
    resolver: &'c mut Resolver<'p, 'd>,
    command: CommandId,
    remaining: &'c [&'c str],
    phase: &'c mut ScanPhase,
}

impl<'c, 'p, 'd> Continuation<'c, 'p, 'd> {
    /// The subcommand being dispatched.
    #[must_use]
    pub fn command(&self) -> &'p Command {
        self.resolver.tree.command(self.command)
    }

    #[must_use]
    pub fn command_id(&self) -> CommandId {
        self.command
    }

    /// The tokens after the subcommand name.
    #[must_use]
    pub fn remaining(&self) -> &'c [&'c str] {
        self.remaining
    }

    /// The subcommand's record, which has already been allocated. Returns
    /// `None` if `T` isn't the subcommand's type.
    pub fn destination<T: Record>(&mut self) -> Option<&mut T> {
        let tree = self.resolver.tree;
        let path = tree.command(self.command).path.as_ref()?;

        path::resolve_record(&mut *self.resolver.dest, path, Access::Existing)?
            .as_any_mut()
            .downcast_mut()
    }

    /// Run the standard scan over `tokens`, as though they had followed the
    /// subcommand name.
    pub fn resolve<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<(), Error> {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::<str>::as_ref).collect();
        self.resolver.scan_within(&tokens, self.phase)
    }

    /// Run the standard scan over the remaining tokens.
    pub fn resolve_remaining(&mut self) -> Result<(), Error> {
        self.resolver.scan_within(self.remaining, self.phase)
    }

    /// The underlying resolver, for running other phases.
    pub fn resolver(&mut self) -> &mut Resolver<'p, 'd> {
        self.resolver
    }
}
