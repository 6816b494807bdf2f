/*!
Usage and help text, rendered from a [`CommandTree`]. Nothing here affects
parsing; the renderer only reads the tree, the config, and the leaf command
reached by a resolution pass.

```text
Usage: prog get [--limit LIMIT] [--verbose] KEY

Positional arguments:
  KEY                    the key to look up

Options:
  --limit LIMIT          maximum results [default: 10]

Global options:
  --verbose, -v          log more

  --help, -h             display this help and exit
```
*/

use std::fmt::Display;
use std::io;

use indent_write::io::IndentWriter;
use joinery::JoinableIterator as _;
use lazy_format::lazy_format;

use crate::config::Config;
use crate::engine::Parser;
use crate::errors::Error;
use crate::schema::{Argument, Cardinality, CommandId, CommandTree};

/// Total width of the output.
const WIDTH: usize = 80;

/// Width of the left column of a two-column row, including the section
/// indent.
const COLUMN: usize = 25;

const INDENT: &str = "  ";

/// One row of a two-column listing.
struct Row {
    item: String,
    text: String,
}

fn synopsis(argument: &Argument, form: impl Display) -> impl Display {
    let placeholder = argument.placeholder.as_str();

    lazy_format!(match (argument.cardinality) {
        Cardinality::Zero => "{form}",
        Cardinality::One | Cardinality::Multiple => "{form} {placeholder}",
    })
}

/// The option forms of an argument, long first: `--name NAME, -n NAME`.
fn option_forms(argument: &Argument) -> String {
    let long = argument
        .long
        .as_deref()
        .map(|long| synopsis(argument, lazy_format!("--{long}")).to_string());
    let short = argument
        .short
        .map(|short| synopsis(argument, lazy_format!("-{short}")).to_string());

    long.into_iter().chain(short).join_with(", ").to_string()
}

fn annotated(help: Option<&str>, argument: &Argument) -> String {
    let default = argument.default.map(|default| format!("default: {default}"));
    let env = argument.env.as_deref().map(|env| format!("env: {env}"));
    let annotations: Vec<String> = default.into_iter().chain(env).collect();

    let annotations = if annotations.is_empty() {
        None
    } else {
        Some(format!("[{}]", annotations.iter().join_with(", ")))
    };

    match (help, annotations) {
        (Some(help), Some(annotations)) => format!("{help} {annotations}"),
        (Some(help), None) => help.to_owned(),
        (None, Some(annotations)) => annotations,
        (None, None) => String::new(),
    }
}

fn argument_row(item: String, argument: &Argument) -> Row {
    Row {
        item,
        text: annotated(argument.help.as_deref(), argument),
    }
}

/// Is `name` (without hyphens) taken by one of the arguments in scope at
/// `leaf`?
fn is_claimed(tree: &CommandTree, leaf: CommandId, name: &str) -> bool {
    tree.lineage(leaf)
        .into_iter()
        .flat_map(|id| tree.command(id).arguments.iter())
        .any(|&id| tree.argument(id).matches(name))
}

fn usage_line(tree: &CommandTree, config: &Config, leaf: CommandId) -> String {
    let lineage = tree.lineage(leaf);

    let mut head = format!("Usage: {}", config.program_name());
    for &id in lineage.iter().skip(1) {
        head.push(' ');
        head.push_str(&tree.command(id).name);
    }

    let arguments: Vec<&Argument> = lineage
        .iter()
        .flat_map(|&id| tree.command(id).arguments.iter())
        .map(|&id| tree.argument(id))
        .collect();

    let shorts = arguments
        .iter()
        .filter(|argument| argument.is_option() && argument.long.is_none())
        .filter_map(|argument| Some((argument, format!("-{}", argument.short?))));
    let longs = arguments
        .iter()
        .filter(|argument| argument.is_option())
        .filter_map(|argument| Some((argument, format!("--{}", argument.long.as_ref()?))));

    let mut items: Vec<String> = shorts
        .chain(longs)
        .map(|(argument, form)| {
            let synopsis = synopsis(argument, form);
            if argument.required {
                synopsis.to_string()
            } else {
                format!("[{synopsis}]")
            }
        })
        .collect();

    // Optional positionals nest: `REQ [OPT [REST [REST ...]]]`
    let mut open = 0;
    for argument in arguments.iter().filter(|argument| argument.positional) {
        let placeholder = argument.placeholder.as_str();
        let bracket = if argument.required {
            ""
        } else {
            open += 1;
            "["
        };

        items.push(match argument.cardinality {
            Cardinality::Multiple => format!("{bracket}{placeholder} [{placeholder} ...]"),
            Cardinality::Zero | Cardinality::One => format!("{bracket}{placeholder}"),
        });
    }

    if let Some(last) = items.last_mut() {
        last.push_str(&"]".repeat(open));
    }

    if !tree.command(leaf).subcommands.is_empty() {
        items.push("<command> [<args>]".to_owned());
    }

    wrap_items(head, &items)
}

/// Lay out `items` after `head`, breaking lines between items. Continuation
/// lines are indented to line up with the first item.
fn wrap_items(head: String, items: &[String]) -> String {
    let indent = head.len();
    let mut column = indent;
    let mut line = head;

    for item in items {
        if column > indent && column + 1 + item.len() > WIDTH {
            line.push('\n');
            line.extend(std::iter::repeat_n(' ', indent));
            column = indent;
        }

        line.push(' ');
        line.push_str(item);
        column += 1 + item.len();
    }

    line
}

/// Write the one-line (possibly wrapped) usage synopsis for `leaf`.
pub fn write_usage<R>(
    out: &mut (impl io::Write + ?Sized),
    parser: &Parser<R>,
    leaf: CommandId,
) -> io::Result<()> {
    writeln!(out, "{}", usage_line(parser.tree(), parser.config(), leaf))
}

/// Write the usage synopsis followed by `error: {error}`.
pub fn write_error<R>(
    out: &mut (impl io::Write + ?Sized),
    parser: &Parser<R>,
    leaf: CommandId,
    error: &Error,
) -> io::Result<()> {
    write_usage(out, parser, leaf)?;
    writeln!(out, "error: {error}")
}

/// Write the full help message for `leaf`.
pub fn write_help<R>(
    out: &mut (impl io::Write + ?Sized),
    parser: &Parser<R>,
    leaf: CommandId,
) -> io::Result<()> {
    let tree = parser.tree();
    let config = parser.config();
    let command = tree.command(leaf);

    let description = if leaf == CommandTree::ROOT {
        config.description.as_deref().or(command.help.as_deref())
    } else {
        command.help.as_deref()
    };

    if let Some(description) = description {
        writeln!(out, "{}", textwrap::fill(description, WIDTH))?;
    }

    write_usage(out, parser, leaf)?;

    let own = || command.arguments.iter().map(|&id| tree.argument(id));

    let positionals = own()
        .filter(|argument| argument.positional)
        .map(|argument| argument_row(argument.placeholder.clone(), argument));

    let mut options: Vec<Row> = own()
        .filter(|argument| argument.is_option())
        .map(|argument| argument_row(option_forms(argument), argument))
        .collect();

    let globals = tree
        .lineage(leaf)
        .into_iter()
        .filter(|&id| id != leaf)
        .flat_map(|id| tree.command(id).arguments.iter())
        .map(|&id| tree.argument(id))
        .filter(|argument| argument.is_option())
        .map(|argument| argument_row(option_forms(argument), argument));

    let env_only = own()
        .filter(|argument| argument.is_env_only())
        .filter_map(|argument| Some(argument_row(argument.env.clone()?, argument)));

    let help_forms: Vec<&str> = [("help", "--help"), ("h", "-h")]
        .into_iter()
        .filter(|&(name, _)| !is_claimed(tree, leaf, name))
        .map(|(_, form)| form)
        .collect();

    if !help_forms.is_empty() {
        options.push(Row {
            item: help_forms.iter().join_with(", ").to_string(),
            text: "display this help and exit".to_owned(),
        });
    }

    if config.version.is_some() {
        options.push(Row {
            item: "--version".to_owned(),
            text: "display version and exit".to_owned(),
        });
    }

    let subcommands = command.subcommands.iter().map(|&id| {
        let subcommand = tree.command(id);
        Row {
            item: subcommand.name.clone(),
            text: subcommand.help.clone().unwrap_or_default(),
        }
    });

    maybe_section(out, "Positional arguments", positionals, |out, row| describe(out, row))?;
    maybe_section(out, "Options", options, |out, row| describe(out, row))?;
    maybe_section(out, "Global options", globals, |out, row| describe(out, row))?;
    maybe_section(out, "Environment variables", env_only, |out, row| describe(out, row))?;
    maybe_section(out, "Commands", subcommands, |out, row| describe(out, row))?;

    if let Some(ref epilogue) = config.epilogue {
        writeln!(out, "\n{}", textwrap::fill(epilogue, WIDTH))?;
    }

    Ok(())
}

/// Write a section by writing a newline, then the `header`, then an
/// indented `body`.
fn section<O: io::Write + ?Sized, T>(
    out: &mut O,
    header: &str,
    body: impl FnOnce(IndentWriter<&mut O>) -> io::Result<T>,
) -> io::Result<T> {
    writeln!(out, "\n{header}:")?;
    body(IndentWriter::new(INDENT, out))
}

/// Write an optional section, only if the iterator is not empty.
/// Otherwise identical to `section`.
fn maybe_section<O: io::Write + ?Sized, I: IntoIterator>(
    out: &mut O,
    header: &str,
    items: I,
    body: impl Fn(&mut IndentWriter<&mut O>, I::Item) -> io::Result<()>,
) -> io::Result<()> {
    let mut items = items.into_iter();

    match items.next() {
        None => Ok(()),
        Some(first) => section(out, header, |mut out| {
            body(&mut out, first)?;
            items.try_for_each(|item| body(&mut out, item))
        }),
    }
}

/// Write a row in two columns. If the item is too wide for the left column,
/// the text starts on the next line instead.
fn describe(out: &mut (impl io::Write + ?Sized), row: Row) -> io::Result<()> {
    let Row { item, text } = row;
    write!(out, "{item}")?;

    if text.is_empty() {
        return writeln!(out);
    }

    // The section indent has already been accounted for by the writer
    let column = COLUMN - INDENT.len();
    let padding = match column.checked_sub(item.len()) {
        Some(space) if space >= 2 => space,
        _ => {
            writeln!(out)?;
            column
        }
    };

    let lines = textwrap::wrap(&text, WIDTH - COLUMN);
    let mut lines = lines.iter();

    if let Some(first) = lines.next() {
        writeln!(out, "{:padding$}{first}", "")?;
    }

    lines.try_for_each(|line| writeln!(out, "{:column$}{line}", ""))
}
