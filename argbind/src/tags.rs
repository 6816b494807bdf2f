/*!
Parser for the `#[arg(tag = "...")]` directive mini-language.

A tag is a comma-separated list of directives:

- `--name` sets the long name; a bare `--` removes it (the argument can then
  only be set from the environment).
- `-n` sets the short name, which must be exactly one character.
- `required`, `positional`, and `separate` are switches.
- `help:text` sets the help text. It consumes the rest of the tag, so the
  text may contain commas.
- `env` or `env:NAME` binds an environment variable.
- `subcommand` or `subcommand:name` makes the field a subcommand.

The whole tag `-` means "ignore this field".
*/

/// A name that is either computed from the field name or given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming<'a> {
    Derived,
    Explicit(&'a str),
}

impl<'a> Naming<'a> {
    fn new(value: Option<&'a str>) -> Self {
        match value {
            None | Some("") => Self::Derived,
            Some(name) => Self::Explicit(name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LongName<'a> {
    #[default]
    Derived,
    Disabled,
    Named(&'a str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives<'a> {
    pub long: LongName<'a>,
    pub short: Option<char>,
    pub required: bool,
    pub positional: bool,
    pub separate: bool,
    pub help: Option<&'a str>,
    pub env: Option<Naming<'a>>,
    pub subcommand: Option<Naming<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag<'a> {
    Ignore,
    Directives(Directives<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("too many hyphens in {0:?}")]
    TooManyHyphens(String),

    #[error("short names must be one character: {0:?}")]
    ShortTooLong(String),

    #[error("unrecognized tag directive {0:?}")]
    Unrecognized(String),
}

pub fn parse(tag: &str) -> Result<Tag<'_>, TagError> {
    if tag.trim() == "-" {
        return Ok(Tag::Ignore);
    }

    let mut directives = Directives::default();
    let mut remaining = tag;

    while !remaining.is_empty() {
        let trimmed = remaining.trim_start();

        if let Some(help) = trimmed.strip_prefix("help:") {
            directives.help = Some(help);
            break;
        }

        let (item, tail) = trimmed.split_once(',').unwrap_or((trimmed, ""));
        remaining = tail;

        let item = item.trim_end();
        if !item.is_empty() {
            directives.apply(item)?;
        }
    }

    Ok(Tag::Directives(directives))
}

impl<'a> Directives<'a> {
    fn apply(&mut self, item: &'a str) -> Result<(), TagError> {
        let (key, value) = match item.split_once(':') {
            Some((key, value)) => (key, Some(value)),
            None => (item, None),
        };

        if key.starts_with("---") {
            return Err(TagError::TooManyHyphens(item.to_owned()));
        }

        if let Some(long) = key.strip_prefix("--")
            && value.is_none()
        {
            self.long = match long {
                "" => LongName::Disabled,
                long => LongName::Named(long),
            };
        } else if let Some(short) = key.strip_prefix('-')
            && value.is_none()
        {
            let mut chars = short.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => self.short = Some(c),
                _ => return Err(TagError::ShortTooLong(item.to_owned())),
            }
        } else {
            match (key, value) {
                ("required", None) => self.required = true,
                ("positional", None) => self.positional = true,
                ("separate", None) => self.separate = true,
                ("env", value) => self.env = Some(Naming::new(value)),
                ("subcommand", value) => self.subcommand = Some(Naming::new(value)),
                _ => return Err(TagError::Unrecognized(item.to_owned())),
            }
        }

        Ok(())
    }
}
