use core::fmt;

/**
A single command-line token, classified.

Given `--target foo --path=bar input.txt`, the cursor produces the option
`target`, then (only if the engine asks for it) the value `foo`, then the
option `path` with the inline value `bar`, then the positional `input.txt`.
*/
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Token<'t> {
    /// Anything that doesn't look like an option, or anything at all after
    /// a `--`.
    Positional(&'t str),

    /// Something like `-v`, `--verbose`, or `--level=3`.
    Option(OptionToken<'t>),
}

/// An option token, split into its parts.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OptionToken<'t> {
    /// The token exactly as it appeared, for use in error messages.
    pub raw: &'t str,

    /// The option name with every leading hyphen removed. Long and short
    /// names are matched against this same string.
    pub name: &'t str,

    /// The inline value from `--name=value`. `--name=` gives `Some("")`.
    pub value: Option<&'t str>,
}

impl<'t> OptionToken<'t> {
    /// Split an option token. The caller must have already checked
    /// [`is_flag`].
    pub fn split(raw: &'t str) -> Self {
        let stripped = raw.trim_start_matches('-');

        match split_once(stripped, b'=') {
            Some((name, value)) => Self {
                raw,
                name,
                value: Some(value),
            },
            None => Self {
                raw,
                name: stripped,
                value: None,
            },
        }
    }

    /// True if this was a literal `-h` or `--help`.
    #[inline]
    pub fn is_help(&self) -> bool {
        matches!(self.raw, "-h" | "--help")
    }

    /// True if this was a literal `--version`.
    #[inline]
    pub fn is_version(&self) -> bool {
        self.raw == "--version"
    }
}

impl fmt::Debug for OptionToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.raw)
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Token::Positional(text) => write!(f, "Positional({text:?})"),
            Token::Option(option) => write!(f, "Option({option:?})"),
        }
    }
}

/**
Does this token look like an option? It must start with `-` and contain
something other than hyphens, so `-` and `---` are both positionals. The
exact `--` is handled separately by the [`Cursor`][crate::Cursor].
*/
#[inline]
pub fn is_flag(token: &str) -> bool {
    token.starts_with('-') && !token.trim_start_matches('-').is_empty()
}

fn split_once(input: &str, delimiter: u8) -> Option<(&str, &str)> {
    // The delimiter is ASCII, so both halves are on char boundaries
    memchr::memchr(delimiter, input.as_bytes()).map(|i| (&input[..i], &input[i + 1..]))
}
