/*!
Error types. Schema errors come out of [`Parser::new`][crate::Parser::new];
everything else comes out of a parse.
*/

use core::fmt::{self, Display};

use joinery::JoinableIterator as _;

use crate::tags::TagError;

/// The scalar converter rejected a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {text:?}: {message}")]
pub struct ConvertError {
    pub text: String,
    pub message: String,
}

impl ConvertError {
    pub fn new(text: &str, message: impl Display) -> Self {
        Self {
            text: text.to_owned(),
            message: message.to_string(),
        }
    }
}

/// A field in a record type, for error messages: `Record.field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    pub record: &'static str,
    pub field: &'static str,
}

impl Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.record, self.field)
    }
}

/// One defect in a record type graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaProblem {
    #[error("{location}: {error}")]
    Tag {
        location: FieldLocation,
        error: TagError,
    },

    #[error("{location}: fields of type {type_name} are not supported")]
    Unsupported {
        location: FieldLocation,
        type_name: &'static str,
    },

    #[error("{location}: subcommands must be an optional struct, not {type_name}")]
    SubcommandTarget {
        location: FieldLocation,
        type_name: &'static str,
    },

    #[error("{location}: struct fields must be marked `subcommand` or `embed`")]
    NestedRecord { location: FieldLocation },

    #[error("{location}: only struct fields can be embedded")]
    EmbedTarget { location: FieldLocation },

    #[error("{location}: 'required' cannot be used with a default value")]
    RequiredWithDefault { location: FieldLocation },

    #[error("{location}: repeated fields cannot have a default value")]
    MultipleWithDefault { location: FieldLocation },

    #[error("{location}: invalid default value: {source}")]
    InvalidDefault {
        location: FieldLocation,
        source: ConvertError,
    },

    #[error("{command}: duplicate option name {name}")]
    DuplicateName { command: String, name: String },

    #[error("{command}: cannot have both subcommands and positional arguments")]
    PositionalsAndSubcommands { command: String },
}

/// Every problem found while building a schema, reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub problems: Vec<SchemaProblem>,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.problems.iter().join_with("\n"))
    }
}

impl std::error::Error for SchemaError {}

/// A failed parse, or a request for help or version output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("help requested by user")]
    Help,

    #[error("version requested by user")]
    Version,

    #[error("invalid subcommand: {0}")]
    InvalidSubcommand(String),

    #[error("unknown argument {0}")]
    UnknownArgument(String),

    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("too many positional arguments at '{0}'")]
    TooManyPositionals(String),

    #[error("error processing {argument}: {source}")]
    Conversion {
        argument: String,
        #[source]
        source: ConvertError,
    },

    #[error("error reading a CSV string from environment variable {name} with multiple values: {message}")]
    EnvironmentCsv { name: String, message: String },

    #[error("error processing default value for {argument}: {source}")]
    Default {
        argument: String,
        #[source]
        source: ConvertError,
    },

    #[error("{name} is required")]
    Required { name: String },

    #[error("{name} is required (or environment variable {env})")]
    RequiredOrEnv { name: String, env: String },

    #[error("environment variable {env} is required")]
    RequiredEnv { env: String },

    /// The destination graph didn't have storage where the schema said it
    /// would. Indicates a broken [`Record`][crate::Record] implementation.
    #[error("internal error: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom(message: impl Display) -> Self {
        Self::Custom(message.to_string())
    }

    #[inline]
    #[must_use]
    pub fn is_help(&self) -> bool {
        matches!(self, Self::Help)
    }

    #[inline]
    #[must_use]
    pub fn is_version(&self) -> bool {
        matches!(self, Self::Version)
    }
}
