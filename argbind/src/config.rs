use std::borrow::Cow;
use std::path::Path;

/// Parser-wide settings. Everything here is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Program name shown in usage messages. Defaults to the file name of
    /// the running executable.
    pub program: Option<String>,

    /// Version string, printed in response to `--version`.
    pub version: Option<String>,

    /// Shown at the top of the help message. Defaults to the root record's
    /// doc comment.
    pub description: Option<String>,

    /// Shown at the bottom of the help message.
    pub epilogue: Option<String>,

    /// Prepended to every environment variable name.
    pub env_prefix: String,

    /// Skip the environment phase entirely.
    pub ignore_env: bool,

    /// Skip the defaults phase entirely.
    pub ignore_default: bool,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn program(self, program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
            ..self
        }
    }

    #[must_use]
    pub fn version(self, version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..self
        }
    }

    #[must_use]
    pub fn description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn epilogue(self, epilogue: impl Into<String>) -> Self {
        Self {
            epilogue: Some(epilogue.into()),
            ..self
        }
    }

    #[must_use]
    pub fn env_prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: prefix.into(),
            ..self
        }
    }

    #[must_use]
    pub fn ignore_env(self, ignore_env: bool) -> Self {
        Self { ignore_env, ..self }
    }

    #[must_use]
    pub fn ignore_default(self, ignore_default: bool) -> Self {
        Self {
            ignore_default,
            ..self
        }
    }

    /// The configured program name, or the file name of the running
    /// executable.
    pub fn program_name(&self) -> Cow<'_, str> {
        match self.program {
            Some(ref program) => Cow::Borrowed(program.as_str()),
            None => std::env::args_os()
                .next()
                .as_deref()
                .map(Path::new)
                .and_then(Path::file_name)
                .map(|name| Cow::Owned(name.to_string_lossy().into_owned()))
                .unwrap_or(Cow::Borrowed("program")),
        }
    }
}
