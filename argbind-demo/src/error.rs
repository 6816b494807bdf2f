use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read the store at {path:?}")]
    Read {
        path: PathBuf,

        #[source]
        error: io::Error,
    },

    #[error("line {line} of the store isn't a key=value pair")]
    Malformed { line: usize },

    #[error("no such key: {0:?}")]
    Missing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("exec needs a program to run")]
    NoProgram,

    #[error("failed to run {program:?}")]
    Spawn {
        program: String,

        #[source]
        error: io::Error,
    },
}
