// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use {std::path::PathBuf, thiserror::Error};

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum UnixPackagingError {
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("missing field 'command'")]
    MissingCommand,

    #[error("working directory must be a directory: '{0}'")]
    NotADirectory(PathBuf),

    #[error("there can only be one {0} consumer")]
    DuplicateSink(&'static str),

    #[error("unable to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("interrupted while waiting for process '{command}'")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' returned a non-zero exit code: {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },

    #[error("{0}")]
    CommandFailedMessage(String),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, UnixPackagingError>;
