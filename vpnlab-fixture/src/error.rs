//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{warn, warn_span};

// Fixture errors.
#[derive(Debug)]
pub enum Error {
    // I/O errors
    ExecError(ExecError),

    // topology errors
    DuplicateNode(String),
    UnknownNode(String),
    UnknownSwitch(String),
    DuplicateInterface(String, String),

    // command errors
    InvalidName(String),
}

// Command execution errors.
#[derive(Debug)]
pub enum ExecError {
    SpawnError(String, std::io::Error),
    ShellError(std::io::Error),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::ExecError(error) => {
                error.log();
            }
            Error::DuplicateNode(name)
            | Error::UnknownNode(name)
            | Error::UnknownSwitch(name) => {
                warn_span!("topology").in_scope(|| {
                    warn!(%name, "{}", self);
                });
            }
            Error::DuplicateInterface(node, ifname) => {
                warn_span!("topology").in_scope(|| {
                    warn!(%node, %ifname, "{}", self);
                });
            }
            Error::InvalidName(name) => {
                warn!(%name, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ExecError(error) => write!(f, "{error}"),
            Error::DuplicateNode(name) => {
                write!(f, "node already declared: {name}")
            }
            Error::UnknownNode(name) => {
                write!(f, "unknown router: {name}")
            }
            Error::UnknownSwitch(name) => {
                write!(f, "unknown switch: {name}")
            }
            Error::DuplicateInterface(node, ifname) => {
                write!(f, "interface {ifname} already in use on {node}")
            }
            Error::InvalidName(name) => {
                write!(f, "invalid interface or VRF name: {name:?}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ExecError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ExecError> for Error {
    fn from(error: ExecError) -> Error {
        Error::ExecError(error)
    }
}

// ===== impl ExecError =====

impl ExecError {
    pub fn log(&self) {
        match self {
            ExecError::SpawnError(host, error) => {
                warn!(%host, error = %with_source(error), "{}", self);
            }
            ExecError::ShellError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecError::SpawnError(host, ..) => {
                write!(f, "failed to run command on {host}")
            }
            ExecError::ShellError(..) => {
                write!(f, "failed to start debug shell")
            }
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::SpawnError(_, error) | ExecError::ShellError(error) => {
                Some(error)
            }
        }
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
