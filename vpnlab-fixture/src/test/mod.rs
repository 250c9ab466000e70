//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//


use std::path::PathBuf;
use std::sync::{LazyLock as Lazy, Once};

use itertools::Itertools;
use tracing::info;

use crate::command::Command;

static INIT: Once = Once::new();

// Environment variable that controls if the expected command transcripts
// need to be updated or verified.
static UPDATE_OUTPUTS: Lazy<bool> =
    Lazy::new(|| std::env::var("VPNLAB_UPDATE_TEST_OUTPUTS").is_ok());

// ===== helper functions =====

// Initializes tracing subscriber.
fn init_tracing() {
    tracing_subscriber::fmt::Subscriber::builder()
        .with_target(false)
        .with_ansi(false)
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("starting");
}

fn transcript_path(case: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/conformance")
        .join(case)
        .join("commands.txt")
}

// ===== global functions =====

// Common initialization required by all tests.
pub fn setup() {
    INIT.call_once(|| {
        init_tracing();
    });
}

// Renders a command list as a transcript, one `host: command` line per
// command.
pub fn transcript<'a>(
    cmds: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    cmds.into_iter()
        .map(|(host, cmd)| format!("{host}: {cmd}\n"))
        .join("")
}

pub fn command_transcript(cmds: &[(String, Command)]) -> String {
    let rendered = cmds
        .iter()
        .map(|(host, cmd)| (host.as_str(), cmd.to_string()))
        .collect::<Vec<_>>();
    transcript(rendered.iter().map(|(host, cmd)| (*host, cmd.as_str())))
}

// Compares a transcript against the expected one stored for `case`, or
// stores it when VPNLAB_UPDATE_TEST_OUTPUTS is set.
pub fn check_transcript(case: &str, actual: &str) {
    let path = transcript_path(case);
    if *UPDATE_OUTPUTS {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&path, actual).unwrap();
        return;
    }

    let expected = std::fs::read_to_string(&path).unwrap_or_else(|error| {
        panic!("failed to read {}: {}", path.display(), error)
    });
    assert_eq!(expected, actual, "transcript mismatch for {case}");
}
