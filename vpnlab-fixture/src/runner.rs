//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::command::Command;
use crate::error::ExecError;
use crate::lab::Lab;

// Result of running a single command on an emulated host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CmdOutcome {
    pub host: String,
    pub command: String,
    // Output with surrounding whitespace stripped.
    pub output: String,
    // Whether the output matched the expected pattern. `None` when no
    // pattern was given or there was no output to match against.
    pub matched: Option<bool>,
}

// Running counts over a sequence of command outcomes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct CmdTally {
    // Commands whose output matched the pattern.
    pub matched: u32,
    // Commands whose output didn't match the pattern.
    pub nomatch: u32,
    // Commands that produced any output.
    pub output: u32,
    // Commands for which no pattern was evaluated.
    pub none: u32,
}

// Runs commands on emulated hosts through a lab.
pub struct CmdRunner<'a> {
    lab: &'a dyn Lab,
}

// ===== impl CmdOutcome =====

impl CmdOutcome {
    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }
}

// ===== impl CmdTally =====

impl CmdTally {
    pub fn record(&mut self, outcome: &CmdOutcome) {
        if outcome.has_output() {
            self.output += 1;
        }
        match outcome.matched {
            Some(true) => self.matched += 1,
            Some(false) => self.nomatch += 1,
            None => self.none += 1,
        }
    }
}

impl<'a> FromIterator<&'a CmdOutcome> for CmdTally {
    fn from_iter<I: IntoIterator<Item = &'a CmdOutcome>>(iter: I) -> Self {
        let mut tally = CmdTally::default();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

// ===== impl CmdRunner =====

impl<'a> CmdRunner<'a> {
    pub fn new(lab: &'a dyn Lab) -> CmdRunner<'a> {
        CmdRunner { lab }
    }

    /// Runs `cmd` on `host`.
    ///
    /// When a pattern is given and the command printed something, the
    /// outcome records whether the output matched. Otherwise any output is
    /// logged.
    pub async fn run(
        &self,
        host: &str,
        cmd: &str,
        pattern: Option<&Regex>,
    ) -> Result<CmdOutcome, ExecError> {
        let output = self.lab.exec(host, cmd).await?.trim().to_owned();

        let mut matched = None;
        if !output.is_empty() {
            match pattern {
                Some(pattern) => matched = Some(pattern.is_match(&output)),
                None => {
                    info!(%host, %cmd, "command");
                    info!("output: {}", output);
                }
            }
        }

        Ok(CmdOutcome {
            host: host.to_owned(),
            command: cmd.to_owned(),
            output,
            matched,
        })
    }

    pub async fn run_cmd(
        &self,
        host: &str,
        cmd: &Command,
    ) -> Result<CmdOutcome, ExecError> {
        self.run(host, &cmd.to_string(), None).await
    }
}
