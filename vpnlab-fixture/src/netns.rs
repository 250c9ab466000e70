//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use std::process::{Output, Stdio};
use std::sync::LazyLock as Lazy;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};
use vpnlab_utils::sysctl;

use crate::error::ExecError;
use crate::lab::Lab;

static FRR_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"FRRouting ([0-9][^ \t\r\n]*)").unwrap());

/// Lab whose emulated hosts are pre-created network namespaces on the local
/// machine, one per router.
#[derive(Debug)]
pub struct NetnsLab {
    // Prepended to host names to obtain namespace names.
    prefix: String,
    has_mpls: bool,
}

// ===== impl NetnsLab =====

impl NetnsLab {
    pub fn new(prefix: &str) -> NetnsLab {
        NetnsLab {
            prefix: prefix.to_owned(),
            has_mpls: sysctl::mpls_available(),
        }
    }

    pub fn netns(&self, host: &str) -> String {
        format!("{}{}", self.prefix, host)
    }
}

#[async_trait]
impl Lab for NetnsLab {
    fn has_mpls(&self) -> bool {
        self.has_mpls
    }

    fn kernel_release(&self) -> Option<String> {
        match sysctl::kernel_release() {
            Ok(release) => Some(release),
            Err(error) => {
                warn!(%error, "failed to read kernel release");
                None
            }
        }
    }

    async fn exec(&self, host: &str, cmd: &str) -> Result<String, ExecError> {
        let netns = self.netns(host);
        debug!(%host, %netns, %cmd, "running command");

        let output = Command::new("ip")
            .args(["netns", "exec", netns.as_str(), "sh", "-c", cmd])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|error| ExecError::SpawnError(host.to_owned(), error))?;

        Ok(combined_output(&output))
    }

    async fn router_version(&self, router: &str) -> Option<String> {
        let output = self
            .exec(router, "vtysh -c 'show version'")
            .await
            .ok()?;
        let version = FRR_VERSION_RE
            .captures(&output)
            .and_then(|caps| caps.get(1))
            .map(|version| version.as_str().to_owned());
        if version.is_none() {
            debug!(%router, "unable to determine routing software version");
        }
        version
    }

    async fn debug_shell(&self) -> Result<(), ExecError> {
        let shell =
            std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_owned());
        Command::new(shell)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(ExecError::ShellError)?;
        Ok(())
    }
}

// ===== helper functions =====

fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}
