//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;

use tracing::{debug, info, warn};
use vpnlab_utils::version::{self, CmpOp};

use crate::fixtures::InitStatus;
use crate::lab::Lab;

// Outcome of a version gate check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GateDecision {
    Proceed,
    Skip(String),
}

/// Pre-test check deciding whether a test can run on this lab.
///
/// Checks, in order: MPLS availability, fixture initialization, routing
/// software version, kernel release. The first failing check decides.
#[derive(Clone, Debug)]
pub struct VersionGate {
    version: String,
    op: CmpOp,
    router: String,
    kernel: Option<String>,
    cli: bool,
}

// ===== impl GateDecision =====

impl GateDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GateDecision::Proceed)
    }
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Proceed => write!(f, "proceed"),
            GateDecision::Skip(reason) => write!(f, "skip: {reason}"),
        }
    }
}

// ===== impl VersionGate =====

impl VersionGate {
    pub const DFLT_ROUTER: &'static str = "r1";
    pub const DFLT_KERNEL: &'static str = "4.9";

    // Tests are skipped on routers running software older than `version` or
    // on kernels older than `DFLT_KERNEL`.
    pub fn new(version: &str) -> VersionGate {
        VersionGate {
            version: version.to_owned(),
            op: CmpOp::Lt,
            router: VersionGate::DFLT_ROUTER.to_owned(),
            kernel: Some(VersionGate::DFLT_KERNEL.to_owned()),
            cli: false,
        }
    }

    pub fn op(mut self, op: CmpOp) -> VersionGate {
        self.op = op;
        self
    }

    pub fn router(mut self, router: &str) -> VersionGate {
        self.router = router.to_owned();
        self
    }

    // `None` turns the kernel release check off.
    pub fn kernel(mut self, kernel: Option<&str>) -> VersionGate {
        self.kernel = kernel.map(str::to_owned);
        self
    }

    pub fn cli(mut self, cli: bool) -> VersionGate {
        self.cli = cli;
        self
    }

    pub async fn check(
        &self,
        lab: &dyn Lab,
        status: &InitStatus,
    ) -> GateDecision {
        if !lab.has_mpls() || *status == InitStatus::MplsUnavailable {
            return GateDecision::Skip("MPLS not initialized".to_owned());
        }

        if !status.is_success() {
            return GateDecision::Skip(
                "Test not successfully initialized".to_owned(),
            );
        }

        let decision = match self.check_router(lab).await {
            GateDecision::Proceed => self.check_kernel(lab),
            skip => skip,
        };

        if self.cli {
            info!("calling debug shell");
            if let Err(error) = lab.debug_shell().await {
                error.log();
            }
            info!("exited debug shell");
        }

        decision
    }

    // An unknown or unparsable software version never skips.
    async fn check_router(&self, lab: &dyn Lab) -> GateDecision {
        let Some(actual) = lab.router_version(&self.router).await else {
            return GateDecision::Proceed;
        };

        match version::has_version(&actual, self.op, &self.version) {
            Ok(true) => {
                debug!(
                    "version check failed, version {} {}",
                    self.op, self.version
                );
                let reason = format!(
                    "Skipping tests on old version ({}{})",
                    self.op, self.version
                );
                info!("{}", reason);
                GateDecision::Skip(reason)
            }
            Ok(false) => GateDecision::Proceed,
            Err(error) => {
                debug!(router = %self.router, %error, "ignoring version check");
                GateDecision::Proceed
            }
        }
    }

    fn check_kernel(&self, lab: &dyn Lab) -> GateDecision {
        let Some(kernel) = &self.kernel else {
            return GateDecision::Proceed;
        };
        let Some(release) = lab.kernel_release() else {
            warn!("unknown kernel release, skipping kernel version check");
            return GateDecision::Proceed;
        };

        match version::version_cmp(&release, kernel) {
            Ok(Ordering::Less) => {
                let reason = format!(
                    "Skipping tests on old version ({release} < {kernel})"
                );
                info!("{}", reason);
                GateDecision::Skip(reason)
            }
            Ok(_) => GateDecision::Proceed,
            Err(error) => {
                warn!(%release, %error, "failed to compare kernel release");
                GateDecision::Proceed
            }
        }
    }
}
