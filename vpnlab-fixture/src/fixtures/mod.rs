//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod l3vpn;
pub mod ospf_vrf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::FixtureConfig;
use crate::error::Error;
use crate::lab::Lab;
use crate::runner::{CmdOutcome, CmdTally};
use crate::topology::Topogen;

pub use self::l3vpn::L3vpn;
pub use self::ospf_vrf::OspfVrf;

// Names of all available fixtures.
pub const NAMES: [&str; 2] = [L3vpn::NAME, OspfVrf::NAME];

/// Test fixture: a topology plus the hooks that prepare it.
#[async_trait]
pub trait Fixture: Send + Sync {
    fn name(&self) -> &'static str;

    // Declares the fixture's routers, switches and links.
    fn build_topo(&self, tgen: &mut dyn Topogen) -> Result<(), Error>;

    // Runs once before the emulated routers start.
    async fn pre_router_start(&self, lab: &dyn Lab) -> InitReport;

    // Runs once after the emulated routers have started.
    async fn post_router_start(&self, lab: &dyn Lab);

    // Undoes what `pre_router_start` configured.
    async fn teardown(&self, lab: &dyn Lab) -> Result<CmdTally, Error>;
}

// Result of the fixture initialization, consulted by every gated test.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum InitStatus {
    Success,
    Failed { reason: String },
    MplsUnavailable,
}

#[derive(Debug)]
pub struct InitReport {
    pub status: InitStatus,
    // Tally over the configuration commands (diagnostics excluded).
    pub tally: CmdTally,
    pub outcomes: Vec<CmdOutcome>,
}

// ===== impl InitStatus =====

impl InitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, InitStatus::Success)
    }

    // Derives the status from the outcome of the configuration commands:
    // any output at all counts as a failure.
    pub(crate) fn from_tally(tally: &CmdTally) -> InitStatus {
        match tally.output {
            0 => InitStatus::Success,
            n => InitStatus::Failed {
                reason: format!(
                    "VRF config failed ({n}), tests will be skipped"
                ),
            },
        }
    }
}

impl std::fmt::Display for InitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitStatus::Success => write!(f, "success"),
            InitStatus::Failed { reason } => write!(f, "failed: {reason}"),
            InitStatus::MplsUnavailable => write!(f, "MPLS not available"),
        }
    }
}

// ===== impl InitReport =====

impl InitReport {
    pub(crate) fn new(outcomes: Vec<CmdOutcome>) -> InitReport {
        let tally = outcomes.iter().collect::<CmdTally>();
        InitReport {
            status: InitStatus::from_tally(&tally),
            tally,
            outcomes,
        }
    }

    pub(crate) fn failed(
        outcomes: Vec<CmdOutcome>,
        error: &Error,
    ) -> InitReport {
        error.log();
        InitReport {
            status: InitStatus::Failed {
                reason: error.to_string(),
            },
            tally: outcomes.iter().collect(),
            outcomes,
        }
    }

    pub(crate) fn mpls_unavailable() -> InitReport {
        InitReport {
            status: InitStatus::MplsUnavailable,
            tally: Default::default(),
            outcomes: Vec::new(),
        }
    }
}

// ===== global functions =====

pub fn by_name(
    name: &str,
    config: &FixtureConfig,
) -> Option<Box<dyn Fixture>> {
    match name {
        L3vpn::NAME => Some(Box::new(L3vpn::new(config.clone()))),
        OspfVrf::NAME => Some(Box::new(OspfVrf::new(config.clone()))),
        _ => None,
    }
}
