//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

//! MPLS L3VPN topology.
//!
//! ```text
//!                   |
//!              +----+----+
//!              |   ce1   |
//!              | 99.0.0.1|                              CE Router
//!              +----+----+
//!        192.168.1. | .2  ce1-eth0
//!                   | .1  r1-eth4
//!              +---------+
//!              |    r1   |
//!              | 1.1.1.1 |                              PE Router
//!              +----+----+
//!                   | .1  r1-eth0
//!                   |
//!             ~~~~~~~~~~~~~
//!           ~~     sw0     ~~
//!           ~~ 10.0.1.0/24 ~~
//!             ~~~~~~~~~~~~~
//!                   |10.0.1.0/24
//!                   |
//!                   | .2  r2-eth0
//!              +----+----+
//!              |    r2   |
//!              | 2.2.2.2 |                              P router
//!              +--+---+--+
//!     r2-eth2  .2 |   | .2  r2-eth1
//!          ______/     \______
//!         /                   \
//!   ~~~~~~~~~~~~~        ~~~~~~~~~~~~~
//! ~~     sw2     ~~    ~~     sw1     ~~
//! ~~ 10.0.3.0/24 ~~    ~~ 10.0.2.0/24 ~~
//!   ~~~~~~~~~~~~~        ~~~~~~~~~~~~~
//!         |                 /    |
//!          \      _________/     |
//!           \    /                \
//! r3-eth1 .3 |  | .3  r3-eth0      | .4 r4-eth0
//!       +----+--+---+         +----+----+
//!       |     r3    |         |    r4   | r4-eth5
//!       |  3.3.3.3  |         | 4.4.4.4 |-------+       PE Routers
//!       +-----------+         +---------+       |
//! 192.168.1.1 |r3.eth4 192.168.1.1 | r4-eth4    |192.168.2.1
//!          .2 |       ceX-eth0  .2 |            |         .2
//!       +-----+-----+         +----+-----+ +----+-----+
//!       |    ce2    |         |   ce3    | |   ce4    |
//!       | 99.0.0.2  |         | 99.0.0.3 | | 99.0.0.4 | CE Routers
//!       +-----+-----+         +----+-----+ +----+-----+
//!             |                    |            |
//! ```

use async_trait::async_trait;
use tracing::info;

use crate::command::{Command, PackageQuery};
use crate::config::FixtureConfig;
use crate::error::Error;
use crate::fixtures::{Fixture, InitReport};
use crate::lab::Lab;
use crate::runner::{CmdOutcome, CmdRunner, CmdTally};
use crate::topology::Topogen;
use crate::vrf::VrfPlan;

// P router: label switching only, no VRFs.
const P_ROUTER: &str = "r2";
const P_ROUTER_MPLS_IFNAMES: [&str; 4] = ["lo", "r2-eth0", "r2-eth1", "r2-eth2"];

// (PE router, VRF) pairs of the first customer.
const CUST1_VRFS: [(&str, &str); 3] =
    [("r1", "r1-cust1"), ("r3", "r3-cust1"), ("r4", "r4-cust1")];
const CUST1_TABLE: u32 = 10;
const CUST2_TABLE: u32 = 20;

#[derive(Debug)]
pub struct L3vpn {
    config: FixtureConfig,
}

// ===== impl L3vpn =====

impl L3vpn {
    pub const NAME: &'static str = "l3vpn";

    pub fn new(config: FixtureConfig) -> L3vpn {
        L3vpn { config }
    }

    // Customer VRFs, in configuration order.
    pub fn vrf_plans() -> Vec<VrfPlan> {
        let mut plans = CUST1_VRFS
            .iter()
            .map(|(router, vrf)| {
                VrfPlan::new(
                    router.to_string(),
                    vrf.to_string(),
                    CUST1_TABLE,
                    vec![
                        vrf.to_string(),
                        "lo".to_owned(),
                        format!("{router}-eth0"),
                        format!("{router}-eth4"),
                    ],
                    format!("{router}-eth4"),
                )
            })
            .collect::<Vec<_>>();
        plans.push(VrfPlan::new(
            "r4".to_owned(),
            "r4-cust2".to_owned(),
            CUST2_TABLE,
            vec!["r4-cust2".to_owned(), "r4-eth5".to_owned()],
            "r4-eth5".to_owned(),
        ));
        plans
    }

    // iproute2 package probes, only useful in the logs.
    pub fn diagnostic_commands() -> Vec<Command> {
        vec![
            Command::PackageInfo(PackageQuery::AptPolicy("iproute2".into())),
            Command::PackageInfo(PackageQuery::YumInfo("iproute2".into())),
            Command::PackageInfo(PackageQuery::YumInfo("iproute".into())),
        ]
    }

    // Label switching on the P router.
    pub fn core_commands() -> Result<Vec<Command>, Error> {
        P_ROUTER_MPLS_IFNAMES
            .iter()
            .map(|ifname| Command::mpls_input(ifname))
            .collect()
    }

    // Every configuration command run by the pre-start hook, in order,
    // together with the host it runs on.
    pub fn setup_commands(&self) -> Result<Vec<(String, Command)>, Error> {
        let mut cmds = L3vpn::core_commands()?
            .into_iter()
            .map(|cmd| (P_ROUTER.to_owned(), cmd))
            .collect::<Vec<_>>();
        for plan in L3vpn::vrf_plans() {
            for cmd in plan.setup_commands(self.config.vrf_mode)? {
                cmds.push((plan.router.clone(), cmd));
            }
        }
        Ok(cmds)
    }

    pub fn teardown_commands(&self) -> Result<Vec<(String, Command)>, Error> {
        let mut cmds = vec![];
        for plan in L3vpn::vrf_plans().iter().rev() {
            for cmd in plan.teardown_commands(self.config.vrf_mode)? {
                cmds.push((plan.router.clone(), cmd));
            }
        }
        Ok(cmds)
    }

    async fn configure(
        &self,
        runner: &CmdRunner<'_>,
        outcomes: &mut Vec<CmdOutcome>,
    ) -> Result<(), Error> {
        // Configure the P router MPLS interfaces.
        for cmd in L3vpn::core_commands()? {
            outcomes.push(runner.run_cmd(P_ROUTER, &cmd).await?);
        }

        // Configure the customer VRFs.
        let mode = self.config.vrf_mode;
        for plan in L3vpn::vrf_plans() {
            for cmd in plan.mpls_commands()? {
                outcomes.push(runner.run_cmd(&plan.router, &cmd).await?);
            }
            info!(
                "setup {} vrf {}, {}. enabled mpls input.",
                plan.router, plan.vrf, plan.attach_ifname
            );
            for cmd in plan.vrf_commands(mode)? {
                outcomes.push(runner.run_cmd(&plan.router, &cmd).await?);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Fixture for L3vpn {
    fn name(&self) -> &'static str {
        L3vpn::NAME
    }

    fn build_topo(&self, tgen: &mut dyn Topogen) -> Result<(), Error> {
        // Create P/PE routers.
        tgen.add_router("r1")?;
        if !tgen.has_mpls() {
            info!("MPLS not available, tests will be skipped");
            return Ok(());
        }
        for n in 2..=4 {
            tgen.add_router(&format!("r{n}"))?;
        }

        // Create CE routers.
        for n in 1..=4 {
            tgen.add_router(&format!("ce{n}"))?;
        }

        // CE/PE links.
        tgen.add_link("ce1", "r1", "ce1-eth0", "r1-eth4")?;
        tgen.add_link("ce2", "r3", "ce2-eth0", "r3-eth4")?;
        tgen.add_link("ce3", "r4", "ce3-eth0", "r4-eth4")?;
        tgen.add_link("ce4", "r4", "ce4-eth0", "r4-eth5")?;

        // Provider core.
        tgen.add_switch("sw0")?;
        tgen.add_switch_link("sw0", "r1", Some("r1-eth0"))?;
        tgen.add_switch_link("sw0", "r2", Some("r2-eth0"))?;

        tgen.add_switch("sw1")?;
        tgen.add_switch_link("sw1", "r2", Some("r2-eth1"))?;
        tgen.add_switch_link("sw1", "r3", Some("r3-eth0"))?;
        tgen.add_switch_link("sw1", "r4", Some("r4-eth0"))?;

        tgen.add_switch("sw2")?;
        tgen.add_switch_link("sw2", "r2", Some("r2-eth2"))?;
        tgen.add_switch_link("sw2", "r3", Some("r3-eth1"))?;

        Ok(())
    }

    async fn pre_router_start(&self, lab: &dyn Lab) -> InitReport {
        let kernel = lab.kernel_release().unwrap_or_else(|| "unknown".into());
        info!(%kernel, "pre router-start hook");

        if !lab.has_mpls() {
            info!("MPLS not available, skipping setup");
            return InitReport::mpls_unavailable();
        }

        let runner = CmdRunner::new(lab);

        // Collect iproute2 package info. The outcomes are left out of the
        // report.
        for cmd in L3vpn::diagnostic_commands() {
            if let Err(error) = runner.run_cmd(P_ROUTER, &cmd).await {
                error.log();
            }
        }

        let mut outcomes = vec![];
        if let Err(error) = self.configure(&runner, &mut outcomes).await {
            return InitReport::failed(outcomes, &error);
        }

        let report = InitReport::new(outcomes);
        if report.status.is_success() {
            info!(mode = %self.config.vrf_mode, "VRF config successful!");
        } else {
            info!(status = %report.status, "VRF config failed");
        }
        report
    }

    async fn post_router_start(&self, _lab: &dyn Lab) {
        info!("post router-start hook");
    }

    async fn teardown(&self, lab: &dyn Lab) -> Result<CmdTally, Error> {
        if !lab.has_mpls() {
            return Ok(CmdTally::default());
        }

        let runner = CmdRunner::new(lab);
        let mut tally = CmdTally::default();
        for (host, cmd) in self.teardown_commands()? {
            tally.record(&runner.run_cmd(&host, &cmd).await?);
        }
        Ok(tally)
    }
}
