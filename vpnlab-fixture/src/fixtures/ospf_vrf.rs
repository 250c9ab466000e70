//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

//! OSPF inside per-router VRF namespaces.
//!
//! Routers `r1`, `r2` and `r3` share switch `s3`; `s1`, `s2` and `s4` are
//! stub networks of `r1`, `r2` and `r3` respectively. On every router both
//! interfaces are moved into the `{router}-cust1` namespace.

use async_trait::async_trait;
use tracing::info;

use crate::command::Command;
use crate::config::FixtureConfig;
use crate::error::Error;
use crate::fixtures::{Fixture, InitReport, InitStatus};
use crate::lab::Lab;
use crate::runner::{CmdOutcome, CmdRunner, CmdTally};
use crate::topology::Topogen;
use crate::vrf::VrfMode;

const ROUTERS: [&str; 3] = ["r1", "r2", "r3"];

#[derive(Debug)]
pub struct OspfVrf {
    config: FixtureConfig,
}

// ===== impl OspfVrf =====

impl OspfVrf {
    pub const NAME: &'static str = "ospf-vrf";

    pub fn new(config: FixtureConfig) -> OspfVrf {
        OspfVrf { config }
    }

    fn vrf(router: &str) -> String {
        format!("{router}-cust1")
    }

    fn vrf_ifnames(router: &str) -> [String; 2] {
        [format!("{router}-eth0"), format!("{router}-eth1")]
    }

    pub fn setup_commands() -> Result<Vec<(String, Command)>, Error> {
        let mut cmds = vec![];
        for router in ROUTERS {
            let vrf = OspfVrf::vrf(router);
            let mut push = |cmd| cmds.push((router.to_owned(), cmd));

            // Remove leftovers from an earlier run.
            push(Command::netns_del_if_exists(&vrf)?);
            push(Command::netns_add(&vrf)?);
            for ifname in OspfVrf::vrf_ifnames(router) {
                push(Command::link_set_netns(&ifname, &vrf)?);
                push(Command::netns_exec_if_up(&vrf, &ifname)?);
            }
        }
        Ok(cmds)
    }

    pub fn teardown_commands() -> Result<Vec<(String, Command)>, Error> {
        let mut cmds = vec![];
        for router in ROUTERS {
            let vrf = OspfVrf::vrf(router);
            for ifname in OspfVrf::vrf_ifnames(router) {
                cmds.push((
                    router.to_owned(),
                    Command::netns_exec_restore(&vrf, &ifname)?,
                ));
            }
            cmds.push((router.to_owned(), Command::netns_del(&vrf)?));
        }
        Ok(cmds)
    }
}

#[async_trait]
impl Fixture for OspfVrf {
    fn name(&self) -> &'static str {
        OspfVrf::NAME
    }

    fn build_topo(&self, tgen: &mut dyn Topogen) -> Result<(), Error> {
        for router in ROUTERS {
            tgen.add_router(router)?;
        }

        // Empty network for router 1.
        tgen.add_switch("s1")?;
        tgen.add_switch_link("s1", "r1", None)?;

        // Empty network for router 2.
        tgen.add_switch("s2")?;
        tgen.add_switch_link("s2", "r2", None)?;

        // Interconnect routers 1, 2 and 3.
        tgen.add_switch("s3")?;
        for router in ROUTERS {
            tgen.add_switch_link("s3", router, None)?;
        }

        // Empty network for router 3.
        tgen.add_switch("s4")?;
        tgen.add_switch_link("s4", "r3", None)?;

        Ok(())
    }

    async fn pre_router_start(&self, lab: &dyn Lab) -> InitReport {
        info!("pre router-start hook");

        if self.config.vrf_mode != VrfMode::Netns {
            let reason = format!(
                "VRF namespace backend required (configured: {})",
                self.config.vrf_mode
            );
            info!("{}, tests will be skipped", reason);
            return InitReport {
                status: InitStatus::Failed { reason },
                tally: Default::default(),
                outcomes: Vec::new(),
            };
        }

        let runner = CmdRunner::new(lab);
        let mut outcomes: Vec<CmdOutcome> = vec![];
        let cmds = match OspfVrf::setup_commands() {
            Ok(cmds) => cmds,
            Err(error) => return InitReport::failed(outcomes, &error),
        };
        for (host, cmd) in cmds {
            match runner.run_cmd(&host, &cmd).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    return InitReport::failed(outcomes, &error.into());
                }
            }
        }

        let report = InitReport::new(outcomes);
        info!(status = %report.status, "VRF namespaces configured");
        report
    }

    async fn post_router_start(&self, _lab: &dyn Lab) {
        info!("post router-start hook");
    }

    async fn teardown(&self, lab: &dyn Lab) -> Result<CmdTally, Error> {
        let runner = CmdRunner::new(lab);
        let mut tally = CmdTally::default();
        for (host, cmd) in OspfVrf::teardown_commands()? {
            tally.record(&runner.run_cmd(&host, &cmd).await?);
        }
        Ok(tally)
    }
}
