//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use async_trait::async_trait;

use crate::error::ExecError;

/// Runtime interface of the emulation framework, available once the
/// emulated hosts exist.
#[async_trait]
pub trait Lab: Send + Sync {
    // Whether the host supports MPLS forwarding.
    fn has_mpls(&self) -> bool;

    // Release of the running kernel, if it can be determined.
    fn kernel_release(&self) -> Option<String>;

    // Runs a shell command in the context of the given emulated host and
    // returns its combined stdout and stderr.
    async fn exec(&self, host: &str, cmd: &str) -> Result<String, ExecError>;

    // Routing software version running on the given router.
    async fn router_version(&self, router: &str) -> Option<String>;

    // Enters an interactive debug shell and returns once it exits.
    async fn debug_shell(&self) -> Result<(), ExecError>;
}
