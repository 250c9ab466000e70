//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

use sysctl::{Ctl, Sysctl, SysctlError};
use tracing::debug;

// ===== global functions =====

pub fn kernel_release() -> Result<String, SysctlError> {
    let ctl = Ctl::new("kernel.osrelease")?;
    let release = ctl.value_string()?;
    Ok(release.trim().to_owned())
}

// The MPLS platform label table only exists once the mpls_router module is
// loaded.
pub fn mpls_available() -> bool {
    match Ctl::new("net.mpls.platform_labels") {
        Ok(_) => true,
        Err(error) => {
            debug!(%error, "MPLS forwarding not supported");
            false
        }
    }
}
