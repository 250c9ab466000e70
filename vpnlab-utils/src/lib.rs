//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod ifname;
pub mod sysctl;
pub mod version;
