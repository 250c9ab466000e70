//
// Copyright (c) The vpnlab Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod command;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod gate;
pub mod lab;
pub mod netns;
pub mod runner;
#[cfg(feature = "testing")]
pub mod test;
pub mod topology;
pub mod vrf;

pub use crate::error::{Error, ExecError};
