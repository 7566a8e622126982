// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod builder;
pub mod config;
pub mod constants;
pub mod error;
pub mod juju;
pub mod process;

#[cfg(test)]
mod test_utils;
