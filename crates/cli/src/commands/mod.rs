//! CLI subcommands

pub mod datacenters;
pub mod distance;
pub mod recommend;
