//! src/config.rs
//!
//! Defines the strongly-typed `Config` struct for all runtime parameters,
//! loaded from a config file and environment variables via `figment`. The
//! two positional CLI arguments (`host`, `port`) are layered on top by
//! `cli::resolve_bind_addr`, since they are not the kind of thing you'd put
//! in a config file.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Top-level struct holding all tunable protocol parameters, matching the
/// documented defaults exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Discovery multicast group address.
    pub multicast_group: Ipv4Addr,
    /// Discovery multicast port.
    pub multicast_port: u16,
    /// Period between HELLO multicasts.
    pub hello_period_ms: u64,
    /// Whether triggered unicast GOSSIP is enabled.
    pub gossip_enabled: bool,
    /// Entries in a GOSSIP digest older than this are dropped on merge.
    pub gossip_staleness_ms: u64,
    /// Cleaner loop period (gossip mode only).
    pub cleaner_period_ms: u64,
    /// Membership entries not refreshed within this window are pruned by
    /// the cleaner (gossip mode only).
    pub cleaner_threshold_ms: u64,
    /// Initial delay before the first matchmaking round.
    pub matchmaking_initial_delay_ms: u64,
    /// Period between matchmaking rounds.
    pub matchmaking_period_ms: u64,
    /// Period between opponent liveness probes.
    pub liveness_period_ms: u64,
    /// Bound on how long an accepted `proposeMatch` may wait for the
    /// matching `confirmMatch` before the tentative opponent assignment is
    /// reverted, so a stuck acceptor doesn't wait forever for a proposer
    /// that never confirms.
    pub propose_confirm_timeout_ms: u64,
}

impl Config {
    /// Loads configuration from `config.toml` and environment variables,
    /// layered on top of the documented defaults.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("TACTOE_"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multicast_group: Ipv4Addr::new(239, 0, 0, 1),
            multicast_port: 50000,
            hello_period_ms: 2000,
            gossip_enabled: true,
            gossip_staleness_ms: 15000,
            cleaner_period_ms: 5000,
            cleaner_threshold_ms: 60000,
            matchmaking_initial_delay_ms: 1000,
            matchmaking_period_ms: 1500,
            liveness_period_ms: 2000,
            propose_confirm_timeout_ms: 5000,
        }
    }
}
