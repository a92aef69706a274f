//! tests/integration/mod.rs
//!
//! End-to-end scenarios driven over real loopback TCP connections, with
//! discovery's multicast socket swapped for a directly-seeded `View` (see
//! `common::harness`).

mod liveness;
mod matchmaking;
mod rematch;
mod win_detection;
