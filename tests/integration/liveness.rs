//! tests/integration/liveness.rs
//!
//! Scenario F: a mid-game opponent disappears. The liveness probe should
//! detect the failed ping within one period and reclaim the local peer
//! from the stranded session.

use crate::common::harness::{spawn_pair_ordered, test_config, wait_for, ScriptedInteraction};
use std::time::Duration;
use test_log::test;

#[test(tokio::test)]
async fn a_vanished_opponent_is_detected_and_the_session_is_torn_down() {
    let config = test_config();
    // Neither peer has a move queued; once matched, both simply sit
    // holding/awaiting the token until this test acts.
    let lower = ScriptedInteraction::new(Vec::new(), Vec::new());
    let higher = ScriptedInteraction::new(Vec::new(), Vec::new());
    let (a, b) = spawn_pair_ordered(28120, 28121, config, lower, higher).await;

    let formed = wait_for(|| async { a.core.is_in_game().await && b.core.is_in_game().await }, Duration::from_secs(3)).await;
    assert!(formed, "match never formed between the two peers");

    // Simulate peer b crashing: tear down its RPC listener and timers
    // without running any graceful teardown on its side.
    b.request_shutdown();

    let detected = wait_for(|| async { !a.core.is_in_game().await }, Duration::from_secs(3)).await;
    assert!(detected, "peer a's liveness probe never noticed the vanished opponent");
    assert_eq!(a.core.last_opponent().await.as_deref(), Some(b.id.as_str()));

    a.request_shutdown();
}
