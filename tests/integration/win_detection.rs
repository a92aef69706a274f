//! tests/integration/win_detection.rs
//!
//! Scenario D: a top-row win for X, interleaved with O's moves, with both
//! peers declining the rematch afterwards.

use crate::common::harness::{spawn_pair_ordered, test_config, wait_for, ScriptedInteraction};
use std::time::Duration;
use tactoe_mesh::interaction::MoveInput;
use test_log::test;

#[test(tokio::test)]
async fn x_wins_the_top_row_and_both_peers_settle_back_into_the_pool() {
    let config = test_config();
    let lower = ScriptedInteraction::new(
        vec![MoveInput::Move(0, 0), MoveInput::Move(0, 1), MoveInput::Move(0, 2)],
        vec![false, true],
    );
    let higher = ScriptedInteraction::new(vec![MoveInput::Move(1, 0), MoveInput::Move(1, 1)], vec![false, true]);
    let (a, b) = spawn_pair_ordered(28100, 28101, config, lower, higher).await;

    let settled = wait_for(
        || async { !a.core.is_in_game().await && !b.core.is_in_game().await },
        Duration::from_secs(5),
    )
    .await;
    assert!(settled, "the game never concluded on both sides");

    assert_eq!(a.core.last_opponent().await.as_deref(), Some(b.id.as_str()));
    assert_eq!(b.core.last_opponent().await.as_deref(), Some(a.id.as_str()));
    assert!(a.core.is_looking_for_matches().await, "peer a should have stayed in the pool");
    assert!(b.core.is_looking_for_matches().await, "peer b should have stayed in the pool");

    a.request_shutdown();
    b.request_shutdown();
}
