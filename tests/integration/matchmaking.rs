//! tests/integration/matchmaking.rs
//!
//! Scenario A: two free peers, each seeded with the other's id, pair up
//! without any outside prompting, and the lexicographically smaller one
//! starts with the token.

use crate::common::harness::{spawn_pair_ordered, test_config, wait_for, ScriptedInteraction};
use std::time::Duration;
use tactoe_mesh::interaction::MoveInput;
use test_log::test;

#[test(tokio::test)]
async fn two_peers_discover_each_other_and_form_then_close_a_session() {
    let config = test_config();
    // The lower peer will be the one handed the token; it quits its first
    // turn, which should unwind the session on both sides.
    let lower = ScriptedInteraction::new(vec![MoveInput::Quit], vec![true]);
    let higher = ScriptedInteraction::new(Vec::new(), vec![true]);
    let (a, b) = spawn_pair_ordered(28080, 28081, config, lower, higher).await;

    let a_paired = wait_for(
        || async { a.core.last_opponent().await.as_deref() == Some(b.id.as_str()) },
        Duration::from_secs(3),
    )
    .await;
    assert!(a_paired, "peer a never recorded peer b as its last opponent");

    let b_paired = wait_for(
        || async { b.core.last_opponent().await.as_deref() == Some(a.id.as_str()) },
        Duration::from_secs(1),
    )
    .await;
    assert!(b_paired, "peer b never recorded peer a as its last opponent");

    // Both answered the quit-triggered stay-in-queue prompt "yes", so
    // neither should have torn itself out of the pool.
    assert!(a.core.is_looking_for_matches().await);
    assert!(b.core.is_looking_for_matches().await);
    assert!(!a.core.is_in_game().await);
    assert!(!b.core.is_in_game().await);

    a.request_shutdown();
    b.request_shutdown();
}

#[test(tokio::test)]
async fn the_lexicographically_smaller_peer_starts_with_the_token() {
    let config = test_config();
    // Both peers block on their first prompt until the test lets them
    // move, so the intermediate "match formed, nobody has played yet"
    // state can be observed without racing a timer.
    let lower = ScriptedInteraction::new(Vec::new(), Vec::new());
    let higher = ScriptedInteraction::new(Vec::new(), Vec::new());
    let (a, b) = spawn_pair_ordered(28090, 28091, config, lower.clone(), higher.clone()).await;

    let formed = wait_for(|| async { a.core.is_in_game().await && b.core.is_in_game().await }, Duration::from_secs(3)).await;
    assert!(formed, "match never formed between the two peers");

    assert!(a.core.has_token().await, "the lexicographically smaller peer should start with the token");
    assert!(!b.core.has_token().await);
    assert_eq!(a.core.my_symbol().await, Some(tactoe_mesh::board::Symbol::X));
    assert_eq!(b.core.my_symbol().await, Some(tactoe_mesh::board::Symbol::O));

    lower.push_move(MoveInput::Quit).await;
    let closed = wait_for(|| async { !a.core.is_in_game().await && !b.core.is_in_game().await }, Duration::from_secs(1)).await;
    assert!(closed, "quitting never tore the session down on both sides");

    a.request_shutdown();
    b.request_shutdown();
}
