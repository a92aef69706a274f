//! tests/integration/rematch.rs
//!
//! Scenario E: after a completed game, both peers agree to a rematch. The
//! peer whose previous symbol was O starts the new game, and each side's
//! symbol flips.

use crate::common::harness::{spawn_pair_ordered, test_config, wait_for, ScriptedInteraction};
use std::time::Duration;
use tactoe_mesh::board::Symbol;
use tactoe_mesh::interaction::MoveInput;
use test_log::test;

#[test(tokio::test)]
async fn both_peers_agreeing_to_a_rematch_flips_symbols_and_the_starting_side() {
    let config = test_config();
    // Same top-row win as the win-detection scenario, but both sides say
    // "yes" to the rematch prompt this time.
    let lower = ScriptedInteraction::new(
        vec![MoveInput::Move(0, 0), MoveInput::Move(0, 1), MoveInput::Move(0, 2)],
        vec![true],
    );
    let higher = ScriptedInteraction::new(vec![MoveInput::Move(1, 0), MoveInput::Move(1, 1)], vec![true]);
    let (a, b) = spawn_pair_ordered(28110, 28111, config, lower, higher).await;

    // Peer a (lexicographically lower) won as X; once the rematch
    // handshake completes, it should come back as O without the token,
    // and peer b should hold X and the token.
    let rematched = wait_for(
        || async { a.core.my_symbol().await == Some(Symbol::O) && b.core.my_symbol().await == Some(Symbol::X) },
        Duration::from_secs(5),
    )
    .await;
    assert!(rematched, "the rematch never flipped symbols as expected");

    assert!(a.core.is_in_game().await, "the session should carry straight through a rematch");
    assert!(b.core.is_in_game().await);
    assert!(!a.core.has_token().await, "peer a started the first game, so it should not start the second");
    assert!(b.core.has_token().await, "peer b should hold the token for the rematch");

    a.request_shutdown();
    b.request_shutdown();
}
