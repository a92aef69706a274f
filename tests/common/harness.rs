//! tests/common/harness.rs
//!
//! A scripted `Interaction` adapter plus a `TestPeer` that wires a real RPC
//! listener and a `PeerCore` together without a live multicast discovery
//! loop: the membership view is seeded directly, so tests get a known
//! topology instantly instead of waiting on HELLO/GOSSIP timing.

use std::collections::VecDeque;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tactoe_mesh::config::Config;
use tactoe_mesh::discovery::{View, ViewHandle};
use tactoe_mesh::ids::PeerId;
use tactoe_mesh::interaction::{Interaction, MoveInput};
use tactoe_mesh::peer::PeerCore;
use tactoe_mesh::rpc::RpcServer;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio_util::sync::CancellationToken;

/// Drives moves and yes/no prompts from a pre-loaded script, with more
/// entries appendable at runtime via `push_move`/`push_answer`. An empty
/// queue blocks the prompt rather than guessing an answer, so a test
/// controls exactly when each prompt resolves instead of racing a timer.
pub struct ScriptedInteraction {
    moves: AsyncMutex<VecDeque<MoveInput>>,
    answers: AsyncMutex<VecDeque<bool>>,
    notify: Notify,
}

impl ScriptedInteraction {
    pub fn new(moves: Vec<MoveInput>, answers: Vec<bool>) -> Arc<Self> {
        Arc::new(Self {
            moves: AsyncMutex::new(moves.into()),
            answers: AsyncMutex::new(answers.into()),
            notify: Notify::new(),
        })
    }

    /// A peer that only ever answers rematch/stay-in-queue prompts (no
    /// moves of its own to make, e.g. the non-coordinator in a liveness
    /// test).
    pub fn answers_only(answers: Vec<bool>) -> Arc<Self> {
        Self::new(Vec::new(), answers)
    }

    pub async fn push_move(&self, mv: MoveInput) {
        self.moves.lock().await.push_back(mv);
        self.notify.notify_waiters();
    }

    pub async fn push_answer(&self, answer: bool) {
        self.answers.lock().await.push_back(answer);
        self.notify.notify_waiters();
    }
}

impl Interaction for ScriptedInteraction {
    fn prompt_move(&self) -> Pin<Box<dyn Future<Output = MoveInput> + Send + '_>> {
        Box::pin(async move {
            loop {
                let notified = self.notify.notified();
                if let Some(mv) = self.moves.lock().await.pop_front() {
                    return mv;
                }
                notified.await;
            }
        })
    }

    fn prompt_yes_no(&self, _prompt: &str) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            loop {
                let notified = self.notify.notified();
                if let Some(answer) = self.answers.lock().await.pop_front() {
                    return answer;
                }
                notified.await;
            }
        })
    }
}

/// A `config.toml` profile tuned for tests: fast matchmaking/liveness
/// timers, discovery left at its defaults since the harness never binds a
/// real multicast socket.
pub fn test_config() -> Config {
    Config {
        matchmaking_initial_delay_ms: 10,
        matchmaking_period_ms: 30,
        liveness_period_ms: 40,
        propose_confirm_timeout_ms: 300,
        ..Config::default()
    }
}

/// One running peer: a real TCP RPC listener plus a `PeerCore` whose
/// membership view is populated by `seed` rather than a live discovery
/// socket.
pub struct TestPeer {
    pub id: PeerId,
    pub core: Arc<PeerCore>,
    view: ViewHandle,
    shutdown: CancellationToken,
}

impl TestPeer {
    /// Binds to an OS-assigned ephemeral port. The resulting id's ordering
    /// relative to another ephemeral-port peer is not under the test's
    /// control; use `spawn_on` when a test needs to know in advance which
    /// peer is lexicographically smaller (e.g. to script the right moves
    /// for the X/token-holding role).
    pub async fn spawn(config: Config, interaction: Arc<dyn Interaction>) -> Self {
        Self::spawn_on(0, config, interaction).await
    }

    pub async fn spawn_on(port: u16, config: Config, interaction: Arc<dyn Interaction>) -> Self {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        let server = RpcServer::bind(addr).await.expect("bind loopback RPC listener");
        let id: PeerId = server.local_addr().to_string();
        let view: ViewHandle = Arc::new(View::new());
        let shutdown = CancellationToken::new();
        let core = PeerCore::new(id.clone(), config, view.clone(), interaction, shutdown.clone());

        tokio::spawn(server.run(core.clone(), shutdown.clone()));
        core.spawn_loops();

        Self { id, core, view, shutdown }
    }

    /// Adds `other` to this peer's membership view directly, bypassing
    /// multicast HELLO/GOSSIP.
    pub fn seed(&self, other: &TestPeer) {
        self.view.seed(other.id.clone());
    }

    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Two peers, each seeded with the other's id — the smallest topology that
/// exercises matchmaking.
pub async fn spawn_pair(config: Config, a: Arc<dyn Interaction>, b: Arc<dyn Interaction>) -> (TestPeer, TestPeer) {
    let peer_a = TestPeer::spawn(config.clone(), a).await;
    let peer_b = TestPeer::spawn(config, b).await;
    peer_a.seed(&peer_b);
    peer_b.seed(&peer_a);
    (peer_a, peer_b)
}

/// As `spawn_pair`, but binds `lower_port`/`higher_port` explicitly
/// (`lower_port < higher_port`) so the caller knows in advance which peer
/// is lexicographically smaller — and therefore which one proposes, starts
/// with the token, and ends up the rematch coordinator.
pub async fn spawn_pair_ordered(
    lower_port: u16,
    higher_port: u16,
    config: Config,
    lower: Arc<dyn Interaction>,
    higher: Arc<dyn Interaction>,
) -> (TestPeer, TestPeer) {
    assert!(lower_port < higher_port, "lower_port must sort before higher_port");
    let peer_lower = TestPeer::spawn_on(lower_port, config.clone(), lower).await;
    let peer_higher = TestPeer::spawn_on(higher_port, config, higher).await;
    peer_lower.seed(&peer_higher);
    peer_higher.seed(&peer_lower);
    (peer_lower, peer_higher)
}

/// Polls `check` until it returns true or `timeout` elapses, returning
/// whether it converged. Used in place of fixed sleeps so tests run as fast
/// as the scripted timers allow instead of the slowest plausible one.
pub async fn wait_for<F, Fut>(mut check: F, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
