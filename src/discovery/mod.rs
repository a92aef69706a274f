//! src/discovery/mod.rs
//!
//! The membership service: a periodic multicast HELLO sender, a datagram
//! receiver that merges HELLO/GOSSIP into the local view, an optional
//! cleaner that prunes stale entries, and triggered unicast GOSSIP fanout.

pub mod message;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ids::{split_host_port, PeerId};
use message::Message;
use rand::seq::SliceRandom;
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::{self, Duration, Interval};
use tokio_util::sync::CancellationToken;

/// The set of known peer ids, each with a last-seen timestamp (ms). The
/// timestamp is maintained on every HELLO regardless of gossip mode (spec
/// §9 Open Questions resolves this permissively); only the cleaner's
/// pruning is gated on gossip mode, matching the documented source
/// behavior exactly.
#[derive(Default)]
pub struct View {
    entries: Mutex<HashMap<PeerId, u64>>,
}

pub type ViewHandle = Arc<View>;

impl View {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of currently known peer ids (self is never in the view,
    /// by construction — it is filtered out before insertion).
    pub fn snapshot(&self) -> Vec<PeerId> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    pub fn last_seen(&self, id: &str) -> Option<u64> {
        self.entries.lock().unwrap().get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seeds a membership entry directly, bypassing the multicast wire
    /// protocol. Used by the integration test harness to assemble a known
    /// topology without a live HELLO/GOSSIP exchange.
    pub fn seed(&self, id: PeerId) {
        self.observe(id, now_ms());
    }

    /// Inserts the id if unseen, or advances its `lastSeen` if `seen_at` is
    /// newer than what's on record (never moves lastSeen backwards).
    /// Returns `true` if this observation created a new entry.
    fn observe(&self, id: PeerId, seen_at: u64) -> bool {
        let mut guard = self.entries.lock().unwrap();
        match guard.get_mut(&id) {
            Some(last_seen) => {
                if seen_at > *last_seen {
                    *last_seen = seen_at;
                }
                false
            }
            None => {
                guard.insert(id, seen_at);
                true
            }
        }
    }

    fn prune_older_than(&self, now: u64, threshold_ms: u64) -> Vec<PeerId> {
        let mut guard = self.entries.lock().unwrap();
        let stale: Vec<PeerId> = guard
            .iter()
            .filter(|(_, &last_seen)| now.saturating_sub(last_seen) >= threshold_ms)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            guard.remove(id);
        }
        stale
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_millis() as u64
}

/// The Discovery service actor. Owns the multicast/unicast UDP socket and
/// the shared `View`.
pub struct Discovery {
    self_id: PeerId,
    multicast_addr: SocketAddr,
    discovery_port: u16,
    hello_period: Duration,
    gossip_enabled: bool,
    gossip_staleness_ms: u64,
    cleaner_period: Duration,
    cleaner_threshold_ms: u64,
    socket: Arc<UdpSocket>,
    view: ViewHandle,
}

impl Discovery {
    /// Binds the discovery socket: joins the configured multicast group on
    /// all interfaces, with `SO_REUSEADDR` so multiple peers can share the
    /// discovery port on the same host (useful for local testing).
    pub fn bind(config: &Config, self_id: PeerId) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.multicast_port);
        socket.bind(&bind_addr.into())?;
        let std_socket: std::net::UdpSocket = socket.into();
        std_socket
            .join_multicast_v4(&config.multicast_group, &Ipv4Addr::UNSPECIFIED)
            .map_err(|e| Error::MulticastJoin(config.multicast_group, e))?;
        std_socket.set_multicast_loop_v4(true)?;
        std_socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(std_socket)?;

        Ok(Self {
            self_id,
            multicast_addr: SocketAddr::new(IpAddr::V4(config.multicast_group), config.multicast_port),
            discovery_port: config.multicast_port,
            hello_period: Duration::from_millis(config.hello_period_ms),
            gossip_enabled: config.gossip_enabled,
            gossip_staleness_ms: config.gossip_staleness_ms,
            cleaner_period: Duration::from_millis(config.cleaner_period_ms),
            cleaner_threshold_ms: config.cleaner_threshold_ms,
            socket: Arc::new(socket),
            view: Arc::new(View::new()),
        })
    }

    /// A cheaply-clonable handle to the membership view, for the Peer core
    /// to sample during matchmaking.
    pub fn view(&self) -> ViewHandle {
        self.view.clone()
    }

    /// The main run loop: HELLO sender, datagram receiver, and (in gossip
    /// mode) the cleaner, all multiplexed over one socket and one task.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(self_id = %self.self_id, addr = %self.multicast_addr, "Discovery service started");
        let mut hello_timer = time::interval(self.hello_period);
        let mut cleaner_timer = if self.gossip_enabled {
            Some(time::interval(self.cleaner_period))
        } else {
            None
        };
        let mut buf = [0u8; 1024];

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Discovery service received shutdown signal.");
                    break;
                }
                _ = hello_timer.tick() => {
                    self.send_hello().await;
                }
                _ = tick_or_pending(&mut cleaner_timer) => {
                    self.run_cleaner();
                }
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, from)) => self.handle_datagram(&buf[..len], from).await,
                        Err(e) => tracing::warn!(error = %e, "Discovery socket read failed"),
                    }
                }
            }
        }
        // Dropping the socket releases the fd; the OS leaves the multicast
        // group as part of socket teardown.
        tracing::info!("Discovery service stopped, multicast socket released.");
    }

    async fn send_hello(&self) {
        let payload = message::format_hello(&self.self_id);
        if let Err(e) = self.socket.send_to(payload.as_bytes(), self.multicast_addr).await {
            tracing::warn!(error = %e, "Failed to send HELLO");
        }
    }

    async fn handle_datagram(&self, bytes: &[u8], from: SocketAddr) {
        let Ok(text) = std::str::from_utf8(bytes) else {
            tracing::trace!(from = %from, "Discarding non-UTF8 discovery datagram");
            return;
        };
        match message::parse(text) {
            Some(Message::Hello(id)) => self.handle_hello(id).await,
            Some(Message::Gossip(entries)) => self.handle_gossip(entries).await,
            None => tracing::trace!(from = %from, payload = %text, "Discarding malformed discovery datagram"),
        }
    }

    async fn handle_hello(&self, id: PeerId) {
        if id == self.self_id {
            return;
        }
        let is_new = self.view.observe(id.clone(), now_ms());
        if is_new {
            tracing::debug!(peer_id = %id, "Discovered new peer via HELLO");
            self.send_gossip_to_random_peer().await;
        }
    }

    async fn handle_gossip(&self, entries: Vec<(PeerId, u64)>) {
        if !self.gossip_enabled {
            return;
        }
        let now = now_ms();
        for (id, ts) in entries {
            if id == self.self_id {
                continue;
            }
            if now.saturating_sub(ts) > self.gossip_staleness_ms {
                continue;
            }
            let current = self.view.last_seen(&id);
            let is_fresher = match current {
                Some(existing) => ts > existing,
                None => true,
            };
            if !is_fresher {
                continue;
            }
            let is_new = self.view.observe(id.clone(), ts);
            if is_new {
                tracing::debug!(peer_id = %id, "Discovered new peer via GOSSIP merge");
                self.send_gossip_to_random_peer().await;
            }
        }
    }

    /// Builds a digest of the current view (with this node's own entry
    /// first) and unicasts it to one randomly chosen peer's host, on the
    /// discovery port.
    async fn send_gossip_to_random_peer(&self) {
        if !self.gossip_enabled {
            return;
        }
        let peers = self.view.snapshot();
        let Some(target) = peers.choose(&mut rand::thread_rng()) else {
            return;
        };
        let Some((host, _rpc_port)) = split_host_port(target) else {
            tracing::warn!(peer_id = %target, "Cannot gossip to malformed peer id");
            return;
        };
        let target_addr: SocketAddr = match format!("{host}:{}", self.discovery_port).parse() {
            Ok(addr) => addr,
            Err(_) => return,
        };

        let now = now_ms();
        let mut entries = vec![(self.self_id.clone(), now)];
        for id in &peers {
            if let Some(ts) = self.view.last_seen(id) {
                entries.push((id.clone(), ts));
            }
        }
        let payload = message::format_gossip(&entries);
        if let Err(e) = self.socket.send_to(payload.as_bytes(), target_addr).await {
            tracing::warn!(peer = %target_addr, error = %e, "Failed to send GOSSIP");
        }
    }

    fn run_cleaner(&self) {
        let stale = self.view.prune_older_than(now_ms(), self.cleaner_threshold_ms);
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), peers = ?stale, "Pruned stale peers");
        }
    }
}

async fn tick_or_pending(timer: &mut Option<Interval>) {
    match timer {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
