//! Room handle, authoritative tick loop and room registry

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::util::time::unix_millis;
use crate::ws::peer::Peer;
use crate::ws::protocol::ServerMsg;

use super::combat::{HitZones, DEFAULT_TARGET_ANCHOR};
use super::geometry::Vec2;
use super::physics::{Bounds, Launch};
use super::snapshot;
use super::state::{Despawn, RoomSnapshot, RoomState};

/// Default simulation cadence (~60 Hz)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Per-room simulation settings
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSettings {
    pub tick_interval: Duration,
    /// Where the target stands; hit zones are built around it
    pub target_anchor: Vec2,
    pub bounds: Bounds,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            target_anchor: DEFAULT_TARGET_ANCHOR,
            bounds: Bounds::default(),
        }
    }
}

/// Launch parameters taken from an `arrow_shot`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub origin: Vec2,
    pub angle: f64,
    pub speed: f64,
}

/// Delivery summary for one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// Small summary for diagnostics endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: String,
    pub tick: u64,
    pub participants: usize,
    pub projectiles: usize,
    pub running: bool,
}

/// One isolated simulation instance.
///
/// All room data sits behind one `RwLock`. Mutations take the write lock,
/// snapshots take the read lock, and the lock is always released before any
/// socket write.
pub struct Room {
    id: String,
    settings: RoomSettings,
    state: RwLock<RoomState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Room {
    /// New room in the idle state (no loop running yet)
    pub fn new(id: impl Into<String>, settings: RoomSettings) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            settings,
            state: RwLock::new(RoomState::new()),
            task: Mutex::new(None),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn participant_count(&self) -> usize {
        self.state.read().participant_count()
    }

    pub fn is_empty(&self) -> bool {
        self.participant_count() == 0
    }

    pub fn summary(&self) -> RoomSummary {
        let state = self.state.read();
        RoomSummary {
            id: self.id.clone(),
            tick: state.tick(),
            participants: state.participant_count(),
            projectiles: state.projectile_count(),
            running: self.is_running(),
        }
    }

    /// Spawn the fixed-rate loop. Calling it on a running room does nothing.
    ///
    /// The task only holds a weak reference, so dropping the last `Arc<Room>`
    /// ends it on the next tick.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let room = Arc::downgrade(self);
        let room_id = self.id.clone();
        let tick_interval = self.settings.tick_interval;
        *task = Some(tokio::spawn(run_loop(room, room_id, tick_interval)));
    }

    /// Abort the loop task
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            info!(room_id = %self.id, "Room loop stopped");
        }
    }

    pub fn add_participant(&self, id: &str, peer: Arc<Peer>, now_ms: u64) -> bool {
        let added = self.state.write().add_participant(id, peer, now_ms);
        if added {
            info!(room_id = %self.id, player_id = %id, "Player joined room");
        } else {
            warn!(room_id = %self.id, player_id = %id, "Player already in room");
        }
        added
    }

    /// Returns true if the participant was present
    pub fn remove_participant(&self, id: &str) -> bool {
        let removed = self.state.write().remove_participant(id).is_some();
        if removed {
            info!(room_id = %self.id, player_id = %id, "Player left room");
        }
        removed
    }

    pub fn set_aim(&self, id: &str, direction: Vec2, now_ms: u64) -> bool {
        self.state.write().set_aim(id, direction, now_ms)
    }

    /// Register an arrow for `owner_id` and announce it to the whole room
    pub async fn fire(&self, owner_id: &str, shot: ShotRequest, now_ms: u64) -> String {
        let launch = Launch {
            origin: shot.origin,
            angle: shot.angle,
            speed: shot.speed,
            launched_at: now_ms,
        };

        let (arrow_id, peers) = {
            let mut state = self.state.write();
            let id = state.spawn_projectile(owner_id, launch.origin, launch.angle, launch.speed, now_ms);
            (id, state.peers())
        };

        debug!(room_id = %self.id, player_id = %owner_id, arrow_id = %arrow_id, "Arrow spawned");
        self.fan_out(peers, &snapshot::arrow_spawned(&arrow_id, owner_id, &launch))
            .await;
        arrow_id
    }

    pub fn snapshot(&self, now_ms: u64) -> RoomSnapshot {
        self.state.read().snapshot(now_ms)
    }

    /// One simulation step at `now_ms`: advance, announce hits, broadcast state
    pub async fn tick(&self, now_ms: u64) -> u64 {
        let zones = HitZones::around(self.settings.target_anchor);
        let despawns = self.state.write().advance(now_ms, &zones, &self.settings.bounds);

        for despawn in &despawns {
            match despawn {
                Despawn::Hit(hit) => {
                    info!(
                        room_id = %self.id,
                        arrow_id = %hit.arrow_id,
                        shooter_id = %hit.owner_id,
                        body_part = %hit.body_part,
                        x = hit.position.x,
                        y = hit.position.y,
                        "Hit detected"
                    );
                    let peers = self.state.read().peers();
                    self.fan_out(peers, &snapshot::hit_detected(hit)).await;
                }
                Despawn::OutOfBounds { arrow_id, position } => {
                    debug!(
                        room_id = %self.id,
                        arrow_id = %arrow_id,
                        x = position.x,
                        y = position.y,
                        "Arrow left playfield"
                    );
                }
            }
        }

        let (snapshot, peers) = {
            let state = self.state.read();
            (state.snapshot(now_ms), state.peers())
        };
        let tick = snapshot.tick;
        self.fan_out(peers, &snapshot::game_state(&snapshot)).await;
        tick
    }

    /// Broadcast to every participant currently in the room
    pub async fn broadcast(&self, msg: &ServerMsg) -> Delivery {
        let peers = self.state.read().peers();
        self.fan_out(peers, msg).await
    }

    /// Encode once and write to every peer concurrently; failures are logged
    /// per peer and never stop delivery to the rest.
    async fn fan_out(&self, peers: Vec<Arc<Peer>>, msg: &ServerMsg) -> Delivery {
        if peers.is_empty() {
            return Delivery::default();
        }

        let text = match serde_json::to_string(msg) {
            Ok(text) => text,
            Err(e) => {
                warn!(room_id = %self.id, error = %e, "Failed to encode broadcast");
                return Delivery {
                    delivered: 0,
                    failed: peers.len(),
                };
            }
        };

        let text = text.as_str();
        let results = join_all(peers.iter().map(|peer| async move { (peer, peer.send_text(text).await) })).await;

        let mut delivery = Delivery::default();
        for (peer, result) in results {
            match result {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    delivery.failed += 1;
                    debug!(
                        room_id = %self.id,
                        player_id = %peer.participant_id(),
                        error = %e,
                        "Broadcast write failed"
                    );
                }
            }
        }
        delivery
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

async fn run_loop(room: Weak<Room>, room_id: String, tick_interval: Duration) {
    info!(room_id = %room_id, interval_ms = tick_interval.as_millis() as u64, "Room loop started");

    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let Some(room) = room.upgrade() else {
            break;
        };
        room.tick(unix_millis()).await;
    }

    info!(room_id = %room_id, "Room loop finished");
}

/// Registry of all live rooms
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
    settings: RoomSettings,
    reap_idle: bool,
}

impl RoomRegistry {
    pub fn new(settings: RoomSettings, reap_idle: bool) -> Self {
        Self {
            rooms: DashMap::new(),
            settings,
            reap_idle,
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|r| r.value().clone())
    }

    /// Place a participant in `room_id`, creating and starting the room if needed.
    ///
    /// Runs under the registry shard lock so a concurrent reap cannot remove the
    /// room between lookup and insert.
    pub fn join(&self, room_id: &str, participant_id: &str, peer: Arc<Peer>, now_ms: u64) -> Arc<Room> {
        let entry = self.rooms.entry(room_id.to_string()).or_insert_with(|| {
            let room = Room::new(room_id, self.settings.clone());
            room.start();
            info!(room_id = %room_id, "Created room");
            room
        });
        entry.value().add_participant(participant_id, peer, now_ms);
        entry.value().clone()
    }

    /// Remove a participant; empty rooms are reaped when configured to
    pub fn leave(&self, room_id: &str, participant_id: &str) {
        if !self.reap_idle {
            if let Some(room) = self.get(room_id) {
                room.remove_participant(participant_id);
            }
            return;
        }

        let reaped = self.rooms.remove_if(room_id, |_, room| {
            room.remove_participant(participant_id);
            room.is_empty()
        });

        if let Some((_, room)) = reaped {
            room.stop();
            info!(room_id = %room_id, "Reaped idle room");
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_participants(&self) -> usize {
        self.rooms.iter().map(|r| r.value().participant_count()).sum()
    }

    /// Stop every room loop (graceful shutdown)
    pub fn shutdown(&self) {
        for room in self.rooms.iter() {
            room.value().stop();
        }
        self.rooms.clear();
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomSettings::default(), false)
    }
}
