//! Authoritative in-memory room state
//!
//! `RoomState` is plain data. The owning `Room` wraps it in a single
//! reader/writer lock; every method here runs under that lock.

use std::collections::HashMap;
use std::sync::Arc;

use super::combat::{BodyPart, HitZones};
use super::geometry::Vec2;
use super::physics::{Bounds, Launch};
use crate::util::ids;
use crate::ws::peer::Peer;

/// Where every participant stands; clients move their own sprite locally
pub const PLAYER_SPAWN: Vec2 = Vec2::new(25.0, 350.0);
/// Aim direction before the first `aim_update`
pub const INITIAL_AIM: Vec2 = Vec2::new(1.0, 0.0);

/// A connected shooter
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub position: Vec2,
    pub aim: Vec2,
    pub last_update: u64,
    peer: Arc<Peer>,
}

impl Participant {
    pub fn peer(&self) -> &Arc<Peer> {
        &self.peer
    }
}

/// A live arrow; its position is always derived from `launch`
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: String,
    pub owner_id: String,
    pub launch: Launch,
    pub active: bool,
}

impl Projectile {
    pub fn position_at(&self, now_ms: u64) -> Vec2 {
        self.launch.position_at(now_ms)
    }
}

/// Copy of a participant's public fields
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantView {
    pub id: String,
    pub position: Vec2,
    pub aim: Vec2,
    pub last_update: u64,
}

/// Copy of a projectile with its position evaluated at snapshot time
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileView {
    pub id: String,
    pub owner_id: String,
    pub position: Vec2,
    pub launch: Launch,
}

/// Point-in-time readout of a room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub tick: u64,
    pub taken_at: u64,
    pub participants: Vec<ParticipantView>,
    pub projectiles: Vec<ProjectileView>,
}

/// Projectile struck the target during a step
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    pub arrow_id: String,
    pub owner_id: String,
    pub body_part: BodyPart,
    pub position: Vec2,
}

/// Why a projectile left the live set
#[derive(Debug, Clone, PartialEq)]
pub enum Despawn {
    Hit(HitEvent),
    OutOfBounds { arrow_id: String, position: Vec2 },
}

#[derive(Debug, Default)]
pub struct RoomState {
    tick: u64,
    participants: HashMap<String, Participant>,
    projectiles: HashMap<String, Projectile>,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn projectile(&self, id: &str) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    /// Register a participant at the spawn point. Returns false if the id is taken.
    pub fn add_participant(&mut self, id: &str, peer: Arc<Peer>, now_ms: u64) -> bool {
        if self.participants.contains_key(id) {
            return false;
        }

        self.participants.insert(
            id.to_string(),
            Participant {
                id: id.to_string(),
                position: PLAYER_SPAWN,
                aim: INITIAL_AIM,
                last_update: now_ms,
                peer,
            },
        );
        true
    }

    /// Unknown ids are ignored so late or duplicate disconnects are harmless
    pub fn remove_participant(&mut self, id: &str) -> Option<Participant> {
        self.participants.remove(id)
    }

    /// Returns false when the participant is not in the room
    pub fn set_aim(&mut self, id: &str, direction: Vec2, now_ms: u64) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.aim = direction;
                participant.last_update = now_ms;
                true
            }
            None => false,
        }
    }

    /// Register a new live projectile and return its id
    pub fn spawn_projectile(
        &mut self,
        owner_id: &str,
        origin: Vec2,
        angle: f64,
        speed: f64,
        now_ms: u64,
    ) -> String {
        let mut id = ids::arrow_id();
        while self.projectiles.contains_key(&id) {
            id = ids::arrow_id();
        }

        self.projectiles.insert(
            id.clone(),
            Projectile {
                id: id.clone(),
                owner_id: owner_id.to_string(),
                launch: Launch {
                    origin,
                    angle,
                    speed,
                    launched_at: now_ms,
                },
                active: true,
            },
        );
        id
    }

    /// Deactivate and drop in one step; absence from the map is the inactive state
    pub fn deactivate_projectile(&mut self, id: &str) -> Option<Projectile> {
        self.projectiles.remove(id).map(|mut projectile| {
            projectile.active = false;
            projectile
        })
    }

    /// One simulation step.
    ///
    /// Bumps the tick, then resolves every live projectile at `now_ms`: a hit
    /// zone match despawns it as a hit, otherwise leaving `bounds` despawns it
    /// silently. Zones are tested first, so a projectile is never both.
    pub fn advance(&mut self, now_ms: u64, zones: &HitZones, bounds: &Bounds) -> Vec<Despawn> {
        self.tick += 1;

        let mut outcomes: Vec<(String, Despawn)> = Vec::new();
        for projectile in self.projectiles.values().filter(|p| p.active) {
            let position = projectile.position_at(now_ms);

            if let Some(body_part) = zones.classify(position) {
                outcomes.push((
                    projectile.id.clone(),
                    Despawn::Hit(HitEvent {
                        arrow_id: projectile.id.clone(),
                        owner_id: projectile.owner_id.clone(),
                        body_part,
                        position,
                    }),
                ));
            } else if !bounds.contains(position) {
                outcomes.push((
                    projectile.id.clone(),
                    Despawn::OutOfBounds {
                        arrow_id: projectile.id.clone(),
                        position,
                    },
                ));
            }
        }

        outcomes
            .into_iter()
            .filter_map(|(id, outcome)| self.deactivate_projectile(&id).map(|_| outcome))
            .collect()
    }

    pub fn snapshot(&self, now_ms: u64) -> RoomSnapshot {
        RoomSnapshot {
            tick: self.tick,
            taken_at: now_ms,
            participants: self
                .participants
                .values()
                .map(|p| ParticipantView {
                    id: p.id.clone(),
                    position: p.position,
                    aim: p.aim,
                    last_update: p.last_update,
                })
                .collect(),
            projectiles: self
                .projectiles
                .values()
                .filter(|p| p.active)
                .map(|p| ProjectileView {
                    id: p.id.clone(),
                    owner_id: p.owner_id.clone(),
                    position: p.position_at(now_ms),
                    launch: p.launch,
                })
                .collect(),
        }
    }

    /// Handles of everyone who should receive a broadcast
    pub fn peers(&self) -> Vec<Arc<Peer>> {
        self.participants.values().map(|p| p.peer.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::peer::test_support::null_peer;

    const T0: u64 = 1_700_000_000_000;

    fn room_with(ids: &[&str]) -> RoomState {
        let mut state = RoomState::new();
        for id in ids {
            assert!(state.add_participant(id, null_peer(id), T0));
        }
        state
    }

    fn hits(outcomes: &[Despawn]) -> Vec<&HitEvent> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                Despawn::Hit(hit) => Some(hit),
                Despawn::OutOfBounds { .. } => None,
            })
            .collect()
    }

    #[test]
    fn participants_spawn_at_fixed_point() {
        let state = room_with(&["a"]);
        let a = state.participant("a").unwrap();
        assert_eq!(a.position, PLAYER_SPAWN);
        assert_eq!(a.aim, INITIAL_AIM);
        assert_eq!(a.last_update, T0);
    }

    #[test]
    fn duplicate_participant_is_rejected() {
        let mut state = room_with(&["a"]);
        assert!(!state.add_participant("a", null_peer("a"), T0 + 5));
        assert_eq!(state.participant("a").unwrap().last_update, T0);
    }

    #[test]
    fn removing_unknown_participant_is_noop() {
        let mut state = room_with(&["a", "b"]);
        let before = state.snapshot(T0);
        assert!(state.remove_participant("ghost").is_none());
        assert_eq!(state.snapshot(T0), before);
        assert!(state.remove_participant("a").is_some());
        assert!(state.remove_participant("a").is_none());
        assert_eq!(state.participant_count(), 1);
    }

    #[test]
    fn set_aim_updates_direction_and_time() {
        let mut state = room_with(&["a"]);
        assert!(state.set_aim("a", Vec2::new(0.6, -0.8), T0 + 40));
        let a = state.participant("a").unwrap();
        assert_eq!(a.aim, Vec2::new(0.6, -0.8));
        assert_eq!(a.last_update, T0 + 40);
        assert!(!state.set_aim("ghost", Vec2::ZERO, T0));
    }

    #[test]
    fn spawned_projectiles_get_unique_ids() {
        let mut state = room_with(&["a"]);
        let first = state.spawn_projectile("a", PLAYER_SPAWN, 0.0, 500.0, T0);
        let second = state.spawn_projectile("a", PLAYER_SPAWN, 0.0, 500.0, T0);
        assert_ne!(first, second);
        assert!(first.starts_with("arrow_"));
        assert_eq!(state.projectile_count(), 2);
        assert!(state.projectile(&first).unwrap().active);
    }

    #[test]
    fn deactivation_removes_projectile() {
        let mut state = room_with(&["a"]);
        let id = state.spawn_projectile("a", PLAYER_SPAWN, 0.0, 500.0, T0);
        let removed = state.deactivate_projectile(&id).unwrap();
        assert!(!removed.active);
        assert!(state.projectile(&id).is_none());
        assert!(state.deactivate_projectile(&id).is_none());
    }

    #[test]
    fn tick_increases_every_step() {
        let mut state = RoomState::new();
        let zones = HitZones::default();
        let bounds = Bounds::default();
        for expected in 1..=5 {
            state.advance(T0, &zones, &bounds);
            assert_eq!(state.tick(), expected);
        }
    }

    #[test]
    fn stepping_does_not_drift() {
        let mut state = room_with(&["a"]);
        let id = state.spawn_projectile("a", Vec2::new(25.0, 100.0), -10.0, 180.0, T0);
        let zones = HitZones::default();
        let bounds = Bounds::default();

        let end = T0 + 1_600;
        let mut now = T0;
        while now < end {
            now += 16;
            state.advance(now, &zones, &bounds);
        }

        let snapshot = state.snapshot(end);
        let view = snapshot.projectiles.iter().find(|p| p.id == id).unwrap();
        let direct = state.projectile(&id).unwrap().launch.position_at(end);
        assert_eq!(view.position, direct);
    }

    #[test]
    fn horizontal_shot_hits_upper_body_once() {
        let mut state = room_with(&["a"]);
        let id = state.spawn_projectile("a", Vec2::new(25.0, 350.0), 0.0, 500.0, T0);
        let zones = HitZones::default();
        let bounds = Bounds::default();

        let mut all_hits = Vec::new();
        let mut now = T0;
        for _ in 0..120 {
            now += 16;
            let outcomes = state.advance(now, &zones, &bounds);
            all_hits.extend(hits(&outcomes).into_iter().cloned());
        }

        assert_eq!(all_hits.len(), 1);
        assert_eq!(all_hits[0].arrow_id, id);
        assert_eq!(all_hits[0].owner_id, "a");
        assert_eq!(all_hits[0].body_part, BodyPart::UpperBody);
        assert!(state.projectile(&id).is_none());
    }

    #[test]
    fn high_fast_shot_leaves_without_hit() {
        let mut state = room_with(&["a"]);
        let id = state.spawn_projectile("a", Vec2::new(25.0, 100.0), 0.0, 2_000.0, T0);
        let zones = HitZones::default();
        let bounds = Bounds::default();

        let mut despawns = Vec::new();
        let mut now = T0;
        for _ in 0..60 {
            now += 16;
            despawns.extend(state.advance(now, &zones, &bounds));
        }

        assert!(hits(&despawns).is_empty());
        assert_eq!(despawns.len(), 1);
        match &despawns[0] {
            Despawn::OutOfBounds { arrow_id, position } => {
                assert_eq!(arrow_id, &id);
                assert!(position.x > 1000.0);
            }
            other => panic!("unexpected despawn {other:?}"),
        }
        assert_eq!(state.projectile_count(), 0);
    }

    #[test]
    fn zero_speed_arrow_falls_out_of_bounds() {
        let mut state = room_with(&["a"]);
        let id = state.spawn_projectile("a", Vec2::new(25.0, 350.0), 73.0, 0.0, T0);
        let zones = HitZones::default();
        let bounds = Bounds::default();

        let mut now = T0;
        let mut despawned = None;
        for _ in 0..600 {
            now += 16;
            if let Some(projectile) = state.projectile(&id) {
                let p = projectile.position_at(now);
                assert!(p.is_finite());
                assert_eq!(p.x, 25.0);
            }
            if let Some(d) = state.advance(now, &zones, &bounds).pop() {
                despawned = Some(d);
                break;
            }
        }

        match despawned {
            Some(Despawn::OutOfBounds { position, .. }) => assert!(position.y > 1000.0),
            other => panic!("expected out-of-bounds despawn, got {other:?}"),
        }
    }

    #[test]
    fn hit_wins_over_bounds() {
        // Shrink bounds so the target sits outside them
        let bounds = Bounds {
            min: Vec2::new(-100.0, -100.0),
            max: Vec2::new(300.0, 300.0),
        };
        let mut state = room_with(&["a"]);
        state.spawn_projectile("a", Vec2::new(425.0, 350.0), 0.0, 0.0, T0);
        let outcomes = state.advance(T0, &HitZones::default(), &bounds);
        assert_eq!(hits(&outcomes).len(), 1);
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn snapshot_reports_everything() {
        let mut state = room_with(&["a", "b"]);
        state.set_aim("b", Vec2::new(0.0, 1.0), T0 + 3);
        let id = state.spawn_projectile("a", Vec2::new(25.0, 350.0), 0.0, 500.0, T0);
        state.advance(T0 + 16, &HitZones::default(), &Bounds::default());

        let snapshot = state.snapshot(T0 + 100);
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.taken_at, T0 + 100);
        assert_eq!(snapshot.participants.len(), 2);
        let b = snapshot.participants.iter().find(|p| p.id == "b").unwrap();
        assert_eq!(b.aim, Vec2::new(0.0, 1.0));
        assert_eq!(b.last_update, T0 + 3);

        assert_eq!(snapshot.projectiles.len(), 1);
        let arrow = &snapshot.projectiles[0];
        assert_eq!(arrow.id, id);
        assert_eq!(arrow.owner_id, "a");
        assert!((arrow.position.x - 75.0).abs() < 1e-9);
        assert_eq!(state.peers().len(), 2);
    }
}
