//! Synchronous, in-order event bus (C2).
//!
//! `publish` never returns to the caller before every subscriber that was
//! registered at publish time has run. Publishes that happen from inside a
//! handler are not re-entered immediately: they are queued and drained
//! breadth-first by the outermost `publish` call, which keeps ordering
//! predictable under cascading effects. A `max_depth` counter bounds how
//! many cascades a single outer publish may trigger before subsequent
//! publishes are dropped and logged as `EffectLoopDetected`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::hex::HexPosition;
use crate::player::{CardId, PlayerId, Resource};
use crate::tiles::TileKind;

/// Default recursion bound for cascading publishes within one outer call.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GameStateChanged,
    GameStatusChanged,
    GamePhaseChanged,
    GenerationAdvanced,
    PlayerJoined,
    TerraformRatingChanged,
    ResourcesChanged,
    TilePlaced,
    TemperatureChanged,
    OxygenChanged,
    OceansChanged,
    CardPlayed,
    CardHandUpdated,
    PlayerEffectsChanged,
    PlacementBonusGained,
    TileQueueCreated,
    CardDrawConfirmed,
}

#[derive(Debug, Clone)]
pub enum GameEvent {
    GameStateChanged,
    GameStatusChanged { old: crate::game::GameStatus, new: crate::game::GameStatus },
    GamePhaseChanged { old: crate::game::GamePhase, new: crate::game::GamePhase },
    GenerationAdvanced { old: u32, new: u32 },
    PlayerJoined { player_id: PlayerId },
    TerraformRatingChanged { player_id: PlayerId, old: i32, new: i32 },
    ResourcesChanged { player_id: PlayerId, changes: Vec<(Resource, i32)> },
    TilePlaced { tile_kind: TileKind, position: HexPosition, owner: Option<PlayerId> },
    TemperatureChanged { old: i32, new: i32 },
    OxygenChanged { old: u8, new: u8 },
    OceansChanged { old: u8, new: u8 },
    CardPlayed { player_id: PlayerId, card_id: CardId },
    CardHandUpdated { player_id: PlayerId },
    PlayerEffectsChanged { player_id: PlayerId },
    PlacementBonusGained { player_id: PlayerId, resources: Vec<(Resource, i32)> },
    TileQueueCreated { player_id: PlayerId, queue_size: usize, source: CardId },
    CardDrawConfirmed { player_id: PlayerId, card_ids: Vec<CardId> },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::GameStateChanged => EventKind::GameStateChanged,
            GameEvent::GameStatusChanged { .. } => EventKind::GameStatusChanged,
            GameEvent::GamePhaseChanged { .. } => EventKind::GamePhaseChanged,
            GameEvent::GenerationAdvanced { .. } => EventKind::GenerationAdvanced,
            GameEvent::PlayerJoined { .. } => EventKind::PlayerJoined,
            GameEvent::TerraformRatingChanged { .. } => EventKind::TerraformRatingChanged,
            GameEvent::ResourcesChanged { .. } => EventKind::ResourcesChanged,
            GameEvent::TilePlaced { .. } => EventKind::TilePlaced,
            GameEvent::TemperatureChanged { .. } => EventKind::TemperatureChanged,
            GameEvent::OxygenChanged { .. } => EventKind::OxygenChanged,
            GameEvent::OceansChanged { .. } => EventKind::OceansChanged,
            GameEvent::CardPlayed { .. } => EventKind::CardPlayed,
            GameEvent::CardHandUpdated { .. } => EventKind::CardHandUpdated,
            GameEvent::PlayerEffectsChanged { .. } => EventKind::PlayerEffectsChanged,
            GameEvent::PlacementBonusGained { .. } => EventKind::PlacementBonusGained,
            GameEvent::TileQueueCreated { .. } => EventKind::TileQueueCreated,
            GameEvent::CardDrawConfirmed { .. } => EventKind::CardDrawConfirmed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&GameEvent) + Send + Sync>;

struct Inner {
    subscribers: HashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
    queue: VecDeque<(GameEvent, usize)>,
    dispatching: bool,
    current_depth: usize,
    max_depth: usize,
}

pub struct EventBus {
    inner: Mutex<Inner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl EventBus {
    pub fn new(max_depth: usize) -> Self {
        EventBus {
            inner: Mutex::new(Inner {
                subscribers: HashMap::new(),
                next_id: 0,
                queue: VecDeque::new(),
                dispatching: false,
                current_depth: 0,
                max_depth,
            }),
        }
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner
            .subscribers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock().unwrap();
        for handlers in inner.subscribers.values_mut() {
            handlers.retain(|(existing, _)| *existing != id);
        }
    }

    /// Publishes an event. Blocks the caller until the full breadth-first
    /// cascade it triggers has finished draining.
    pub fn publish(&self, event: GameEvent) {
        let mut inner = self.inner.lock().unwrap();
        let depth = if inner.dispatching {
            inner.current_depth + 1
        } else {
            0
        };
        if depth > inner.max_depth {
            tracing::warn!(kind = ?event.kind(), depth, "effect loop detected, dropping publish");
            return;
        }
        inner.queue.push_back((event, depth));
        if inner.dispatching {
            // An outer call is already draining the queue; it will pick this up.
            return;
        }
        inner.dispatching = true;
        loop {
            let Some((next_event, next_depth)) = inner.queue.pop_front() else {
                break;
            };
            inner.current_depth = next_depth;
            let kind = next_event.kind();
            let handlers = inner
                .subscribers
                .get(&kind)
                .cloned()
                .unwrap_or_default();
            drop(inner);
            for (_, handler) in &handlers {
                handler(&next_event);
            }
            inner = self.inner.lock().unwrap();
        }
        inner.dispatching = false;
        inner.current_depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn subscribers_receive_events_of_their_kind_in_publish_order() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        bus.subscribe(EventKind::GenerationAdvanced, move |event| {
            if let GameEvent::GenerationAdvanced { old, new } = event {
                seen_clone.lock().unwrap().push((*old, *new));
            }
        });
        bus.publish(GameEvent::GenerationAdvanced { old: 1, new: 2 });
        bus.publish(GameEvent::GenerationAdvanced { old: 2, new: 3 });
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn unsubscribed_handlers_stop_receiving_events() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let id = bus.subscribe(EventKind::GameStateChanged, move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(GameEvent::GameStateChanged);
        bus.unsubscribe(id);
        bus.publish(GameEvent::GameStateChanged);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_publishes_drain_breadth_first() {
        let bus = Arc::new(EventBus::default());
        let order = Arc::new(Mutex::new(Vec::new()));

        let bus_for_a = bus.clone();
        let order_for_a = order.clone();
        bus.subscribe(EventKind::GameStatusChanged, move |_| {
            order_for_a.lock().unwrap().push("A");
            bus_for_a.publish(GameEvent::GamePhaseChanged {
                old: crate::game::GamePhase::Action,
                new: crate::game::GamePhase::ProductionAndCardDraw,
            });
        });
        let order_for_b = order.clone();
        bus.subscribe(EventKind::GamePhaseChanged, move |_| {
            order_for_b.lock().unwrap().push("B");
        });
        let order_for_c = order.clone();
        bus.subscribe(EventKind::GameStatusChanged, move |_| {
            order_for_c.lock().unwrap().push("C");
        });

        bus.publish(GameEvent::GameStatusChanged {
            old: crate::game::GameStatus::Lobby,
            new: crate::game::GameStatus::Active,
        });

        // Both direct subscribers of the outer event run before the
        // cascade they triggered (breadth-first, not depth-first).
        assert_eq!(*order.lock().unwrap(), vec!["A", "C", "B"]);
    }

    #[test]
    fn deep_self_recursion_is_bounded_and_does_not_hang() {
        let bus = Arc::new(EventBus::new(4));
        let calls = Arc::new(AtomicUsize::new(0));
        let bus_clone = bus.clone();
        let calls_clone = calls.clone();
        bus.subscribe(EventKind::GameStateChanged, move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            bus_clone.publish(GameEvent::GameStateChanged);
        });
        bus.publish(GameEvent::GameStateChanged);
        // One call per depth level 0..=4 inclusive, then the bus refuses.
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
