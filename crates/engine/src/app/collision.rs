use tracing::debug;

use super::actor::{Actor, ActorId};
use super::event::{ActorCollisionEvent, DoubleActorWrapper, Event, EventSender};
use super::Rect;

/// Tests every unordered pair of collisionable actors once, in active-list order.
///
/// Stateless: pairs that keep overlapping produce a new event every call.
pub fn detect_collisions(actors: &[Box<dyn Actor>]) -> Vec<ActorCollisionEvent> {
    let candidates: Vec<(ActorId, Rect)> = actors
        .iter()
        .filter_map(|actor| {
            actor
                .as_collisionable()
                .map(|collisionable| (actor.id(), collisionable.collision_rect()))
        })
        .collect();

    let mut events = Vec::new();
    for (index, first) in candidates.iter().enumerate() {
        for second in &candidates[index + 1..] {
            if let Some(event) = ActorCollisionEvent::between(*first, *second) {
                events.push(event);
            }
        }
    }
    events
}

/// Runs detection and posts one `ActorCollision` per overlapping pair. Returns the count.
pub fn post_collisions(actors: &[Box<dyn Actor>], sender: &EventSender) -> usize {
    let events = detect_collisions(actors);
    let count = events.len();
    for event in events {
        let (first, second) = event.actors();
        debug!(first = %first, second = %second, rect = ?event.collision_rect(), "collision");
        sender.post(Event::ActorCollision(event));
    }
    count
}
