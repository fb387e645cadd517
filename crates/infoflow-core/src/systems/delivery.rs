//! Content Delivery
//!
//! Broadcasts, pulls, and reshares are queued as deliveries and applied in
//! FIFO order, so no citizen ever mutates another directly.

use bevy_ecs::prelude::*;
use std::collections::{HashSet, VecDeque};

use crate::components::citizen::Citizen;
use crate::components::content::{Content, ContentId, Sender};
use crate::output::stats::StepTally;
use crate::SimContext;

use super::step::{SimulationClock, StepFaults};

/// One content item on its way to one citizen.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipient: usize,
    pub content: Content,
    pub sender: Sender,
}

/// Resource: Pending deliveries in arrival order.
#[derive(Resource, Debug, Default)]
pub struct DeliveryQueue(VecDeque<Delivery>);

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recipient: usize, content: Content, sender: Sender) {
        self.0.push_back(Delivery {
            recipient,
            content,
            sender,
        });
    }

    pub fn pop(&mut self) -> Option<Delivery> {
        self.0.pop_front()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delivery> {
        self.0.iter()
    }
}

/// Resource: Entity of each citizen, indexed by citizen id.
#[derive(Resource, Debug, Default, Clone)]
pub struct CitizenIndex(Vec<Entity>);

impl CitizenIndex {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self(entities)
    }

    pub fn get(&self, id: usize) -> Option<Entity> {
        self.0.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Drains the delivery queue through each recipient's acceptance pipeline.
pub fn deliver_pending(
    mut queue: ResMut<DeliveryQueue>,
    index: Res<CitizenIndex>,
    clock: Res<SimulationClock>,
    mut citizens: Query<&mut Citizen>,
    mut ctx: ResMut<SimContext>,
    mut tally: ResMut<StepTally>,
    mut faults: ResMut<StepFaults>,
) {
    let delivered = queue.len();
    while let Some(delivery) = queue.pop() {
        let Some(mut citizen) = index
            .get(delivery.recipient)
            .and_then(|entity| citizens.get_mut(entity).ok())
        else {
            faults.push(format!(
                "step {}: delivery of {} to unknown citizen {}",
                clock.current_step, delivery.content.id, delivery.recipient
            ));
            continue;
        };

        let outcome = citizen.receive_information(&delivery.content, &mut ctx);
        tally.record(&outcome);
    }

    if delivered > 0 {
        tracing::trace!(step = clock.current_step, delivered, "Drained delivery queue");
    }
}

/// Drops seen ids that can no longer arrive.
///
/// Fresh media and sought items always get new ids, and reshares come from
/// memory, so an id held in no memory and no pending delivery is gone for
/// good.
pub fn forget_unreachable_content(
    queue: Res<DeliveryQueue>,
    mut citizens: Query<&mut Citizen>,
) {
    let mut reachable: HashSet<ContentId> = queue.iter().map(|d| d.content.id).collect();
    for citizen in citizens.iter() {
        reachable.extend(citizen.memory().map(|c| c.id));
    }

    let mut forgotten = 0usize;
    for mut citizen in citizens.iter_mut() {
        let before = citizen.seen_count();
        citizen.forget_seen(|id| reachable.contains(&id));
        forgotten += before - citizen.seen_count();
    }
    if forgotten > 0 {
        tracing::trace!(forgotten, reachable = reachable.len(), "Pruned seen content ids");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::citizen::CognitiveTraits;
    use crate::components::content::{ContentId, MediaId};
    use infoflow_events::SourceType;

    fn content(id: u64) -> Content {
        Content {
            id: ContentId(id),
            accuracy: 0.9,
            framing_bias: 0.0,
            source_authority: 0.9,
            source_credibility: 0.9,
            source_type: SourceType::Corporate,
            origin: MediaId(0),
            created_step: 1,
            engagement_factor: 10.0,
            authority_factor: 1.0,
        }
    }

    fn world_with_citizens(n: usize) -> World {
        let mut world = World::new();
        let entities = (0..n)
            .map(|id| {
                world
                    .spawn(Citizen::new(id, 0.5, 5.0, CognitiveTraits::default()))
                    .id()
            })
            .collect();
        world.insert_resource(CitizenIndex::new(entities));
        world.insert_resource(DeliveryQueue::new());
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimContext::seeded(1));
        world.insert_resource(StepTally::default());
        world.insert_resource(StepFaults::default());
        world
    }

    #[test]
    fn test_deliveries_are_applied_and_counted() {
        let mut world = world_with_citizens(2);
        {
            let mut queue = world.resource_mut::<DeliveryQueue>();
            queue.push(0, content(1), Sender::Media(MediaId(0)));
            queue.push(1, content(1), Sender::Media(MediaId(0)));
            queue.push(1, content(1), Sender::Citizen(0));
        }

        let mut schedule = Schedule::default();
        schedule.add_systems(deliver_pending);
        schedule.run(&mut world);

        let tally = *world.resource::<StepTally>();
        assert_eq!(tally.accepted, 2);
        assert_eq!(tally.duplicates, 1);
        assert!(world.resource::<DeliveryQueue>().is_empty());
        assert!(world.resource::<StepFaults>().is_empty());
    }

    #[test]
    fn test_unknown_recipient_is_a_fault() {
        let mut world = world_with_citizens(1);
        world
            .resource_mut::<DeliveryQueue>()
            .push(5, content(2), Sender::Media(MediaId(0)));

        let mut schedule = Schedule::default();
        schedule.add_systems(deliver_pending);
        schedule.run(&mut world);

        let message = world.resource_mut::<StepFaults>().drain_message();
        assert!(message.unwrap().contains("unknown citizen 5"));
    }

    #[test]
    fn test_forgetting_keeps_remembered_ids() {
        let mut world = world_with_citizens(1);
        let mut ignored = content(2);
        ignored.engagement_factor = 0.0;
        {
            let mut queue = world.resource_mut::<DeliveryQueue>();
            queue.push(0, content(1), Sender::Media(MediaId(0)));
            queue.push(0, ignored, Sender::Media(MediaId(0)));
        }

        let mut schedule = Schedule::default();
        schedule.add_systems((deliver_pending, forget_unreachable_content).chain());
        schedule.run(&mut world);

        let citizen = world.query::<&Citizen>().single(&world).clone();
        assert_eq!(citizen.seen_count(), 1);
        assert!(citizen.has_seen(ContentId(1)));
        assert!(!citizen.has_seen(ContentId(2)));

        // A remembered item still counts as a duplicate
        world
            .resource_mut::<DeliveryQueue>()
            .push(0, content(1), Sender::Citizen(0));
        let mut deliver = Schedule::default();
        deliver.add_systems(deliver_pending);
        deliver.run(&mut world);
        assert_eq!(world.resource::<StepTally>().duplicates, 1);
    }
}
