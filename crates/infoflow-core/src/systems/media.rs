//! Media Publication System
//!
//! Each media agent, in id order, rolls its publication gate and queues the
//! new item for every citizen its broadcast reaches. Nothing is published
//! into an empty population.

use bevy_ecs::prelude::*;

use crate::components::content::{ContentLedger, Sender};
use crate::components::media::MediaAgent;
use crate::SimContext;

use super::delivery::{CitizenIndex, DeliveryQueue};
use super::step::SimulationClock;

pub fn publish_media_content(
    media: Query<&MediaAgent>,
    index: Res<CitizenIndex>,
    clock: Res<SimulationClock>,
    mut ctx: ResMut<SimContext>,
    mut ledger: ResMut<ContentLedger>,
    mut queue: ResMut<DeliveryQueue>,
) {
    let population = index.len();
    if population == 0 {
        return;
    }

    let mut outlets: Vec<&MediaAgent> = media.iter().collect();
    outlets.sort_by_key(|m| m.id);

    for outlet in outlets {
        let Some(content) = outlet.publish_content(&mut ledger, clock.current_step, &mut ctx) else {
            continue;
        };
        let targets = outlet.broadcast_targets(population, &mut ctx);

        tracing::trace!(
            media = %outlet.id,
            content = %content.id,
            accuracy = content.accuracy,
            reach = targets.len(),
            "Published content"
        );

        for recipient in targets {
            queue.push(recipient, content.clone(), Sender::Media(outlet.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::content::MediaId;
    use infoflow_events::SourceType;

    #[test]
    fn test_publishing_queues_one_delivery_per_target() {
        let mut world = World::new();
        let entities: Vec<Entity> = (0..10).map(|_| world.spawn_empty().id()).collect();
        world.insert_resource(CitizenIndex::new(entities));
        world.insert_resource(SimulationClock { current_step: 1 });
        world.insert_resource(SimContext::seeded(3));
        world.insert_resource(ContentLedger::new());
        world.insert_resource(DeliveryQueue::new());

        world.spawn(
            MediaAgent::government(MediaId(0))
                .with_publication_rate(1.0)
                .with_influence_reach(0.5),
        );
        world.spawn(MediaAgent::corporate(MediaId(1)).with_publication_rate(0.0));

        let mut schedule = Schedule::default();
        schedule.add_systems(publish_media_content);
        schedule.run(&mut world);

        assert_eq!(world.resource::<DeliveryQueue>().len(), 5);
        let counts = world.resource_mut::<ContentLedger>().take_step_counts();
        assert_eq!(counts.get(&SourceType::Government), Some(&1));
        assert_eq!(counts.get(&SourceType::Corporate), None);
    }

    #[test]
    fn test_no_publication_without_citizens() {
        let mut world = World::new();
        world.insert_resource(CitizenIndex::new(Vec::new()));
        world.insert_resource(SimulationClock { current_step: 1 });
        world.insert_resource(SimContext::seeded(3));
        world.insert_resource(ContentLedger::new());
        world.insert_resource(DeliveryQueue::new());
        world.spawn(MediaAgent::government(MediaId(0)).with_publication_rate(1.0));

        let mut schedule = Schedule::default();
        schedule.add_systems(publish_media_content);
        schedule.run(&mut world);

        assert!(world.resource::<DeliveryQueue>().is_empty());
        assert_eq!(world.resource::<ContentLedger>().total_issued(), 0);
    }
}
