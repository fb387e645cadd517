//! Information Seeking System
//!
//! Citizens with a strong truth-seeking disposition (either sign) may pull a
//! fresh item from a media source of their choosing. The pulled item goes
//! through the ordinary acceptance pipeline.

use bevy_ecs::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};

use crate::components::citizen::Citizen;
use crate::components::content::{ContentLedger, Sender};
use crate::components::media::MediaAgent;
use crate::SimContext;

use super::delivery::DeliveryQueue;
use super::step::SimulationClock;

pub fn seek_information(
    citizens: Query<&Citizen>,
    media: Query<&MediaAgent>,
    clock: Res<SimulationClock>,
    mut ctx: ResMut<SimContext>,
    mut ledger: ResMut<ContentLedger>,
    mut queue: ResMut<DeliveryQueue>,
) {
    let mut sources: Vec<&MediaAgent> = media.iter().collect();
    if sources.is_empty() {
        return;
    }
    sources.sort_by_key(|m| m.id);

    let mut seekers: Vec<&Citizen> = citizens.iter().collect();
    seekers.sort_by_key(|c| c.id);

    for citizen in seekers {
        if !citizen.wants_to_seek(&mut ctx) {
            continue;
        }
        let weights: Vec<f64> = sources.iter().map(|m| citizen.seek_weight(m)).collect();
        // All-zero weights: nobody worth asking
        let Ok(choice) = WeightedIndex::new(&weights) else {
            continue;
        };
        let source = sources[choice.sample(&mut ctx.rng)];

        let id = ledger.issue(source.source_type());
        let content = source.create_content(id, clock.current_step, &mut ctx);
        tracing::trace!(
            citizen = citizen.id,
            media = %source.id,
            content = %content.id,
            "Sought content"
        );
        queue.push(citizen.id, content, Sender::Media(source.id));
    }
}
