//! Resharing System
//!
//! Every citizen decides, against the state at the start of this phase,
//! whether to pass a remembered item on. Only neighbors that have not seen
//! the item are addressed.

use bevy_ecs::prelude::*;

use crate::components::citizen::Citizen;
use crate::components::content::Sender;
use crate::network::SocialGraph;
use crate::output::stats::StepTally;
use crate::SimContext;

use super::delivery::{CitizenIndex, DeliveryQueue};

pub fn queue_citizen_shares(
    citizens: Query<&Citizen>,
    index: Res<CitizenIndex>,
    graph: Res<SocialGraph>,
    mut ctx: ResMut<SimContext>,
    mut queue: ResMut<DeliveryQueue>,
    mut tally: ResMut<StepTally>,
) {
    let mut sharers: Vec<&Citizen> = citizens.iter().collect();
    sharers.sort_by_key(|c| c.id);

    for citizen in sharers {
        let Some(shared) = citizen.share_information(&mut ctx) else {
            continue;
        };

        let recipients: Vec<usize> = graph
            .neighbors(citizen.id)
            .filter(|&n| {
                index
                    .get(n)
                    .and_then(|entity| citizens.get(entity).ok())
                    .is_some_and(|neighbor| !neighbor.has_seen(shared.id))
            })
            .collect();
        if recipients.is_empty() {
            continue;
        }

        tally.shares += 1;
        tracing::trace!(
            citizen = citizen.id,
            content = %shared.id,
            recipients = recipients.len(),
            "Reshared content"
        );
        for recipient in recipients {
            queue.push(recipient, shared.clone(), Sender::Citizen(citizen.id));
        }
    }
}
