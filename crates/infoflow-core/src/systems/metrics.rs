//! Metrics Collection System
//!
//! Runs last in every step, and once at construction to record step 0.

use bevy_ecs::prelude::*;

use crate::components::citizen::Citizen;
use crate::components::content::ContentLedger;
use crate::output::metrics::measure_population;
use crate::output::stats::{MetricsHistory, MetricsSettings, StepTally};

use super::step::SimulationClock;

pub fn collect_step_metrics(
    citizens: Query<&Citizen>,
    clock: Res<SimulationClock>,
    settings: Res<MetricsSettings>,
    tally: Res<StepTally>,
    mut ledger: ResMut<ContentLedger>,
    mut history: ResMut<MetricsHistory>,
) {
    let mut population: Vec<&Citizen> = citizens.iter().collect();
    population.sort_by_key(|c| c.id);

    let mut metrics = measure_population(
        clock.current_step,
        &population,
        settings.opinion_cluster_threshold,
        settings.ground_truth,
    );
    metrics.content_published = ledger.take_step_counts();
    metrics.accepted = tally.accepted;
    metrics.rejected = tally.rejected;
    metrics.duplicates = tally.duplicates;
    metrics.shares = tally.shares;

    tracing::debug!(
        step = metrics.step,
        avg_belief = metrics.avg_belief,
        polarization = metrics.polarization,
        published = metrics.total_published(),
        accepted = metrics.accepted,
        rejected = metrics.rejected,
        "Step complete"
    );

    if settings.track_agents {
        let step = clock.current_step;
        history.record_snapshots(population.iter().map(|c| c.to_snapshot(step)));
    }
    history.record(metrics);
}
