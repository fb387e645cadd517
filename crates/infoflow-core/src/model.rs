//! Simulation Model
//!
//! Owns the ECS world and the per-step schedule, and exposes the run as a
//! plain `step()`/`run()` API.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rand::Rng;
use std::path::Path;

use infoflow_events::{CitizenSnapshot, RunSummary, StepMetrics};

use crate::components::citizen::Citizen;
use crate::components::content::ContentLedger;
use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::network::{self, SocialGraph};
use crate::output::stats::{
    write_metrics_file, write_snapshots_file, MetricsHistory, MetricsSettings, StepTally,
};
use crate::setup::{get_spawn_summary, spawn_citizens, spawn_media};
use crate::systems::{
    apply_social_influence, begin_step, capture_belief_snapshot, collect_step_metrics,
    deliver_pending, forget_unreachable_content, publish_media_content, queue_citizen_shares,
    seek_information, BeliefSnapshot, CitizenIndex, DeliveryQueue, SimulationClock, StepFaults,
};
use crate::SimContext;

/// A configured, seeded simulation run.
pub struct InfoFlowModel {
    world: World,
    schedule: Schedule,
    config: ScenarioConfig,
    seed: u64,
    /// Set once a step fails; the run cannot continue afterwards
    failure: Option<String>,
}

impl InfoFlowModel {
    /// Builds the network and population and records the step 0 metrics.
    pub fn create(config: &ScenarioConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;

        let mut ctx = SimContext::new(seed, config.tuning.clone());
        let network_seed: u64 = ctx.rng.gen();
        let graph = network::build(
            config.network_type,
            config.num_citizens,
            &config.network_params(),
            network_seed,
        )?;

        let mut world = World::new();
        let citizens = spawn_citizens(&mut world, config, &mut ctx)?;
        spawn_media(&mut world, config, &mut ctx);
        let summary = get_spawn_summary(&mut world);

        tracing::info!(
            seed,
            network = %config.network_type,
            citizens = summary.citizens,
            edges = graph.edge_count(),
            media = config.num_media(),
            followers = summary.total_followers,
            "Created simulation model"
        );

        world.insert_resource(ctx);
        world.insert_resource(graph);
        world.insert_resource(CitizenIndex::new(citizens));
        world.insert_resource(ContentLedger::new());
        world.insert_resource(DeliveryQueue::new());
        world.insert_resource(BeliefSnapshot::default());
        world.insert_resource(SimulationClock::default());
        world.insert_resource(StepFaults::default());
        world.insert_resource(StepTally::default());
        world.insert_resource(MetricsSettings {
            opinion_cluster_threshold: config.opinion_cluster_threshold,
            ground_truth: config.ground_truth,
            track_agents: config.track_agents,
        });
        world.insert_resource(MetricsHistory::new());

        // Step 0: the population as initialized
        let mut initial = Schedule::default();
        initial.add_systems(collect_step_metrics);
        initial.run(&mut world);

        Ok(Self {
            world,
            schedule: build_step_schedule(),
            config: config.clone(),
            seed,
            failure: None,
        })
    }

    /// Advances exactly one step and returns its metrics.
    pub fn step(&mut self) -> Result<&StepMetrics, SimError> {
        if let Some(detail) = &self.failure {
            return Err(SimError::Inconsistent {
                step: self.current_step(),
                detail: detail.clone(),
            });
        }

        self.schedule.run(&mut self.world);

        let step = self.current_step();
        if let Some(detail) = self.world.resource_mut::<StepFaults>().drain_message() {
            tracing::error!(step, %detail, "Step left the simulation inconsistent");
            self.failure = Some(detail.clone());
            return Err(SimError::Inconsistent { step, detail });
        }

        self.world
            .resource::<MetricsHistory>()
            .latest()
            .filter(|m| m.step == step)
            .ok_or_else(|| SimError::Inconsistent {
                step,
                detail: "no metrics recorded for step".to_string(),
            })
    }

    /// Runs `steps` steps, stopping at the first failure.
    pub fn run(&mut self, steps: u64) -> Result<(), SimError> {
        for _ in 0..steps {
            self.step()?;
        }
        let summary = self.summary();
        tracing::info!(
            steps = summary.steps,
            avg_belief = summary.last.avg_belief,
            polarization = summary.last.polarization,
            published = summary.total_published,
            accepted = summary.total_accepted,
            "Run finished"
        );
        Ok(())
    }

    pub fn current_step(&self) -> u64 {
        self.world.resource::<SimulationClock>().current_step
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Metrics of every step so far, starting with step 0.
    pub fn metrics(&self) -> &[StepMetrics] {
        self.world.resource::<MetricsHistory>().steps()
    }

    pub fn latest_metrics(&self) -> Option<&StepMetrics> {
        self.world.resource::<MetricsHistory>().latest()
    }

    /// Per-citizen history; empty unless `track_agents` is set.
    pub fn citizen_snapshots(&self) -> &[CitizenSnapshot] {
        self.world.resource::<MetricsHistory>().snapshots()
    }

    pub fn graph(&self) -> &SocialGraph {
        self.world.resource::<SocialGraph>()
    }

    /// Current citizens in id order.
    pub fn citizens(&mut self) -> Vec<Citizen> {
        let mut citizens: Vec<Citizen> = self
            .world
            .query::<&Citizen>()
            .iter(&self.world)
            .cloned()
            .collect();
        citizens.sort_by_key(|c| c.id);
        citizens
    }

    /// Applies `f` to every citizen, e.g. to stage an experiment.
    pub fn update_citizens(&mut self, mut f: impl FnMut(&mut Citizen)) {
        let mut query = self.world.query::<&mut Citizen>();
        for mut citizen in query.iter_mut(&mut self.world) {
            f(&mut *citizen);
        }
    }

    /// The underlying ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn summary(&self) -> RunSummary {
        let history = self.world.resource::<MetricsHistory>();
        let initial = history
            .first()
            .cloned()
            .unwrap_or_else(|| StepMetrics::empty(0));
        let last = history.latest().cloned().unwrap_or_else(|| initial.clone());

        RunSummary {
            seed: self.seed,
            steps: self.current_step(),
            num_citizens: self.config.num_citizens,
            num_media: self.config.num_media(),
            initial,
            last,
            total_published: history.total_published(),
            total_accepted: history.total_accepted(),
        }
    }

    /// Writes every recorded step as JSON lines.
    pub fn write_metrics(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        write_metrics_file(self.metrics(), path)?;
        Ok(())
    }

    /// Writes every tracked citizen snapshot as JSON lines.
    ///
    /// The file is empty unless the scenario sets `track_agents`.
    pub fn write_snapshots(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        write_snapshots_file(self.citizen_snapshots(), path)?;
        Ok(())
    }
}

/// The fixed per-step activation order.
fn build_step_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            begin_step,
            forget_unreachable_content,
            capture_belief_snapshot,
            publish_media_content,
            deliver_pending,
            apply_social_influence,
            seek_information,
            deliver_pending,
            queue_citizen_shares,
            deliver_pending,
            collect_step_metrics,
        )
            .chain(),
    );
    schedule
}
