//! ECS Systems
//!
//! One system per phase of a step. The model chains them in this order:
//! begin, forget, snapshot, publish, deliver, influence, seek, deliver,
//! share, deliver, collect.

pub mod delivery;
pub mod influence;
pub mod media;
pub mod metrics;
pub mod seeking;
pub mod sharing;
pub mod step;

pub use delivery::{
    deliver_pending, forget_unreachable_content, CitizenIndex, Delivery, DeliveryQueue,
};
pub use influence::{apply_social_influence, capture_belief_snapshot, BeliefSnapshot};
pub use media::publish_media_content;
pub use metrics::collect_step_metrics;
pub use seeking::seek_information;
pub use sharing::queue_citizen_shares;
pub use step::{begin_step, SimulationClock, StepFaults};
