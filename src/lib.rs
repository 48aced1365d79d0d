pub mod cascade;
pub mod graph;
pub mod introduction;
pub mod layout;
pub mod scenario;
pub mod session;
pub mod snapshot;
pub mod web;

pub use cascade::extinguish;
pub use graph::{FoodWeb, GraphError, WebSnapshot};
pub use scenario::{Scenario, ScenarioLoader};
pub use session::{Command, Session, SessionSettings, StepOutcome};
