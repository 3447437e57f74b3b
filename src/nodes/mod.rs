mod executor;
mod node;

pub use executor::RateExecutor;
pub use node::{Node, StepResult};
