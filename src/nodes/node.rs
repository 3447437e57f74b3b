use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Stop,
}

/// A unit of periodic work driven by an executor. `step` is called once per
/// cycle and must not block for longer than the cycle period.
pub trait Node {
    fn step(&mut self) -> Result<StepResult>;
}
