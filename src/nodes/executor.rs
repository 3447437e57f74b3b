use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use log::debug;

use super::{Node, StepResult};

/// Steps registered nodes in order at a fixed rate on the calling thread.
///
/// Each cycle runs every node once, then sleeps until the next deadline.
/// Deadlines advance by a fixed period so a single slow cycle does not shift
/// the schedule. The loop stops when a node returns [`StepResult::Stop`],
/// when a node errors, or when the cancel flag is raised.
pub struct RateExecutor {
    period: Duration,
    nodes: Vec<(String, Box<dyn Node + Send>)>,
    cancel: Arc<AtomicBool>,
}

impl RateExecutor {
    pub fn new(rate_hz: f64) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / rate_hz),
            nodes: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn add_node(&mut self, name: &str, node: Box<dyn Node + Send>) {
        self.nodes.push((name.to_string(), node));
    }

    /// Flag shared with signal handlers. Storing `true` makes the loop exit
    /// at the next cycle boundary.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn run_blocking(&mut self) -> Result<()> {
        let mut deadline = Instant::now() + self.period;

        while !self.cancel.load(Ordering::Relaxed) {
            for (name, node) in self.nodes.iter_mut() {
                let result = node
                    .step()
                    .with_context(|| format!("node '{name}' failed"))?;

                if result == StepResult::Stop {
                    debug!("node '{name}' requested stop");
                    return Ok(());
                }
            }

            let now = Instant::now();
            if now < deadline {
                thread::sleep(deadline - now);
            } else {
                debug!("cycle overran by {:?}", now - deadline);
            }
            deadline += self.period;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use anyhow::bail;

    use super::*;

    struct CountdownNode {
        remaining: usize,
        count: Arc<AtomicUsize>,
    }

    impl Node for CountdownNode {
        fn step(&mut self) -> Result<StepResult> {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.remaining -= 1;

            Ok(if self.remaining == 0 {
                StepResult::Stop
            } else {
                StepResult::Continue
            })
        }
    }

    struct FailingNode;

    impl Node for FailingNode {
        fn step(&mut self) -> Result<StepResult> {
            bail!("broken")
        }
    }

    #[test]
    fn test_runs_until_stop() {
        let count = Arc::new(AtomicUsize::new(0));

        let mut exec = RateExecutor::new(1000.0);
        exec.add_node(
            "countdown",
            Box::new(CountdownNode {
                remaining: 5,
                count: count.clone(),
            }),
        );

        exec.run_blocking().unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_node_error_names_the_node() {
        let mut exec = RateExecutor::new(1000.0);
        exec.add_node("flaky", Box::new(FailingNode));

        let err = exec.run_blocking().unwrap_err();

        assert!(format!("{err:#}").contains("node 'flaky' failed"));
    }

    #[test]
    fn test_cancel_token_stops_the_loop() {
        struct IdleNode;
        impl Node for IdleNode {
            fn step(&mut self) -> Result<StepResult> {
                Ok(StepResult::Continue)
            }
        }

        let mut exec = RateExecutor::new(1000.0);
        exec.add_node("idle", Box::new(IdleNode));

        let cancel = exec.cancel_token();
        let exec = Arc::new(Mutex::new(exec));

        let handle = {
            let exec = exec.clone();
            thread::spawn(move || exec.lock().unwrap().run_blocking())
        };

        thread::sleep(Duration::from_millis(20));
        cancel.store(true, Ordering::Relaxed);

        handle.join().unwrap().unwrap();
    }
}
