use std::time::{Duration, Instant};

/// Named wall-clock timings for the generator pipeline (`--time`).
#[derive(Debug, Default)]
pub struct Profiler {
    phases: Vec<PhaseTiming>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_phase<F, T>(&mut self, name: impl Into<String>, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let name = name.into();
        let start = Instant::now();
        let output = f();
        self.phases.push(PhaseTiming {
            name,
            duration: start.elapsed(),
        });
        output
    }

    pub fn phases(&self) -> &[PhaseTiming] {
        &self.phases
    }

    pub fn total(&self) -> Duration {
        self.phases.iter().map(|phase| phase.duration).sum()
    }
}

#[derive(Clone, Debug)]
pub struct PhaseTiming {
    pub name: String,
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_recorded_in_order() {
        let mut profiler = Profiler::new();
        let value = profiler.record_phase("Load model", || 41 + 1);
        profiler.record_phase("Generate", || ());

        assert_eq!(value, 42);
        let names: Vec<&str> = profiler.phases().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Load model", "Generate"]);
        assert!(profiler.total() >= profiler.phases()[0].duration);
    }
}
