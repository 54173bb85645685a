//! Operation metrics: wall-clock duration and, with the `memory-stats` feature, a memory footprint delta.

use std::time::Instant;

use log;
use serde;

/// Metrics of a single operation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Metrics {
    operation: String,
    duration_micros: u64,
    memory_delta_bytes: Option<i64>,
}

impl Metrics {
    pub fn new(operation: &str, duration_micros: u64) -> Self {
        Metrics {
            operation: operation.to_string(),
            duration_micros,
            memory_delta_bytes: None,
        }
    }

    /// Attaches a memory delta to the metrics.
    pub fn with_memory_delta(mut self, bytes: i64) -> Self {
        self.memory_delta_bytes = Some(bytes);
        return self;
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn duration_micros(&self) -> u64 {
        self.duration_micros
    }

    /// Memory delta in bytes, [`None`] if memory was not accounted.
    pub fn memory_delta_bytes(&self) -> Option<i64> {
        self.memory_delta_bytes
    }
}

/// Operation result together with its metrics.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Measured<T> {
    pub value: T,
    pub metrics: Metrics,
}

/// Runs `f` and records its wall-clock duration using a monotonic clock.
pub fn measure<T, F>(operation: &str, f: F) -> Measured<T>
where
    F: FnOnce() -> T,
{
    log::debug!("{} started", operation);

    let started = Instant::now();
    let value = f();
    let elapsed = started.elapsed();
    let duration_micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

    log::debug!("{} finished in {}us", operation, duration_micros);

    Measured {
        value,
        metrics: Metrics::new(operation, duration_micros),
    }
}

#[cfg(feature = "memory-stats")]
pub use self::footprint::{measure_footprint, Footprint};

#[cfg(feature = "memory-stats")]
mod footprint {
    use deepsize;
    use log;

    use super::{measure, Measured};

    /// Deep memory footprint of a value: its own size plus everything it owns on the heap.
    pub trait Footprint {
        fn footprint(&self) -> usize;
    }

    impl<T> Footprint for T
    where
        T: deepsize::DeepSizeOf,
    {
        fn footprint(&self) -> usize {
            self.deep_size_of()
        }
    }

    /// Runs `f` over `subject` and records the duration and the footprint change of `subject`.
    pub fn measure_footprint<S, T, F>(operation: &str, subject: &mut S, f: F) -> Measured<T>
    where
        S: Footprint,
        F: FnOnce(&mut S) -> T,
    {
        let before = subject.footprint();
        let mut measured = measure(operation, || f(subject));
        let after = subject.footprint();

        let delta = after as i64 - before as i64;
        log::debug!("{} footprint: {} -> {} bytes", operation, before, after);

        measured.metrics = measured.metrics.with_memory_delta(delta);
        return measured;
    }
}

#[cfg(test)]
mod test {
    use std::thread;
    use std::time::Duration;

    use super::{measure, Metrics};

    #[test]
    fn test_measure_returns_value() {
        let measured = measure("sum", || (1..=10).sum::<u32>());

        assert_eq!(measured.value, 55);
        assert_eq!(measured.metrics.operation(), "sum");
        assert_eq!(measured.metrics.memory_delta_bytes(), None);
    }

    #[test]
    fn test_measure_duration() {
        let measured = measure("sleep", || thread::sleep(Duration::from_millis(5)));

        assert!(measured.metrics.duration_micros() >= 5_000);
    }

    #[test]
    fn test_memory_delta() {
        let metrics = Metrics::new("op", 10).with_memory_delta(-128);

        assert_eq!(metrics.memory_delta_bytes(), Some(-128));
        assert_eq!(metrics.duration_micros(), 10);
    }

    #[cfg(feature = "memory-stats")]
    #[test]
    fn test_measure_footprint() {
        use super::{measure_footprint, Footprint};
        use crate::record::{Article, Label};
        use crate::store::{ArrayStore, RecordStore};

        let mut store = ArrayStore::new(100);
        let before = store.footprint();

        let measured = measure_footprint("load", &mut store, |store| {
            store.load((0..10).map(|i| Article::new(format!("title {}", i), "body", "News", "NA", Label::True)))
        });

        assert_eq!(measured.value, 10);
        assert!(store.footprint() > before);
        assert_eq!(
            measured.metrics.memory_delta_bytes(),
            Some(store.footprint() as i64 - before as i64)
        );
    }
}
