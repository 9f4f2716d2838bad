use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use common::protocol::Label;
use tokio::{task::JoinHandle, time::interval};

pub static METER: Meter = Meter::new();

/// Counters of served classification requests since the last report.
#[derive(Default)]
pub struct Meter {
    human: AtomicU64,
    not_human: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of the counters.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct MeterCounts {
    pub human: u64,
    pub not_human: u64,
    pub failed: u64,
}

impl MeterCounts {
    pub fn total(&self) -> u64 {
        self.human + self.not_human + self.failed
    }
}

impl Meter {
    pub const fn new() -> Meter {
        Meter {
            human: AtomicU64::new(0),
            not_human: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn tick_verdict(&self, label: Label) {
        match label {
            Label::Human => self.human.fetch_add(1, Ordering::Relaxed),
            Label::NotHuman => self.not_human.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn tick_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_reset(&self) -> MeterCounts {
        MeterCounts {
            human: self.human.swap(0, Ordering::Relaxed),
            not_human: self.not_human.swap(0, Ordering::Relaxed),
            failed: self.failed.swap(0, Ordering::Relaxed),
        }
    }
}

pub fn spawn_meter_logger(period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut log_interval = interval(period);
        log_interval.tick().await;

        loop {
            let start = Instant::now();
            log_interval.tick().await;

            let counts = METER.get_reset();
            let elapsed = start.elapsed().as_secs_f32();

            if counts.total() > 0 {
                log::info!(
                    "Classified {} human, {} not human, {} failed in {elapsed:.1}s",
                    counts.human,
                    counts.not_human,
                    counts.failed
                )
            }
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_counts_reset_on_read() {
        let meter = Meter::new();
        meter.tick_verdict(Label::Human);
        meter.tick_verdict(Label::NotHuman);
        meter.tick_verdict(Label::NotHuman);
        meter.tick_failed();

        let counts = meter.get_reset();
        assert_eq!(
            counts,
            MeterCounts {
                human: 1,
                not_human: 2,
                failed: 1
            }
        );
        assert_eq!(counts.total(), 4);
        assert_eq!(meter.get_reset(), MeterCounts::default());
    }
}
