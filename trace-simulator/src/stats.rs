//! Periodic statistics reporting.
//!
//! The driver samples the cache's cumulative [`Stat`] before every request
//! and hands it to the reporter, which appends one CSV row whenever the
//! access count crosses another reporting interval. Windowed ratios (the
//! difference between the current and the previously reported sample) are
//! emitted as a log line alongside each row.

use flashtier::Stat;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// A CSV row is written every this many accesses.
pub const REPORT_INTERVAL: u64 = 500_000;

/// One row of the statistics CSV. Field order matches the header written
/// by [`StatReporter::create`].
#[derive(Debug, Serialize)]
struct StatRow {
    num_access: u64,
    num_hit: u64,
    num_dram_access: u64,
    num_dram_hit: u64,
    num_fifo_access: u64,
    num_fifo_hit: u64,
    num_fifo_overwritten_hits: u64,
}

impl From<&Stat> for StatRow {
    fn from(stat: &Stat) -> Self {
        Self {
            num_access: stat.num_accesses,
            num_hit: stat.num_hits,
            num_dram_access: stat.num_dram_accesses,
            num_dram_hit: stat.num_dram_hits,
            num_fifo_access: stat.num_fifo_accesses,
            num_fifo_hit: stat.num_fifo_hits,
            num_fifo_overwritten_hits: stat.num_fifo_overwritten_hits,
        }
    }
}

/// Writes the periodic statistics CSV.
pub struct StatReporter {
    writer: csv::Writer<File>,
    /// Sample at the previous report, for windowed ratios.
    prev: Stat,
    /// Access count of the previous report, so a crossing reports once.
    last_reported: u64,
}

impl StatReporter {
    /// Creates (truncating) the statistics file and writes the header.
    pub fn create<P: AsRef<Path>>(path: P) -> csv::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record([
            "numAccess",
            "numHit",
            "numDramAccess",
            "numDramHit",
            "numFifoAccess",
            "numFifoHit",
            "numFifoOverWrittenHits",
        ])?;
        writer.flush()?;
        Ok(Self {
            writer,
            prev: Stat::default(),
            last_reported: 0,
        })
    }

    /// Appends a row if the access count sits on a new reporting interval.
    pub fn maybe_report(&mut self, stat: &Stat) -> csv::Result<()> {
        if stat.num_accesses == self.last_reported || stat.num_accesses % REPORT_INTERVAL != 0 {
            return Ok(());
        }
        self.report(stat)
    }

    fn report(&mut self, stat: &Stat) -> csv::Result<()> {
        let window = *stat - self.prev;
        info!(
            "miss ratio: {:.2}, overwritten hit ratio: {:.2}",
            window.miss_ratio(),
            window.overwritten_hit_ratio()
        );

        self.writer.serialize(StatRow::from(stat))?;
        self.writer.flush()?;
        self.prev = *stat;
        self.last_reported = stat.num_accesses;
        Ok(())
    }

    /// Flushes buffered rows.
    pub fn flush(&mut self) -> csv::Result<()> {
        Ok(self.writer.flush()?)
    }
}
