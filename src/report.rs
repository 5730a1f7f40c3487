//! Analytics record streams emitted by the flash tier.
//!
//! The tier produces two append-only streams:
//!
//! - one **overwritten** record per entry evicted by a segment clear;
//! - one **overwritten-accessed** record per lookup that landed in the
//!   overwritten side-table.
//!
//! The tier only produces the records; the writer is an injected
//! [`EvictionLog`] implementation. [`FileEvictionLog`] renders each record as
//! one space-separated text line, truncating the files at startup and
//! holding them for the lifetime of the run. [`MemoryEvictionLog`] captures
//! records for inspection and backs the test suites.

use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

/// One entry evicted by a segment clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverwrittenRecord {
    /// Global segment pointer of the segment occurrence the entry was
    /// written into (`rotation * num_segments + seg_id`).
    pub global_segment_ptr: u64,
    /// Flash hits the entry received while resident.
    pub num_accesses: u32,
    /// DRAM access count recorded the first time the key was spilled.
    pub first_dram_access_count: u32,
    /// Distance between the key's last two touches of the flash tier, in
    /// global segment pointer units; 0 if the key was only touched once.
    pub reuse_distance: u64,
}

impl fmt::Display for OverwrittenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.global_segment_ptr, self.num_accesses, self.first_dram_access_count,
            self.reuse_distance
        )
    }
}

/// One lookup resolved by the overwritten side-table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverwrittenAccessRecord {
    /// Segment occurrences between the entry's eviction position and the
    /// current write pointer.
    pub segment_distance: u64,
    /// Flash hits the entry had received before it was overwritten.
    pub num_accesses_before: u32,
}

impl fmt::Display for OverwrittenAccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.segment_distance, self.num_accesses_before)
    }
}

/// Writer for the two analytics streams.
///
/// Implementations must preserve record order within each stream.
pub trait EvictionLog {
    /// Appends a record to the overwritten stream.
    fn overwritten(&mut self, record: &OverwrittenRecord) -> io::Result<()>;

    /// Appends a record to the overwritten-accessed stream.
    fn overwritten_accessed(&mut self, record: &OverwrittenAccessRecord) -> io::Result<()>;

    /// Flushes any buffered records to the underlying sinks.
    fn flush(&mut self) -> io::Result<()>;
}

/// File-backed sink writing one text line per record.
pub struct FileEvictionLog {
    overwritten: BufWriter<File>,
    accessed: BufWriter<File>,
}

impl FileEvictionLog {
    /// Creates (truncating) both log files.
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(
        overwritten_path: P,
        accessed_path: Q,
    ) -> io::Result<Self> {
        Ok(Self {
            overwritten: BufWriter::new(File::create(overwritten_path)?),
            accessed: BufWriter::new(File::create(accessed_path)?),
        })
    }
}

impl EvictionLog for FileEvictionLog {
    fn overwritten(&mut self, record: &OverwrittenRecord) -> io::Result<()> {
        writeln!(self.overwritten, "{record}")
    }

    fn overwritten_accessed(&mut self, record: &OverwrittenAccessRecord) -> io::Result<()> {
        writeln!(self.accessed, "{record}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.overwritten.flush()?;
        self.accessed.flush()
    }
}

/// Captured contents of a [`MemoryEvictionLog`].
#[derive(Debug, Default)]
pub struct RecordedStreams {
    /// Records appended to the overwritten stream, in order.
    pub overwritten: Vec<OverwrittenRecord>,
    /// Records appended to the overwritten-accessed stream, in order.
    pub accessed: Vec<OverwrittenAccessRecord>,
}

/// In-memory sink that keeps every record for later inspection.
///
/// Clones share the same backing storage, so a test can keep one handle
/// while handing the other to the cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryEvictionLog {
    streams: Rc<RefCell<RecordedStreams>>,
}

impl MemoryEvictionLog {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the overwritten stream.
    pub fn overwritten(&self) -> Vec<OverwrittenRecord> {
        self.streams.borrow().overwritten.clone()
    }

    /// Snapshot of the overwritten-accessed stream.
    pub fn accessed(&self) -> Vec<OverwrittenAccessRecord> {
        self.streams.borrow().accessed.clone()
    }
}

impl EvictionLog for MemoryEvictionLog {
    fn overwritten(&mut self, record: &OverwrittenRecord) -> io::Result<()> {
        self.streams.borrow_mut().overwritten.push(*record);
        Ok(())
    }

    fn overwritten_accessed(&mut self, record: &OverwrittenAccessRecord) -> io::Result<()> {
        self.streams.borrow_mut().accessed.push(*record);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_line_formats() {
        let record = OverwrittenRecord {
            global_segment_ptr: 17,
            num_accesses: 3,
            first_dram_access_count: 2,
            reuse_distance: 5,
        };
        assert_eq!(record.to_string(), "17 3 2 5");

        let record = OverwrittenAccessRecord {
            segment_distance: 4,
            num_accesses_before: 1,
        };
        assert_eq!(record.to_string(), "4 1");
    }

    #[test]
    fn test_memory_log_shares_storage_across_clones() {
        let log = MemoryEvictionLog::new();
        let mut writer = log.clone();
        EvictionLog::overwritten(
            &mut writer,
            &OverwrittenRecord {
                global_segment_ptr: 1,
                num_accesses: 0,
                first_dram_access_count: 0,
                reuse_distance: 0,
            },
        )
        .unwrap();
        EvictionLog::overwritten_accessed(
            &mut writer,
            &OverwrittenAccessRecord {
                segment_distance: 1,
                num_accesses_before: 0,
            },
        )
        .unwrap();

        assert_eq!(log.overwritten().len(), 1);
        assert_eq!(log.accessed().len(), 1);
        assert_eq!(log.overwritten()[0].global_segment_ptr, 1);
    }
}
