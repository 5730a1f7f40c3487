//! Trace input handling.
//!
//! Traces are CSV files with a header line naming the columns `key`,
//! `size`, `op` and `op_count` in any order; extra columns are ignored.
//! `op` is matched on its first character ('G' = GET, 'D' = DELETE) and
//! `op_count` expands a record into that many identical requests.
//!
//! The reader streams requests across multiple files in sorted
//! lexicographic order. GET records above [`MAX_GET_SIZE`] are dropped by
//! the workload filter; DELETE records are always admitted. Malformed
//! records (missing column, non-integer field, `op_count` of zero) are
//! skipped with a warning and processing continues.

use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

/// Largest object size a GET record may declare before it is filtered out.
pub const MAX_GET_SIZE: u32 = 2048;

/// One request handed to the cache coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Object key.
    pub key: String,
    /// Declared object size in bytes (total size, key bytes included).
    pub size: u32,
    /// GET if true, DELETE otherwise.
    pub is_get: bool,
}

/// One parsed CSV row, before filtering and expansion.
#[derive(Debug, Deserialize)]
struct RawRecord {
    key: String,
    size: u32,
    op: String,
    op_count: u32,
}

/// Streaming reader over one or more trace files.
pub struct TraceReader {
    paths: Vec<PathBuf>,
    next_path: usize,
    records: Option<csv::DeserializeRecordsIntoIter<File, RawRecord>>,
    /// Remaining repetitions of the most recent record.
    pending: Option<(Request, u32)>,
}

impl TraceReader {
    /// Sorts the given paths and verifies every file can be opened, so that
    /// open failures surface before the run starts.
    pub fn open(paths: &[PathBuf]) -> io::Result<Self> {
        let mut paths = paths.to_vec();
        paths.sort();
        for path in &paths {
            File::open(path)?;
        }
        Ok(Self {
            paths,
            next_path: 0,
            records: None,
            pending: None,
        })
    }

    fn advance_file(&mut self) -> Option<()> {
        let path = self.paths.get(self.next_path)?.clone();
        self.next_path += 1;
        info!("processing trace file: {}", path.display());
        match csv::Reader::from_path(&path) {
            Ok(reader) => self.records = Some(reader.into_deserialize()),
            Err(err) => warn!(%err, path = %path.display(), "skipping unreadable trace file"),
        }
        Some(())
    }

    /// Workload filter: small-enough GETs and all DELETEs pass.
    fn admit(raw: &RawRecord) -> Option<Request> {
        match raw.op.as_bytes().first() {
            Some(b'G') if raw.size <= MAX_GET_SIZE => Some(Request {
                key: raw.key.clone(),
                size: raw.size,
                is_get: true,
            }),
            Some(b'D') => Some(Request {
                key: raw.key.clone(),
                size: raw.size,
                is_get: false,
            }),
            _ => None,
        }
    }
}

impl Iterator for TraceReader {
    type Item = Request;

    fn next(&mut self) -> Option<Request> {
        loop {
            if let Some((request, remaining)) = &mut self.pending {
                let request = request.clone();
                *remaining -= 1;
                if *remaining == 0 {
                    self.pending = None;
                }
                return Some(request);
            }

            if self.records.is_none() {
                self.advance_file()?;
                continue;
            }
            let Some(records) = self.records.as_mut() else {
                continue;
            };

            match records.next() {
                None => {
                    self.records = None;
                }
                Some(Err(err)) => {
                    warn!(%err, "skipping malformed trace record");
                }
                Some(Ok(raw)) => {
                    if raw.op_count == 0 {
                        warn!(key = %raw.key, "skipping record with op_count = 0");
                        continue;
                    }
                    if let Some(request) = Self::admit(&raw) {
                        self.pending = Some((request, raw.op_count));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn trace_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn collect(paths: &[PathBuf]) -> Vec<Request> {
        TraceReader::open(paths).unwrap().collect()
    }

    #[test]
    fn test_reads_gets_and_deletes() {
        let dir = TempDir::new().unwrap();
        let path = trace_file(
            &dir,
            "t.csv",
            "key,size,op,op_count\n\
             a,100,GET,1\n\
             a,0,DELETE,1\n",
        );

        let requests = collect(&[path]);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], Request { key: "a".into(), size: 100, is_get: true });
        assert!(!requests[1].is_get);
    }

    #[test]
    fn test_header_columns_in_any_order() {
        let dir = TempDir::new().unwrap();
        let path = trace_file(
            &dir,
            "t.csv",
            "op,op_count,key,size\n\
             GET,1,a,77\n",
        );

        let requests = collect(&[path]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, "a");
        assert_eq!(requests[0].size, 77);
    }

    #[test]
    fn test_op_count_expands_records() {
        let dir = TempDir::new().unwrap();
        let path = trace_file(
            &dir,
            "t.csv",
            "key,size,op,op_count\n\
             a,10,GET,3\n\
             b,10,GET,1\n",
        );

        let requests = collect(&[path]);
        let keys: Vec<&str> = requests.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["a", "a", "a", "b"]);
    }

    #[test]
    fn test_oversized_gets_are_filtered() {
        let dir = TempDir::new().unwrap();
        let path = trace_file(
            &dir,
            "t.csv",
            "key,size,op,op_count\n\
             huge,10000,GET,1\n\
             edge,2048,GET,1\n\
             above,2049,GET,1\n",
        );

        let requests = collect(&[path]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, "edge");
    }

    #[test]
    fn test_deletes_are_never_size_filtered() {
        let dir = TempDir::new().unwrap();
        let path = trace_file(
            &dir,
            "t.csv",
            "key,size,op,op_count\n\
             huge,10000,DELETE,1\n",
        );

        let requests = collect(&[path]);
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].is_get);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = trace_file(
            &dir,
            "t.csv",
            "key,size,op,op_count\n\
             a,not-a-number,GET,1\n\
             b,10\n\
             c,10,GET,0\n\
             d,10,GET,1\n",
        );

        let requests = collect(&[path]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, "d");
    }

    #[test]
    fn test_unknown_ops_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = trace_file(
            &dir,
            "t.csv",
            "key,size,op,op_count\n\
             a,10,SET,1\n\
             b,10,GET,1\n",
        );

        let requests = collect(&[path]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, "b");
    }

    #[test]
    fn test_files_are_replayed_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let second = trace_file(&dir, "trace-01.csv", "key,size,op,op_count\nb,10,GET,1\n");
        let first = trace_file(&dir, "trace-00.csv", "key,size,op,op_count\na,10,GET,1\n");

        // Paths handed over in the wrong order on purpose.
        let requests = collect(&[second, first]);
        let keys: Vec<&str> = requests.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_missing_file_fails_at_open() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(TraceReader::open(&[missing]).is_err());
    }
}
