//! End-of-event recording of hit maps into one shared text file.

use crate::assembly::FuelRodStatus;
use crate::error::Result;
use crate::hit::HitsMap;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub const COLUMN_HEADER: &str = "# evtID\tParticleWeight\t\
DetID1\tX1(mm)\tY1(mm)\tZ1(mm)\tE1(MeV)\tT1(ns)\t\
DetID2\tX2(mm)\tY2(mm)\tZ2(mm)\tE2(MeV)\tT2(ns)\t";

/// Scientific notation with a signed two-digit exponent, as printf's `%.Ne`.
pub fn format_scientific(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

/// One output line for an event, or None when fewer than `min_hits` detectors fired.
pub fn format_event_line(event_id: u64, hits: &HitsMap, min_hits: usize) -> Option<String> {
    let first = hits.values().next()?;
    if hits.len() < min_hits.max(1) {
        return None;
    }
    let mut line = format!("{}\t{}\t", event_id, format_scientific(first.weight, 5));
    for (copy_no, hit) in hits {
        // writing into a String cannot fail
        let _ = write!(
            line,
            "{}\t{:.1}\t{:.1}\t{:.1}\t{:.3}\t{:.3}\t",
            copy_no, hit.position.x, hit.position.y, hit.position.z, hit.edep, hit.time
        );
    }
    line.push('\n');
    Some(line)
}

/// Shared sink for event lines. All access to the writer goes through the mutex.
#[derive(Debug)]
pub struct EventRecorder<W: Write + Send = BufWriter<File>> {
    sink: Mutex<Option<W>>,
    min_hits: usize,
}

impl EventRecorder<BufWriter<File>> {
    /// Open `path` for appending and write the fuel rod status and column header.
    pub fn open<P: AsRef<Path>>(path: P, status: &FuelRodStatus, min_hits: usize) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!("Recording events to {}", path.display());
        EventRecorder::from_writer(BufWriter::new(file), status, min_hits)
    }
}

impl<W: Write + Send> EventRecorder<W> {
    pub fn from_writer(writer: W, status: &FuelRodStatus, min_hits: usize) -> Result<Self> {
        let recorder = EventRecorder {
            sink: Mutex::new(Some(writer)),
            min_hits,
        };
        {
            let mut guard = recorder.lock();
            if let Some(out) = guard.as_mut() {
                status.write_status(out)?;
                writeln!(out, "{}", COLUMN_HEADER)?;
            }
        }
        Ok(recorder)
    }

    pub fn min_hits(&self) -> usize {
        self.min_hits
    }

    fn lock(&self) -> MutexGuard<'_, Option<W>> {
        // a panicked writer thread leaves the file usable
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append the event's line. Returns whether a line was written.
    pub fn record(&self, event_id: u64, hits: &HitsMap) -> Result<bool> {
        let Some(line) = format_event_line(event_id, hits, self.min_hits) else {
            return Ok(false);
        };
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(out) => {
                out.write_all(line.as_bytes())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(out) = self.lock().as_mut() {
            out.flush()?;
        }
        Ok(())
    }

    /// Flush and release the writer; later records are dropped.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.lock();
        if let Some(mut out) = guard.take() {
            out.flush()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> Option<W> {
        self.sink.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Hit;
    use crate::Vec3;

    fn two_hits() -> HitsMap {
        let mut hits = HitsMap::new();
        hits.insert(1, Hit::new(0.5, Vec3::new(-1.26, 2.0, -105.0), 3.33349, 0.5));
        hits.insert(0, Hit::new(0.162, Vec3::new(10.04, -3.96, -5.0), 1.0, 1.0));
        hits
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_scientific(1.0, 5), "1.00000e+00");
        assert_eq!(format_scientific(0.0025, 5), "2.50000e-03");
        assert_eq!(format_scientific(123456.0, 2), "1.23e+05");
        assert_eq!(format_scientific(0.0, 5), "0.00000e+00");
    }

    #[test]
    fn test_empty_map_writes_nothing() {
        assert_eq!(format_event_line(3, &HitsMap::new(), 1), None);
    }

    #[test]
    fn test_line_layout() {
        let line = format_event_line(42, &two_hits(), 1).unwrap();
        assert_eq!(
            line,
            "42\t1.00000e+00\t0\t10.0\t-4.0\t-5.0\t0.162\t1.000\t1\t-1.3\t2.0\t-105.0\t0.500\t3.333\t\n"
        );
        // event id, weight and six fields per hit, each tab terminated
        assert_eq!(line.matches('\t').count(), 2 + 6 * 2);
    }

    #[test]
    fn test_coincidence_threshold() {
        let mut single = HitsMap::new();
        single.insert(0, Hit::new(0.1, Vec3::zeros(), 0.0, 1.0));
        assert!(format_event_line(0, &single, 2).is_none());
        assert!(format_event_line(0, &two_hits(), 2).is_some());
    }

    #[test]
    fn test_header_and_records() {
        let mut status = FuelRodStatus::new(2, 2);
        status.set_active_rods(&[1, 2]);
        let recorder = EventRecorder::from_writer(Vec::new(), &status, 1).unwrap();
        assert!(!recorder.record(0, &HitsMap::new()).unwrap());
        assert!(recorder.record(7, &two_hits()).unwrap());
        let text = String::from_utf8(recorder.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# active fuel rods: 2/4");
        assert_eq!(lines[1], "# 0 1 ");
        assert_eq!(lines[2], "# 1 0 ");
        assert_eq!(lines[3], COLUMN_HEADER);
        assert!(lines[4].starts_with("7\t1.00000e+00\t0\t"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_record_after_close_is_dropped() {
        let status = FuelRodStatus::new(1, 1);
        let recorder = EventRecorder::from_writer(Vec::new(), &status, 1).unwrap();
        recorder.close().unwrap();
        assert!(!recorder.record(1, &two_hits()).unwrap());
        assert!(recorder.into_inner().is_none());
    }

    #[test]
    fn test_open_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("data.txt");
        let status = FuelRodStatus::new(1, 1);
        for event_id in 0..2 {
            let recorder = EventRecorder::open(&path, &status, 1).unwrap();
            recorder.record(event_id, &two_hits()).unwrap();
            recorder.close().unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches(COLUMN_HEADER).count(), 2);
        assert_eq!(text.lines().filter(|l| !l.starts_with('#')).count(), 2);
    }
}
