use core::fmt;

use heapless::Deque;

use crate::config::Thresholds;
use crate::state::Co2Ppm;

/// Number of snapshots kept for the chart; two hours at the default cadence.
pub const HISTORY_CAPACITY: usize = 121;

const SEPARATOR: &str = ",\n\t\t";

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct HistoryEntry {
    // Monotonic seconds
    pub timestamp: f64,
    pub co2: Co2Ppm,
    pub low_threshold: Co2Ppm,
    pub high_threshold: Co2Ppm,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}, {}, {}, {}]",
            self.timestamp, self.co2, self.low_threshold, self.high_threshold
        )
    }
}

/// Rolling log of CO2 snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: Deque<HistoryEntry, HISTORY_CAPACITY>,
    thresholds: Thresholds,
}

impl HistoryBuffer {
    pub fn new(thresholds: Thresholds) -> Self {
        HistoryBuffer {
            entries: Deque::new(),
            thresholds,
        }
    }

    /// Record a snapshot. A missing reading is ignored.
    pub fn append(&mut self, timestamp: f64, co2: Option<Co2Ppm>) {
        let Some(co2) = co2 else {
            return;
        };

        if self.entries.is_full() {
            self.entries.pop_front();
        }

        let entry = HistoryEntry {
            timestamp,
            co2,
            low_threshold: self.thresholds.low,
            high_threshold: self.thresholds.high,
        };
        // Cannot fail, a slot was freed above
        let _ = self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Entries as a JavaScript array body, one per line.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        HistoryBuffer::new(Thresholds::default())
    }
}

impl fmt::Display for HistoryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(SEPARATOR)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
