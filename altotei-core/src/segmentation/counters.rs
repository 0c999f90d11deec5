use serde::{Deserialize, Serialize};

/// Run-scoped entry/work numbering, threaded through every page of a catalog.
///
/// Numbers are issued when an entry or work opens, so they never restart per
/// page and have neither gaps nor repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    last_entry_number: u32,
    last_work_number: u32,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after an earlier run stopped at `entry`/`work`
    pub fn resume(last_entry_number: u32, last_work_number: u32) -> Self {
        Self {
            last_entry_number,
            last_work_number,
        }
    }

    pub fn next_entry_number(&mut self) -> u32 {
        self.last_entry_number += 1;
        self.last_entry_number
    }

    pub fn next_work_number(&mut self) -> u32 {
        self.last_work_number += 1;
        self.last_work_number
    }

    pub fn last_entry_number(&self) -> u32 {
        self.last_entry_number
    }

    pub fn last_work_number(&self) -> u32 {
        self.last_work_number
    }
}
