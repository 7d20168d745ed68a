//! Participant snapshot and the bounded participant-ID pool.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Participant details captured at registration time and embedded in the
/// registration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Participant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub age: i32,
    pub gender: String,
    pub district: String,
    pub occupation: String,
    pub interest: String,
    pub affiliation: Option<String>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Bounded pool of participant IDs of the form `{prefix}{n}`.
///
/// The used set is always derived by scanning issued IDs; numbers never
/// return to the pool.
#[derive(Debug, Clone)]
pub struct IdPool {
    prefix: String,
    start: u32,
    end: u32,
}

impl IdPool {
    /// Creates a pool over the inclusive range `start..=end`.
    pub fn new(prefix: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            prefix: prefix.into(),
            start,
            end,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Total number of IDs the pool can ever issue.
    pub fn capacity(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Formats the ID for pool number `n`.
    pub fn format(&self, n: u32) -> String {
        format!("{}{}", self.prefix, n)
    }

    /// Parses an issued ID back into its pool number.
    ///
    /// Returns `None` when the prefix, the numeric tail or the range does
    /// not match. Leading zeros are never issued, so they do not parse.
    pub fn parse(&self, id: &str) -> Option<u32> {
        let tail = id.strip_prefix(self.prefix.as_str())?;
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if tail.len() > 1 && tail.starts_with('0') {
            return None;
        }
        let n: u32 = tail.parse().ok()?;
        (self.start..=self.end).contains(&n).then_some(n)
    }

    /// Derives the set of used pool numbers from issued IDs. IDs that do not
    /// belong to this pool are ignored.
    pub fn used_numbers<'a, I>(&self, issued: I) -> HashSet<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        issued.into_iter().filter_map(|id| self.parse(id)).collect()
    }

    /// Picks a uniformly random unassigned ID.
    ///
    /// Returns `None` when every number in the pool is taken.
    pub fn allocate(&self, used: &HashSet<u32>) -> Option<String> {
        let available: Vec<u32> = (self.start..=self.end)
            .filter(|n| !used.contains(n))
            .collect();
        if available.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..available.len());
        Some(self.format(available[idx]))
    }

    /// Returns true when `id` belongs to this pool and is unassigned.
    pub fn is_available(&self, used: &HashSet<u32>, id: &str) -> bool {
        self.parse(id).map(|n| !used.contains(&n)).unwrap_or(false)
    }

    /// Usage counters for the pool.
    pub fn usage(&self, used: &HashSet<u32>) -> PoolUsage {
        let capacity = self.capacity();
        let used_count = used
            .iter()
            .filter(|n| (self.start..=self.end).contains(*n))
            .count() as u32;
        let percentage = if capacity == 0 {
            0.0
        } else {
            (used_count as f64 / capacity as f64 * 1000.0).round() / 10.0
        };
        PoolUsage {
            capacity,
            used: used_count,
            available: capacity - used_count,
            percentage,
        }
    }

    /// The next `count` available IDs in ascending order. Preview only, no
    /// reservation happens.
    pub fn next_available(&self, used: &HashSet<u32>, count: usize) -> Vec<String> {
        (self.start..=self.end)
            .filter(|n| !used.contains(n))
            .take(count)
            .map(|n| self.format(n))
            .collect()
    }
}

/// Pool usage counters; `percentage` is used-over-capacity with one decimal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PoolUsage {
    pub capacity: u32,
    pub used: u32,
    pub available: u32,
    pub percentage: f64,
}

/// Admin view of the participant-ID pool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PoolStatusResponse {
    pub prefix: String,
    pub usage: PoolUsage,
    pub next_available: Vec<String>,
}
