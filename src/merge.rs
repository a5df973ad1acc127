//! Grouping raw shot timestamps into discrete shots.
//!
//! One real shot usually trips the detector on a couple of neighbouring
//! seconds. [`merge_events`] folds every run of raw timestamps whose
//! consecutive members are at most `gap` seconds apart into a single
//! [`ShotGroup`].

/// A maximal run of raw shot timestamps, in increasing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotGroup {
    events: Vec<u64>,
}

impl ShotGroup {
    /// The raw timestamps in this group.
    pub fn events(&self) -> &[u64] {
        &self.events
    }

    /// Number of raw timestamps.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Groups produced by [`merge_events`] are never empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The element at index `len / 2`.
    ///
    /// For even-length groups this is the later of the two middle elements.
    pub fn representative(&self) -> u64 {
        self.events[self.events.len() / 2]
    }

    /// First timestamp.
    pub fn first(&self) -> u64 {
        self.events[0]
    }

    /// Last timestamp.
    pub fn last(&self) -> u64 {
        self.events[self.events.len() - 1]
    }
}

/// Partition `events` into shot groups.
///
/// Input is sorted first. A timestamp joins the current group when it is at
/// most `gap` seconds after the group's last member (inclusive); otherwise it
/// opens a new group. Concatenating the groups reproduces the sorted input.
///
/// # Example
///
/// ```
/// use shotreel::merge_events;
///
/// let groups = merge_events(&[3, 4, 9, 12, 13, 14], 2);
/// let representatives: Vec<u64> = groups.iter().map(|g| g.representative()).collect();
/// assert_eq!(representatives, vec![4, 9, 13]);
/// ```
pub fn merge_events(events: &[u64], gap: u64) -> Vec<ShotGroup> {
    let mut sorted = events.to_vec();
    sorted.sort_unstable();

    let mut groups = Vec::new();
    let mut current: Vec<u64> = Vec::new();

    for t in sorted {
        match current.last() {
            Some(&last) if t - last > gap => {
                groups.push(ShotGroup {
                    events: std::mem::take(&mut current),
                });
                current.push(t);
            }
            _ => current.push(t),
        }
    }

    if !current.is_empty() {
        groups.push(ShotGroup { events: current });
    }

    log::debug!(
        "Merged {} raw event(s) into {} group(s) (gap={gap}s)",
        events.len(),
        groups.len()
    );

    groups
}
