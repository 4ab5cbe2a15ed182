//! Seat and waitlist snapshot of a class at one point in time.

use serde::{Deserialize, Serialize};

use super::ClassStatus;

/// Capacity and usage of one seat pool (regular seats or waitlist).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatCounts {
    /// Total places.
    pub capacity: u32,
    /// Places taken.
    pub used: u32,
}

impl SeatCounts {
    /// Creates a new count pair.
    #[must_use]
    pub const fn new(capacity: u32, used: u32) -> Self {
        Self { capacity, used }
    }

    /// Places still free, never negative.
    #[must_use]
    pub const fn remaining(self) -> u32 {
        self.capacity.saturating_sub(self.used)
    }
}

/// Status snapshot produced by a status provider on every poll.
///
/// Snapshots are immutable once captured and always replace the stored one
/// wholesale; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDetails {
    /// Class title as shown on the school page.
    pub name: String,
    /// Free-form description; may be empty.
    #[serde(default)]
    pub description: String,
    /// Derived enrollment status.
    pub status: ClassStatus,
    /// Seat capacity.
    pub seats_total: u32,
    /// Seats still free.
    pub seats_remaining: u32,
    /// Waitlist capacity.
    pub waitlist_total: u32,
    /// Waitlist places still free.
    pub waitlist_remaining: u32,
}

impl ClassDetails {
    /// Builds a snapshot from raw counts, deriving the status.
    #[must_use]
    pub fn from_counts(name: impl Into<String>, seats: SeatCounts, waitlist: SeatCounts) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: derive_status(seats, waitlist),
            seats_total: seats.capacity,
            seats_remaining: seats.remaining(),
            waitlist_total: waitlist.capacity,
            waitlist_remaining: waitlist.remaining(),
        }
    }

    /// Returns a copy with the given description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Derives the enrollment status from seat and waitlist usage.
///
/// A class is open while seats remain; once seats are exhausted it is
/// waitlisted while the waitlist has room, and full otherwise.
#[must_use]
pub const fn derive_status(seats: SeatCounts, waitlist: SeatCounts) -> ClassStatus {
    if seats.used >= seats.capacity {
        if waitlist.used < waitlist.capacity {
            ClassStatus::Waitlisted
        } else {
            ClassStatus::Full
        }
    } else {
        ClassStatus::Opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_taken_with_waitlist_room_is_waitlisted() {
        let status = derive_status(SeatCounts::new(30, 30), SeatCounts::new(10, 5));
        assert_eq!(status, ClassStatus::Waitlisted);
    }

    #[test]
    fn free_seats_is_opened() {
        let status = derive_status(SeatCounts::new(30, 20), SeatCounts::new(10, 5));
        assert_eq!(status, ClassStatus::Opened);
    }

    #[test]
    fn seats_and_waitlist_taken_is_full() {
        let status = derive_status(SeatCounts::new(30, 30), SeatCounts::new(10, 10));
        assert_eq!(status, ClassStatus::Full);
    }

    #[test]
    fn overbooked_section_is_not_opened() {
        let status = derive_status(SeatCounts::new(30, 32), SeatCounts::new(0, 0));
        assert_eq!(status, ClassStatus::Full);
    }

    #[test]
    fn from_counts_fills_remaining_fields() {
        let details =
            ClassDetails::from_counts("CS 1331", SeatCounts::new(30, 12), SeatCounts::new(10, 4));
        assert_eq!(details.status, ClassStatus::Opened);
        assert_eq!(details.seats_total, 30);
        assert_eq!(details.seats_remaining, 18);
        assert_eq!(details.waitlist_total, 10);
        assert_eq!(details.waitlist_remaining, 6);
        assert!(details.description.is_empty());
    }

    #[test]
    fn remaining_saturates() {
        assert_eq!(SeatCounts::new(5, 9).remaining(), 0);
    }
}
