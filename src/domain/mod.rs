//! Domain layer: class status model, monitored events, and notice broadcast.
//!
//! This module contains the data model shared by every other layer: the
//! [`ClassStatus`] enumeration and its derivation rule, immutable
//! [`ClassDetails`] snapshots, the monitored [`Event`], and the
//! [`EventBus`] used to push [`ClassNotice`]s to connected users.

pub mod class_details;
pub mod class_notice;
pub mod class_status;
pub mod event;
pub mod event_bus;
pub mod ids;

pub use class_details::{ClassDetails, SeatCounts, derive_status};
pub use class_notice::ClassNotice;
pub use class_status::ClassStatus;
pub use event::Event;
pub use event_bus::EventBus;
pub use ids::{ClassUri, UserId};
