//! `mailmerge-grouping`: join/group engine.
//!
//! Builds a keyed index of recipients and partitions invoice rows into ordered
//! groups under an explicit [`JoinPolicy`]. Pure and deterministic; groups are
//! owned by the caller for one processing run and rebuilt when inputs change.

pub mod group;
pub mod policy;

pub use group::{group, Group, GroupSet, RecipientOrigin};
pub use policy::JoinPolicy;
