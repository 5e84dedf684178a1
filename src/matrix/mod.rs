// Block-level matrix structure: directory, lookup, reblocking

pub mod directory;
pub mod locate;
pub mod reblock;

pub use directory::{BlockDirectory, BlockEntry, BlockMove};
pub use locate::{locate, locate_with_cursor, stored_coordinates, BlockLocation, LookupCursor};
pub use reblock::{reblocking_plan, BlockOverlap, ReblockPlan};
