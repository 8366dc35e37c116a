// Presenter - the per-request decision surface over one labware snapshot
//
// Everything here is a pure function of (snapshot, registry snapshot, caller).

pub mod facade;
pub mod links;
pub mod mirror;
pub mod summary;

pub use facade::{DecisionSurface, Presenter};
pub use links::{csv_export_links, ExportLink};
pub use mirror::{MirrorWrite, TubeStateMirror};
pub use summary::summary_rows;
