//! Log Store Module
//!
//! This module provides the command audit log engine:
//! - `IdAllocator`: persists and hands out strictly increasing entry IDs
//! - `IngestQueue`: bounded queue drained by one segment writer thread
//! - `SegmentManager`: rotates, compresses and expires segment files
//! - `QueryEngine`: filters and sorts entries across all segments
//! - `LogStore`: owns the allocator and queue, open/close lifecycle
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌──────────┐    ┌──────────┐    ┌────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │ executor │───►│ redact() │───►│ next() ID  │───►│ bounded queue│───►│ writer thread    │
//! │ submit() │    │          │    │ + counter  │    │ (cap. 100)   │    │ logs/store-DATE  │
//! └──────────┘    └──────────┘    └────────────┘    └──────────────┘    └──────────────────┘
//!
//! Maintenance (caller thread):
//! ┌──────────────────┐    ┌────────────────────┐    ┌──────────────────┐
//! │ rotate_if_needed │    │ compress_old_logs  │    │ clean_old_logs   │
//! │ size > N MB → gz │    │ mtime > 1 day → gz │    │ mtime > N days → │
//! └──────────────────┘    └────────────────────┘    │ delete           │
//!                                                   └──────────────────┘
//! Read Path (caller thread):
//! ┌───────────────┐    ┌──────────────────┐    ┌──────────────┐    ┌────────────┐
//! │ list segments │───►│ parse lines      │───►│ filter       │───►│ sort/limit │
//! │ by file name  │    │ (gunzip if .gz)  │    │ (conjunction)│    │            │
//! └───────────────┘    └──────────────────┘    └──────────────┘    └────────────┘
//! ```

mod config;
mod counter;
mod error;
mod ingest;
mod query;
mod rotation;
mod segment;
mod store;

pub use config::StoreConfig;
pub use counter::IdAllocator;
pub use error::{StoreError, StoreResult};
pub use ingest::{IngestQueue, IngestStats};
pub use query::{read_segment, sort_entries, QueryEngine};
pub use rotation::{compress_segment, MaintenanceReport, SegmentInfo, SegmentManager};
pub use segment::{discover, segment_name, segment_path, SegmentFile};
pub use store::{LogStore, MaintenanceSummary};
