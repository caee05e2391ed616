//! shotsheet-core: sync production-tracking updates into a tracking spreadsheet
//!
//! An update record names a shot (and, for some sheets, a task). The record is
//! located in a snapshot of its sheet, mapped onto that sheet's column layout
//! and written back with a single range update.

pub mod auth;
pub mod cell_ref;
pub mod config;
pub mod error;
pub mod layout;
pub mod mapper;
pub mod record;
pub mod service;
pub mod snapshot;

pub use cell_ref::{CellRange, CellReference, cell_ref};
pub use config::AppConfig;
pub use error::{Result, SyncError};
pub use layout::ColumnLayouts;
pub use mapper::{RecordMapper, WriteOutcome, WritePlan};
pub use record::{RecordKind, RecordType, UpdateRecord};
pub use service::{SheetsService, UpdateSummary};
pub use snapshot::SheetSnapshot;

/// Main sync interface
pub struct Syncer {
    mapper: RecordMapper,
}

impl Syncer {
    /// Create a syncer with the default column layouts
    pub fn new() -> Self {
        Self::with_layouts(ColumnLayouts::default())
    }

    pub fn with_layouts(layouts: ColumnLayouts) -> Self {
        Self {
            mapper: RecordMapper::new(layouts),
        }
    }

    /// Decode a payload and apply it with one read and one write
    pub fn apply_payload<S: SheetsService + ?Sized>(
        &self,
        payload: &str,
        service: &S,
    ) -> Result<WriteOutcome> {
        let record = UpdateRecord::from_json(payload)?;
        self.mapper.apply(&record, service)
    }

    /// Decode a payload and resolve its target without writing
    pub fn plan_payload<S: SheetsService + ?Sized>(
        &self,
        payload: &str,
        service: &S,
    ) -> Result<WritePlan> {
        let record = UpdateRecord::from_json(payload)?;
        self.mapper.resolve(&record, service)
    }

    pub fn apply<S: SheetsService + ?Sized>(
        &self,
        record: &UpdateRecord,
        service: &S,
    ) -> Result<WriteOutcome> {
        self.mapper.apply(record, service)
    }

    pub fn plan<S: SheetsService + ?Sized>(
        &self,
        record: &UpdateRecord,
        service: &S,
    ) -> Result<WritePlan> {
        self.mapper.resolve(record, service)
    }
}

impl Default for Syncer {
    fn default() -> Self {
        Self::new()
    }
}
