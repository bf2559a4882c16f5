//! Domain types shared by the search client and the export pipeline.

pub mod filter;
pub mod record;

pub use filter::{BondStatus, FilterCriteria, RelativePeriod, SearchParams};
pub use record::{PageResponse, Record, RecordId, RecordType, SearchResponse};
