//! Record extraction from portal result pages.
//!
//! Two sources feed the same [`InspectionRecord`](inspdb_core::InspectionRecord)
//! shape: server-rendered HTML tables/cards ([`html`]) and the JSON the
//! portal's search script consumes ([`json`]). Both locate fields through
//! ordered alternative lists and hand raw text to [`crate::normalize`].

pub mod fields;
pub mod html;
pub mod json;

pub use fields::{Field, FieldAliases, FieldSelectors};
pub use html::{extract_records, find_rows, RowMatch, RESULT_ROW_CANDIDATES};
pub use json::{extract_records_from_json, result_items};
