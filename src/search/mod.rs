//! Date range search over a date-ordered log stream.
//!
//! [`OffsetLocator`] binary-searches the byte offsets of a [`LogStream`]
//! for the first line of a date; [`RangeExtractor`] then streams forward
//! from there, keeping that date's lines until the next day begins.
//!
//! Lines are assumed to start with a `YYYY-MM-DD` [`DateKey`] and to be
//! sorted by it. Neither is checked.
//!
//! [`LogStream`]: crate::zip::LogStream

mod chunk;
mod date;
mod locator;
mod observer;
mod range;

pub use chunk::{Candidate, Chunk, decode_lossy};
pub use date::{DATE_LEN, DateKey};
pub use locator::{DEFAULT_CHUNK_SIZE, Location, MIN_CHUNK_SIZE, OffsetLocator};
pub use observer::{Probe, RefineStep, SearchObserver, SearchWindow, TraceObserver, Verdict};
pub use range::{RangeExtractor, ScanSummary};
