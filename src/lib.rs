//! Durations that are entered loosely and compared strictly.
//!
//! ```rust
//! use durationlib::prelude::*;
//!
//! // Several ways of writing a duration
//! let textual = Duration::make("13 minutes 37 seconds")?;
//! let clock = Duration::make("01:23:45")?;
//! let designator = Duration::make("PT24H")?;
//!
//! // Always kept in their canonical form
//! assert_eq!(textual.to_string(), "PT13M37S");
//! assert_eq!(clock.to_string(), "PT1H23M45S");
//! assert_eq!(designator.to_string(), "P1D");
//!
//! // Arithmetic and comparison
//! let total = textual.with_added(&clock)?;
//! assert!(total.is_larger_than(&clock));
//! assert_eq!(total.divided_by(2.0)?.to_string(), "PT48M41S");
//! # Ok::<(), InvalidDuration>(())
//! ```
//!
//! Months and years have no fixed length. Every duration is therefore measured by laying it onto
//! one reference instant, captured once per process (see [`Calendar`]). Within a run the results
//! are deterministic; `P30D` may or may not be a month depending on when the process started.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use durationlib::prelude::*;
//!
//! // A calendar of its own measures raw breakdowns from a pinned instant
//! let calendar = Calendar::from_clock(&FixedClock::new(
//!     Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap(),
//! ));
//! let month = calendar.normalize(&Breakdown::days(29))?;
//! assert_eq!(month, Breakdown::months(1));
//! assert_eq!(calendar.subtract(&month, &Breakdown::days(1))?.to_string(), "P28D");
//! # Ok::<(), InvalidDuration>(())
//! ```

pub use breakdown::{Breakdown, NONE};
pub use calendar::{Calendar, Clock, FixedClock, SystemClock};
pub use duration::{Duration, IntoDuration};
pub use error::{InvalidDuration, Result};

mod breakdown;
mod calendar;
mod designator;
mod duration;
mod error;
mod phrase;

pub mod prelude {
    pub use crate::breakdown::Breakdown;
    pub use crate::calendar::{Calendar, Clock, FixedClock, SystemClock};
    pub use crate::duration::{Duration, IntoDuration};
    pub use crate::error::InvalidDuration;
}
