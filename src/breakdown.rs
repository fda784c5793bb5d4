use std::fmt;

use crate::error::{InvalidDuration, Result};

pub(crate) const SECONDS_PER_MINUTE: u64 = 60;
pub(crate) const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
pub(crate) const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Designator of the zero duration.
pub const NONE: &str = "PT0S";

/// A component tuple, years through seconds.
///
/// A breakdown is *raw* until it has been anchored to a reference instant: `PT90M` is a perfectly
/// fine raw breakdown, it only becomes `PT1H30M` once normalized by a [`Calendar`].
///
/// [`Calendar`]: crate::Calendar
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Breakdown {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// Constructors
impl Breakdown {
    pub fn new(years: u32, months: u32, days: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Breakdown {
            years,
            months,
            days,
            hours,
            minutes,
            seconds,
        }
    }
    pub fn seconds(seconds: u32) -> Self {
        Breakdown {
            seconds,
            ..Default::default()
        }
    }
    pub fn minutes(minutes: u32) -> Self {
        Breakdown {
            minutes,
            ..Default::default()
        }
    }
    pub fn hours(hours: u32) -> Self {
        Breakdown {
            hours,
            ..Default::default()
        }
    }
    pub fn days(days: u32) -> Self {
        Breakdown {
            days,
            ..Default::default()
        }
    }
    pub fn months(months: u32) -> Self {
        Breakdown {
            months,
            ..Default::default()
        }
    }
    pub fn years(years: u32) -> Self {
        Breakdown {
            years,
            ..Default::default()
        }
    }

    /// Split a whole number of seconds into days, hours, minutes and seconds.
    ///
    /// Months and years are left at zero, a calendar decides how many of them fit.
    pub fn from_seconds(total: u64) -> Result<Self> {
        let days = u32::try_from(total / SECONDS_PER_DAY).map_err(|e| {
            InvalidDuration::because(format!("{total} seconds is out of range")).caused_by(e)
        })?;
        let rest = total % SECONDS_PER_DAY;
        Ok(Breakdown {
            days,
            hours: (rest / SECONDS_PER_HOUR) as u32,
            minutes: (rest % SECONDS_PER_HOUR / SECONDS_PER_MINUTE) as u32,
            seconds: (rest % SECONDS_PER_MINUTE) as u32,
            ..Default::default()
        })
    }
}

impl Breakdown {
    pub fn is_zero(&self) -> bool {
        *self == Breakdown::default()
    }

    /// Years and months folded into months, `None` on overflow.
    pub(crate) fn total_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    /// Days through seconds folded into seconds. Cannot overflow for `u32` components.
    pub(crate) fn total_seconds(&self) -> i64 {
        (self.days as u64 * SECONDS_PER_DAY
            + self.hours as u64 * SECONDS_PER_HOUR
            + self.minutes as u64 * SECONDS_PER_MINUTE
            + self.seconds as u64) as i64
    }

    /// Component-wise sum, `None` if any component overflows.
    pub fn checked_add(&self, other: &Breakdown) -> Option<Breakdown> {
        Some(Breakdown {
            years: self.years.checked_add(other.years)?,
            months: self.months.checked_add(other.months)?,
            days: self.days.checked_add(other.days)?,
            hours: self.hours.checked_add(other.hours)?,
            minutes: self.minutes.checked_add(other.minutes)?,
            seconds: self.seconds.checked_add(other.seconds)?,
        })
    }
}

/// Renders the minimal designator, e.g. `P1DT1H`. Zero components are left out and the zero
/// breakdown is written as `PT0S`.
impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buffer = String::from("P");
        if self.years > 0 {
            buffer.push_str(&format!("{}Y", self.years))
        }
        if self.months > 0 {
            buffer.push_str(&format!("{}M", self.months))
        }
        if self.days > 0 {
            buffer.push_str(&format!("{}D", self.days))
        }
        buffer.push('T');
        if self.hours > 0 {
            buffer.push_str(&format!("{}H", self.hours))
        }
        if self.minutes > 0 {
            buffer.push_str(&format!("{}M", self.minutes))
        }
        if self.seconds > 0 {
            buffer.push_str(&format!("{}S", self.seconds))
        }
        if buffer.ends_with('T') {
            buffer.pop();
        }
        if buffer == "P" {
            return f.write_str(NONE);
        }
        f.write_str(&buffer)
    }
}
