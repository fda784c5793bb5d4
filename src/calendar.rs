//! Calendar arithmetic anchored to a reference instant.
//!
//! Months and years have no fixed length, so a breakdown only has a magnitude once it is laid
//! onto the calendar. A [`Calendar`] lays every breakdown onto the same reference instant: adding
//! a raw breakdown to it and measuring the calendar difference back yields the canonical
//! breakdown, and all arithmetic happens between instants measured from that same point.
use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Months, SubsecRound, TimeDelta, Utc};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::breakdown::Breakdown;
use crate::error::{InvalidDuration, Result};

static GLOBAL: OnceCell<Calendar> = OnceCell::new();

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that is stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        FixedClock(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    reference: DateTime<Utc>,
}

/// Constructors
impl Calendar {
    /// Sub-second precision of `reference` is dropped.
    pub fn new(reference: DateTime<Utc>) -> Self {
        Calendar {
            reference: reference.trunc_subsecs(0),
        }
    }

    pub fn from_clock<C: Clock + ?Sized>(clock: &C) -> Self {
        Calendar::new(clock.now())
    }

    /// The process wide calendar, anchored to the wall clock the first time it is needed.
    pub fn global() -> &'static Calendar {
        GLOBAL.get_or_init(|| {
            let calendar = Calendar::from_clock(&SystemClock);
            debug!(reference = %calendar.reference, "captured reference instant");
            calendar
        })
    }

    /// Pin the process wide calendar before anything used it.
    ///
    /// Hands the calendar back if the global one is already in place.
    pub fn install_global(calendar: Calendar) -> std::result::Result<(), Calendar> {
        GLOBAL.set(calendar)?;
        debug!(reference = %calendar.reference, "installed reference instant");
        Ok(())
    }

    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }
}

/// Instant arithmetic
impl Calendar {
    /// `instant` moved forward by `breakdown`: calendar months first, clamped to the end of the
    /// month, then the exact days, hours, minutes and seconds.
    pub fn add_to(instant: DateTime<Utc>, breakdown: &Breakdown) -> Result<DateTime<Utc>> {
        breakdown
            .total_months()
            .and_then(|months| instant.checked_add_months(Months::new(months)))
            .and_then(|shifted| {
                shifted.checked_add_signed(TimeDelta::seconds(breakdown.total_seconds()))
            })
            .ok_or_else(|| out_of_range(breakdown))
    }

    /// `instant` moved backward by `breakdown`, the mirror image of [`Calendar::add_to`].
    pub fn subtract_from(instant: DateTime<Utc>, breakdown: &Breakdown) -> Result<DateTime<Utc>> {
        breakdown
            .total_months()
            .and_then(|months| instant.checked_sub_months(Months::new(months)))
            .and_then(|shifted| {
                shifted.checked_sub_signed(TimeDelta::seconds(breakdown.total_seconds()))
            })
            .ok_or_else(|| out_of_range(breakdown))
    }

    /// The absolute calendar difference between two instants.
    ///
    /// Whole months are counted first, the rest is exact time. `add_to(a, &between(a, b))` is `b`
    /// whenever `a <= b`.
    pub fn between(a: DateTime<Utc>, b: DateTime<Utc>) -> Result<Breakdown> {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };

        let mut months = ((end.year() - start.year()) * 12 + end.month() as i32
            - start.month() as i32)
            .max(0) as u32;
        // At most one step back, zero months always fits
        let base = loop {
            match start.checked_add_months(Months::new(months)) {
                Some(shifted) if shifted <= end => break shifted,
                _ => months -= 1,
            }
        };

        let rest = (end - base).num_seconds().max(0) as u64;
        let mut breakdown = Breakdown::from_seconds(rest)?;
        breakdown.years = months / 12;
        breakdown.months = months % 12;
        Ok(breakdown)
    }

    /// Where a breakdown lands when laid onto the reference instant.
    pub fn anchor(&self, breakdown: &Breakdown) -> Result<DateTime<Utc>> {
        Calendar::add_to(self.reference, breakdown)
    }

    /// Resolve a raw breakdown into the canonical one, e.g. `PT24H60M` into `P1DT1H`.
    pub fn normalize(&self, raw: &Breakdown) -> Result<Breakdown> {
        Calendar::between(self.reference, self.anchor(raw)?)
    }

    /// The exact number of seconds a breakdown spans from the reference instant.
    pub fn seconds_in(&self, breakdown: &Breakdown) -> Result<i64> {
        Ok((self.anchor(breakdown)? - self.reference).num_seconds())
    }
}

/// Breakdown arithmetic
///
/// Operands may be raw or canonical, results are always canonical for this calendar.
impl Calendar {
    pub fn sum(&self, lhs: &Breakdown, rhs: &Breakdown) -> Result<Breakdown> {
        let then = Calendar::add_to(self.anchor(lhs)?, rhs)?;
        Calendar::between(self.reference, then)
    }

    /// The `rest` for which `rest + rhs` lands on `lhs`.
    ///
    /// Fails when `rhs` is larger than `lhs`, a duration is never negative. Clamped month ends can
    /// leave no exact rest, the result then falls short of `lhs` but never overshoots it.
    pub fn subtract(&self, lhs: &Breakdown, rhs: &Breakdown) -> Result<Breakdown> {
        match self.compare(lhs, rhs) {
            Ordering::Less => {
                return Err(InvalidDuration::because(
                    "A duration cannot be smaller than zero",
                ))
            }
            Ordering::Equal => return Ok(Breakdown::default()),
            Ordering::Greater => {}
        }

        let target = self.anchor(lhs)?;
        let mirrored = Calendar::subtract_from(target, rhs)?;
        let reachable = mirrored >= self.reference;
        if reachable && Calendar::add_to(mirrored, rhs)? == target {
            return Calendar::between(self.reference, mirrored);
        }

        let (seconds, exact) = self.latest_start(target, rhs)?;
        if exact || !reachable {
            return self.from_seconds(seconds as f64);
        }
        debug!(%lhs, %rhs, "no exact rest, mirroring the subtraction");
        Calendar::between(self.reference, mirrored)
    }

    /// Scale by `factor`, rounded to the nearest second, halves away from zero.
    pub fn multiply(&self, breakdown: &Breakdown, factor: f64) -> Result<Breakdown> {
        if factor.is_nan() || factor < 0.0 {
            return Err(InvalidDuration::because(
                "A duration cannot be multiplied with a value smaller than zero",
            ));
        }
        let seconds = self.seconds_in(breakdown)? as f64;
        self.from_seconds((seconds * factor).round())
    }

    /// Divide by `divisor`, rounded to the nearest second, halves away from zero.
    pub fn divide(&self, breakdown: &Breakdown, divisor: f64) -> Result<Breakdown> {
        if divisor == 0.0 {
            return Err(InvalidDuration::because(
                "A duration cannot be divided by zero",
            ));
        }
        if divisor.is_nan() || divisor < 0.0 {
            return Err(InvalidDuration::because(
                "A duration cannot be divided by a value smaller than zero",
            ));
        }
        let seconds = self.seconds_in(breakdown)? as f64;
        self.from_seconds((seconds / divisor).round())
    }

    /// The absolute difference of two breakdowns, the exact time between where they land.
    pub fn difference(&self, lhs: &Breakdown, rhs: &Breakdown) -> Result<Breakdown> {
        let here = self.anchor(lhs)?;
        let there = self.anchor(rhs)?;
        let seconds = (here - there).num_seconds().unsigned_abs();
        self.normalize(&Breakdown::from_seconds(seconds)?)
    }

    pub fn compare(&self, lhs: &Breakdown, rhs: &Breakdown) -> Ordering {
        match (self.anchor(lhs), self.anchor(rhs)) {
            (Ok(here), Ok(there)) => here.cmp(&there),
            // Only reachable past the end of the representable range
            _ => lhs.cmp(rhs),
        }
    }

    /// Seconds after the reference instant of the latest start from which `breakdown` does not
    /// pass `target`, and whether it lands on `target` exactly.
    fn latest_start(&self, target: DateTime<Utc>, breakdown: &Breakdown) -> Result<(i64, bool)> {
        // `add_to` is monotonic in its instant and the reference itself never passes `target`
        let (mut low, mut high) = (0, (target - self.reference).num_seconds());
        while low < high {
            let middle = low + (high - low + 1) / 2;
            let start = self.reference + TimeDelta::seconds(middle);
            if Calendar::add_to(start, breakdown)? <= target {
                low = middle;
            } else {
                high = middle - 1;
            }
        }
        let start = self.reference + TimeDelta::seconds(low);
        Ok((low, Calendar::add_to(start, breakdown)? == target))
    }

    fn from_seconds(&self, seconds: f64) -> Result<Breakdown> {
        if !(0.0..=u64::MAX as f64).contains(&seconds) {
            return Err(InvalidDuration::because(format!(
                "{seconds} seconds is out of range"
            )));
        }
        self.normalize(&Breakdown::from_seconds(seconds as u64)?)
    }
}

fn out_of_range(breakdown: &Breakdown) -> InvalidDuration {
    InvalidDuration::because(format!("{breakdown} is out of range"))
}
