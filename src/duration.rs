use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time;

use chrono::TimeDelta;
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map_res};
use nom::error::context;
use nom::multi::separated_list1;
use nom::IResult;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use crate::breakdown::Breakdown;
use crate::calendar::Calendar;
use crate::designator;
use crate::error::{InvalidDuration, Result};
use crate::phrase;

/// A non-negative span of time, always held in its canonical form.
///
/// Durations are built from loose input and normalized against the process wide [`Calendar`], so
/// `PT24H` becomes `P1D` and `90 minutes` becomes `PT1H30M`. They never change afterwards, every
/// operation hands out a new one.
///
/// ```rust
/// use durationlib::prelude::*;
///
/// let duration = Duration::make("22 hours")?.with_added("17 minutes")?;
/// assert_eq!(duration.to_string(), "PT22H17M");
/// assert!(duration.equals(&Duration::make("PT1337M")?));
/// # Ok::<(), InvalidDuration>(())
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Duration {
    breakdown: Breakdown,
}

/// Constructors
impl Duration {
    /// Build a duration from anything that can be coerced into one.
    ///
    /// Strings may be empty (zero), `MM:SS`, `HH:MM:SS`, a designator like `PT1H30M` or a
    /// relative phrase like `13 minutes 37 seconds`. A bare number is rejected since it has no
    /// unit.
    pub fn make<V: IntoDuration>(value: V) -> Result<Self> {
        value.into_duration()
    }

    /// Build a duration from a designator such as `P1DT1H`.
    pub fn from_spec(spec: &str) -> Result<Self> {
        designator::parse(spec)?.into_duration()
    }

    /// The zero duration.
    pub fn none() -> Self {
        Duration::default()
    }

    /// Normalize a raw breakdown against the process wide calendar.
    fn normalized(raw: &Breakdown) -> Result<Self> {
        let breakdown = Calendar::global().normalize(raw)?;
        Ok(Duration { breakdown })
    }

    /// Wrap the outcome of a calendar operation, already canonical.
    fn canonical(breakdown: Result<Breakdown>) -> Result<Self> {
        breakdown.map(|breakdown| Duration { breakdown })
    }
}

impl Duration {
    pub fn breakdown(&self) -> &Breakdown {
        &self.breakdown
    }
    pub fn years(&self) -> u32 {
        self.breakdown.years
    }
    pub fn months(&self) -> u32 {
        self.breakdown.months
    }
    pub fn days(&self) -> u32 {
        self.breakdown.days
    }
    pub fn hours(&self) -> u32 {
        self.breakdown.hours
    }
    pub fn minutes(&self) -> u32 {
        self.breakdown.minutes
    }
    pub fn seconds(&self) -> u32 {
        self.breakdown.seconds
    }
    pub fn is_zero(&self) -> bool {
        self.breakdown.is_zero()
    }

    /// The minimal designator, `PT0S` for the zero duration.
    pub fn to_spec(&self) -> String {
        self.breakdown.to_string()
    }

    /// The exact span measured from the reference instant.
    pub fn to_time_delta(&self) -> Result<TimeDelta> {
        Calendar::global()
            .seconds_in(&self.breakdown)
            .map(TimeDelta::seconds)
    }
}

/// Arithmetic
impl Duration {
    pub fn with_added<V: IntoDuration>(&self, other: V) -> Result<Self> {
        let other = other.into_duration()?;
        Duration::canonical(Calendar::global().sum(&self.breakdown, &other.breakdown))
    }

    /// Fails when `other` is larger, durations are never negative.
    pub fn with_subtracted<V: IntoDuration>(&self, other: V) -> Result<Self> {
        let other = other.into_duration()?;
        Duration::canonical(Calendar::global().subtract(&self.breakdown, &other.breakdown))
    }

    pub fn multiplied_by(&self, factor: f64) -> Result<Self> {
        Duration::canonical(Calendar::global().multiply(&self.breakdown, factor))
    }

    pub fn divided_by(&self, divisor: f64) -> Result<Self> {
        Duration::canonical(Calendar::global().divide(&self.breakdown, divisor))
    }

    /// The absolute difference between two durations.
    pub fn diff<V: IntoDuration>(&self, other: V) -> Result<Self> {
        let other = other.into_duration()?;
        Duration::canonical(Calendar::global().difference(&self.breakdown, &other.breakdown))
    }
}

/// Comparison
impl Duration {
    pub fn compare_to(&self, other: &Duration) -> Ordering {
        Calendar::global().compare(&self.breakdown, &other.breakdown)
    }
    pub fn equals(&self, other: &Duration) -> bool {
        self.compare_to(other) == Ordering::Equal
    }
    pub fn is_larger_than(&self, other: &Duration) -> bool {
        self.compare_to(other) == Ordering::Greater
    }
    pub fn is_smaller_than(&self, other: &Duration) -> bool {
        self.compare_to(other) == Ordering::Less
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Duration {}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
    }
}

/// Hashes where the duration lands on the calendar, equal magnitudes hash alike.
impl Hash for Duration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match Calendar::global().anchor(&self.breakdown) {
            Ok(instant) => instant.hash(state),
            Err(_) => self.breakdown.hash(state),
        }
    }
}

/// Conversion Methods
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.breakdown, f)
    }
}

impl FromStr for Duration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self> {
        Duration::make(s)
    }
}

impl TryFrom<&str> for Duration {
    type Error = InvalidDuration;

    fn try_from(s: &str) -> Result<Self> {
        Duration::make(s)
    }
}

impl TryFrom<String> for Duration {
    type Error = InvalidDuration;

    fn try_from(s: String) -> Result<Self> {
        Duration::make(s)
    }
}

impl From<Duration> for String {
    fn from(duration: Duration) -> Self {
        duration.to_string()
    }
}

impl From<Duration> for Breakdown {
    fn from(duration: Duration) -> Self {
        duration.breakdown
    }
}

impl Serialize for Duration {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_spec())
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> de::Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string containing a duration")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Duration::make(v).map_err(E::custom)
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Duration::make(v).map_err(E::custom)
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Duration::make(v).map_err(E::custom)
            }

            fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Duration::make(v).map_err(E::custom)
            }

            fn visit_bool<E>(self, _: bool) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Err(E::custom(boolean()))
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::none())
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::none())
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Duration::deserialize(deserializer)
            }

            fn visit_seq<A>(self, _: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                Err(de::Error::custom(not_stringable()))
            }

            fn visit_map<A>(self, _: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                Err(de::Error::custom(not_stringable()))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Coercion of every accepted input shape into a duration.
///
/// All operations that take "another duration" go through this trait, so their core logic only
/// ever sees canonical durations.
pub trait IntoDuration: Sized {
    /// The raw, not yet normalized, breakdown.
    fn into_breakdown(self) -> Result<Breakdown>;

    fn into_duration(self) -> Result<Duration> {
        Duration::normalized(&self.into_breakdown()?)
    }
}

/// Already canonical, returned as is
impl IntoDuration for Duration {
    fn into_breakdown(self) -> Result<Breakdown> {
        Ok(self.breakdown)
    }
    fn into_duration(self) -> Result<Duration> {
        Ok(self)
    }
}

impl IntoDuration for &Duration {
    fn into_breakdown(self) -> Result<Breakdown> {
        Ok(self.breakdown)
    }
    fn into_duration(self) -> Result<Duration> {
        Ok(*self)
    }
}

impl IntoDuration for Breakdown {
    fn into_breakdown(self) -> Result<Breakdown> {
        Ok(self)
    }
}

impl IntoDuration for &str {
    fn into_breakdown(self) -> Result<Breakdown> {
        parse_str(self)
    }
}

impl IntoDuration for String {
    fn into_breakdown(self) -> Result<Breakdown> {
        parse_str(&self)
    }
}

impl IntoDuration for &String {
    fn into_breakdown(self) -> Result<Breakdown> {
        parse_str(self)
    }
}

/// Absent means zero
impl<T: IntoDuration> IntoDuration for Option<T> {
    fn into_breakdown(self) -> Result<Breakdown> {
        match self {
            Some(value) => value.into_breakdown(),
            None => Ok(Breakdown::default()),
        }
    }
}

macro_rules! into_duration_for_integer {
    ($($t:ty),*) => {
        $(
            /// `0` is the zero duration, any other number lacks a unit
            impl IntoDuration for $t {
                fn into_breakdown(self) -> Result<Breakdown> {
                    if self == 0 {
                        return Ok(Breakdown::default());
                    }
                    parse_str(&self.to_string())
                }
            }
        )*
    };
}

into_duration_for_integer!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl IntoDuration for f64 {
    fn into_breakdown(self) -> Result<Breakdown> {
        if self == 0.0 {
            return Ok(Breakdown::default());
        }
        parse_str(&self.to_string())
    }
}

/// Whole seconds, the fraction is dropped
impl IntoDuration for time::Duration {
    fn into_breakdown(self) -> Result<Breakdown> {
        Breakdown::from_seconds(self.as_secs())
    }
}

impl IntoDuration for TimeDelta {
    fn into_breakdown(self) -> Result<Breakdown> {
        let seconds = u64::try_from(self.num_seconds()).map_err(|e| {
            InvalidDuration::because("A duration cannot be smaller than zero").caused_by(e)
        })?;
        Breakdown::from_seconds(seconds)
    }
}

/// Loosely typed input, e.g. a field of a JSON document
impl IntoDuration for serde_json::Value {
    fn into_breakdown(self) -> Result<Breakdown> {
        use serde_json::Value;

        match self {
            Value::Null => Ok(Breakdown::default()),
            Value::Bool(_) => Err(boolean()),
            Value::Number(number) => match number.as_f64() {
                Some(n) if n == 0.0 => Ok(Breakdown::default()),
                _ => parse_str(&number.to_string()),
            },
            Value::String(s) => parse_str(&s),
            Value::Array(_) | Value::Object(_) => Err(not_stringable()),
        }
    }
}

fn boolean() -> InvalidDuration {
    InvalidDuration::because("A boolean is not a duration")
}

fn not_stringable() -> InvalidDuration {
    InvalidDuration::because("The given value cannot be converted to a string")
}

/// Parse `MM:SS` or `HH:MM:SS` parts
fn parse_clock<'a>(input: &'a str) -> IResult<&'a str, Vec<u32>> {
    context(
        "clock",
        separated_list1(
            char(':'),
            map_res(digit1, |digits: &str| digits.parse::<u32>()),
        ),
    )(input)
}

/// `MM:SS` or `HH:MM:SS`, `None` if the value is written some other way
fn parse_clock_notation(value: &str) -> Option<Breakdown> {
    let (_, parts) = all_consuming(parse_clock)(value).ok()?;
    match parts[..] {
        [minutes, seconds] => Some(Breakdown {
            minutes,
            seconds,
            ..Default::default()
        }),
        [hours, minutes, seconds] => Some(Breakdown {
            hours,
            minutes,
            seconds,
            ..Default::default()
        }),
        _ => None,
    }
}

/// Turn any textual input into a raw breakdown
fn parse_str(value: &str) -> Result<Breakdown> {
    let value = value.trim();

    if value.is_empty() {
        return Ok(Breakdown::default());
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidDuration::because(format!(
            "A duration needs a unit, '{value}' has none"
        )));
    }
    if let Some(breakdown) = parse_clock_notation(value) {
        return Ok(breakdown);
    }
    if value.starts_with('P') {
        return designator::parse(value);
    }

    trace!(value, "parsing relative phrase");
    phrase::parse(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<V: IntoDuration>(value: V) -> String {
        Duration::make(value).unwrap().to_string()
    }

    #[test]
    fn empty() {
        assert_eq!(spec(""), "PT0S");
        assert_eq!(spec("   "), "PT0S");
        assert_eq!(Duration::none().to_string(), "PT0S");
        assert!(Duration::none().is_zero());
    }

    #[test]
    fn clock_notation() {
        assert_eq!(spec("01:23"), "PT1M23S");
        assert_eq!(spec("01:23:45"), "PT1H23M45S");
        assert_eq!(spec("90:00"), "PT1H30M");
        assert_eq!(spec("25:00:00"), "P1DT1H");
        assert!(Duration::make("1:2:3:4").is_err());
        assert!(Duration::make("1:").is_err());
    }

    #[test]
    fn designators() {
        assert_eq!(spec("P1DT1H"), "P1DT1H");
        assert_eq!(spec("PT24H"), "P1D");
        assert_eq!(spec("PT24H60M"), "P1DT1H");
        assert_eq!(spec("P0Y0M0DT0H0M3600S"), "PT1H");
        assert_eq!(spec("PT0S"), "PT0S");

        let error = Duration::make("P1X").unwrap_err();
        assert_eq!(error.reason(), "Unknown or bad format (P1X)");
    }

    #[test]
    fn from_spec() {
        assert_eq!(Duration::from_spec("PT90M").unwrap().to_string(), "PT1H30M");
        let error = Duration::from_spec("13 minutes").unwrap_err();
        assert_eq!(error.reason(), "Unknown or bad format (13 minutes)");
    }

    #[test]
    fn phrases() {
        assert_eq!(spec("13 minutes 37 seconds"), "PT13M37S");
        assert_eq!(spec("1 hour"), "PT1H");
        assert_eq!(spec("90 minutes"), "PT1H30M");
        assert_eq!(spec("2 hours 5 minutes"), "PT2H5M");

        let error = Duration::make("a while").unwrap_err();
        assert_eq!(error.reason(), "'a while' is not a valid duration");
    }

    #[test]
    fn bare_numbers() {
        let error = Duration::make("1337").unwrap_err();
        assert_eq!(error.reason(), "A duration needs a unit, '1337' has none");
        assert!(Duration::make(5).is_err());
        assert!(Duration::make(-5).is_err());
        assert!(Duration::make(1.5).is_err());
    }

    #[test]
    fn zero_like_values() {
        assert_eq!(spec(0), "PT0S");
        assert_eq!(spec(0u64), "PT0S");
        assert_eq!(spec(0.0), "PT0S");
        assert_eq!(spec(None::<&str>), "PT0S");
        assert_eq!(spec(Some("1 hour")), "PT1H");
    }

    #[test]
    fn existing_values() {
        let duration = Duration::make("PT24H").unwrap();
        assert_eq!(spec(duration), "P1D");
        assert_eq!(spec(&duration), "P1D");
        assert_eq!(spec(Breakdown::hours(24)), "P1D");
        assert_eq!(spec(String::from("1 day")), "P1D");
        assert_eq!(spec(&String::from("1 day")), "P1D");
    }

    #[test]
    fn breakdowns_are_normalized_by_the_global_calendar() {
        use chrono::{TimeZone, Utc};

        // 29 days are a month from Jan 31 2024, but not necessarily from the global reference
        let pinned = Calendar::new(Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap());
        let month = pinned.normalize(&Breakdown::days(29)).unwrap();
        assert_eq!(month, Breakdown::months(1));

        let duration = Duration::make(month).unwrap();
        let expected = Calendar::global().normalize(&Breakdown::months(1)).unwrap();
        assert_eq!(Breakdown::from(duration), expected);
        assert_eq!(duration, Duration::make("P1M").unwrap());
    }

    #[test]
    fn time_types() {
        assert_eq!(spec(time::Duration::from_secs(7200)), "PT2H");
        assert_eq!(spec(time::Duration::from_millis(2500)), "PT2S");
        assert_eq!(spec(TimeDelta::seconds(3661)), "PT1H1M1S");
        let error = Duration::make(TimeDelta::seconds(-1)).unwrap_err();
        assert_eq!(error.reason(), "A duration cannot be smaller than zero");
    }

    #[test]
    fn json_values() {
        use serde_json::json;

        assert_eq!(spec(json!(null)), "PT0S");
        assert_eq!(spec(json!(0)), "PT0S");
        assert_eq!(spec(json!("01:23")), "PT1M23S");

        let error = Duration::make(json!(true)).unwrap_err();
        assert_eq!(error.reason(), "A boolean is not a duration");
        assert!(Duration::make(json!(false)).is_err());
        assert!(Duration::make(json!(12)).is_err());

        let error = Duration::make(json!({"hours": 1})).unwrap_err();
        assert_eq!(
            error.reason(),
            "The given value cannot be converted to a string"
        );
        assert!(Duration::make(json!(["PT1H"])).is_err());
    }

    #[test]
    fn conversions() {
        let duration: Duration = "P1DT1H".parse().unwrap();
        assert_eq!(String::from(duration), "P1DT1H");
        assert_eq!(Breakdown::from(duration), Breakdown::new(0, 0, 1, 1, 0, 0));
        assert_eq!(duration.days(), 1);
        assert_eq!(duration.hours(), 1);
        assert_eq!(duration.to_spec(), "P1DT1H");
        assert_eq!(
            duration.to_time_delta().unwrap(),
            TimeDelta::seconds(90_000)
        );

        assert!(Duration::try_from("PT1H").is_ok());
        assert!(Duration::try_from(String::from("nonsense")).is_err());
    }

    #[test]
    fn serialize() {
        let duration = Duration::make("1 hour").unwrap();
        assert_eq!(serde_json::to_string(&duration).unwrap(), r#""PT1H""#);
        assert_eq!(
            serde_json::to_value(Duration::none()).unwrap(),
            serde_json::json!("PT0S")
        );
    }

    #[test]
    fn deserialize() {
        let duration: Duration = serde_json::from_str(r#""90 minutes""#).unwrap();
        assert_eq!(duration.to_string(), "PT1H30M");
        let duration: Duration = serde_json::from_str("null").unwrap();
        assert!(duration.is_zero());
        let duration: Duration = serde_json::from_str("0").unwrap();
        assert!(duration.is_zero());

        assert!(serde_json::from_str::<Duration>("true").is_err());
        assert!(serde_json::from_str::<Duration>("42").is_err());
        assert!(serde_json::from_str::<Duration>("[]").is_err());
        let error = serde_json::from_str::<Duration>(r#"{"a": 1}"#).unwrap_err();
        assert!(error
            .to_string()
            .starts_with("The given value cannot be converted to a string"));
    }
}
