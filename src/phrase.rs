//! Free-form relative phrases such as `13 minutes 37 seconds` or `1 hour and 7 minutes`.
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit1, satisfy, space0, space1};
use nom::combinator::{all_consuming, map_res, not, opt, value};
use nom::error::context;
use nom::multi::separated_list1;
use nom::sequence::{preceded, terminated, tuple};
use nom::IResult;

use crate::breakdown::Breakdown;
use crate::error::{InvalidDuration, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Fortnights,
    Months,
    Quarters,
    Years,
}

impl Unit {
    fn times(self, amount: u32) -> Option<Breakdown> {
        let breakdown = match self {
            Unit::Seconds => Breakdown::seconds(amount),
            Unit::Minutes => Breakdown::minutes(amount),
            Unit::Hours => Breakdown::hours(amount),
            Unit::Days => Breakdown::days(amount),
            Unit::Weeks => Breakdown::days(amount.checked_mul(7)?),
            Unit::Fortnights => Breakdown::days(amount.checked_mul(14)?),
            Unit::Months => Breakdown::months(amount),
            Unit::Quarters => Breakdown::months(amount.checked_mul(3)?),
            Unit::Years => Breakdown::years(amount),
        };
        Some(breakdown)
    }
}

/// A unit word that is not immediately followed by another letter, so `s` never eats `spoons`
fn word<'a>(alias: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(alias), not(satisfy(|c: char| c.is_alphabetic())))
}

/// Parse seconds
///
/// * `seconds`, `second`, `secs`, `sec`, `s`
fn parse_seconds<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "seconds",
        value(
            Unit::Seconds,
            alt((
                word("seconds"),
                word("second"),
                word("secs"),
                word("sec"),
                word("s"),
            )),
        ),
    )(input)
}

/// Parse minutes
///
/// * `minutes`, `minute`, `mins`, `min`
///
/// A bare `m` is not accepted, it could just as well mean months.
fn parse_minutes<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "minutes",
        value(
            Unit::Minutes,
            alt((word("minutes"), word("minute"), word("mins"), word("min"))),
        ),
    )(input)
}

/// Parse hours
///
/// * `hours`, `hour`, `hrs`, `hr`, `h`
fn parse_hours<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "hours",
        value(
            Unit::Hours,
            alt((word("hours"), word("hour"), word("hrs"), word("hr"), word("h"))),
        ),
    )(input)
}

/// Parse days
///
/// * `days`, `day`, `d`
fn parse_days<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "days",
        value(Unit::Days, alt((word("days"), word("day"), word("d")))),
    )(input)
}

/// Parse weeks, 7 days each
///
/// * `weeks`, `week`, `wks`, `wk`, `w`
fn parse_weeks<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "weeks",
        value(
            Unit::Weeks,
            alt((word("weeks"), word("week"), word("wks"), word("wk"), word("w"))),
        ),
    )(input)
}

/// Parse fortnights, 14 days each
fn parse_fortnights<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "fortnights",
        value(
            Unit::Fortnights,
            alt((word("fortnights"), word("fortnight"))),
        ),
    )(input)
}

/// Parse calendar months
///
/// * `months`, `month`, `mo`
fn parse_months<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "months",
        value(Unit::Months, alt((word("months"), word("month"), word("mo")))),
    )(input)
}

/// Parse quarters, 3 calendar months each
///
/// * `quarters`, `quarter`, `qtr`, `q`
fn parse_quarters<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "quarters",
        value(
            Unit::Quarters,
            alt((word("quarters"), word("quarter"), word("qtr"), word("q"))),
        ),
    )(input)
}

/// Parse calendar years
///
/// * `years`, `year`, `yrs`, `yr`, `y`
fn parse_years<'a>(input: &'a str) -> IResult<&'a str, Unit> {
    context(
        "years",
        value(
            Unit::Years,
            alt((word("years"), word("year"), word("yrs"), word("yr"), word("y"))),
        ),
    )(input)
}

/// Parse a single `<amount> <unit>` item. Without an amount the unit counts once.
///
/// e.g. `5 minutes`, `5minutes`, `hour`
fn parse_item<'a>(input: &'a str) -> IResult<&'a str, (u32, Unit)> {
    context("item", |input: &'a str| {
        // Optional amount
        let (input, amount) = opt(terminated(
            map_res(digit1, |digits: &str| digits.parse::<u32>()),
            space0,
        ))(input)?;
        // Unit literal
        let (input, unit) = alt((
            parse_seconds,
            parse_minutes,
            parse_hours,
            parse_days,
            parse_weeks,
            parse_fortnights,
            parse_months,
            parse_quarters,
            parse_years,
        ))(input)?;
        Ok((input, (amount.unwrap_or(1), unit)))
    })(input)
}

/// Items are separated by whitespace, a comma or the word `and`
fn parse_separator<'a>(input: &'a str) -> IResult<&'a str, ()> {
    context(
        "separator",
        value(
            (),
            alt((
                value(
                    (),
                    tuple((
                        space0,
                        char(','),
                        space0,
                        opt(tuple((tag_no_case("and"), space1))),
                    )),
                ),
                value((), tuple((space1, tag_no_case("and"), space1))),
                value((), space1),
            )),
        ),
    )(input)
}

/// Parse a whole phrase, with an optional leading `+`
fn parse_phrase<'a>(input: &'a str) -> IResult<&'a str, Vec<(u32, Unit)>> {
    context(
        "phrase",
        preceded(
            tuple((space0, opt(char('+')), space0)),
            terminated(separated_list1(parse_separator, parse_item), space0),
        ),
    )(input)
}

/// Parse a relative phrase into a raw breakdown.
///
/// Units are summed as written, `90 minutes` stays 90 minutes until normalized.
pub fn parse(phrase: &str) -> Result<Breakdown> {
    let invalid = || InvalidDuration::because(format!("'{phrase}' is not a valid duration"));

    let (_, items) = all_consuming(parse_phrase)(phrase)
        .map_err(|e| invalid().caused_by(e.to_string()))?;

    items
        .into_iter()
        .try_fold(Breakdown::default(), |total, (amount, unit)| {
            unit.times(amount)
                .and_then(|breakdown| total.checked_add(&breakdown))
        })
        .ok_or_else(|| invalid().caused_by("component overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds() {
        for input in ["5 seconds", "5 second", "5 secs", "5 sec", "5 s", "5seconds", "5     s"] {
            assert_eq!(parse(input).unwrap(), Breakdown::seconds(5), "{input}");
        }
        assert_eq!(parse("second").unwrap(), Breakdown::seconds(1));
    }

    #[test]
    fn minutes() {
        for input in ["5 minutes", "5 minute", "5 mins", "5 min", "5minutes"] {
            assert_eq!(parse(input).unwrap(), Breakdown::minutes(5), "{input}");
        }
        assert_eq!(parse("minute").unwrap(), Breakdown::minutes(1));
        assert!(parse("5 m").is_err());
    }

    #[test]
    fn hours() {
        for input in ["5 hours", "5 hour", "5 hrs", "5 hr", "5 h", "5hours"] {
            assert_eq!(parse(input).unwrap(), Breakdown::hours(5), "{input}");
        }
        assert_eq!(parse("hour").unwrap(), Breakdown::hours(1));
    }

    #[test]
    fn days_and_weeks() {
        for input in ["5 days", "5 day", "5 d"] {
            assert_eq!(parse(input).unwrap(), Breakdown::days(5), "{input}");
        }
        for input in ["2 weeks", "2 week", "2 wks", "2 wk", "2 w", "1 fortnight"] {
            assert_eq!(parse(input).unwrap(), Breakdown::days(14), "{input}");
        }
        assert_eq!(parse("2 fortnights").unwrap(), Breakdown::days(28));
    }

    #[test]
    fn calendar_units() {
        for input in ["5 months", "5 month", "5 mo"] {
            assert_eq!(parse(input).unwrap(), Breakdown::months(5), "{input}");
        }
        assert_eq!(parse("1 quarter").unwrap(), Breakdown::months(3));
        assert_eq!(parse("2 qtr").unwrap(), Breakdown::months(6));
        for input in ["5 years", "5 year", "5 yrs", "5 yr", "5 y"] {
            assert_eq!(parse(input).unwrap(), Breakdown::years(5), "{input}");
        }
    }

    #[test]
    fn phrases() {
        assert_eq!(
            parse("13 minutes 37 seconds").unwrap(),
            Breakdown::new(0, 0, 0, 0, 13, 37)
        );
        assert_eq!(
            parse("2 hours 5 minutes").unwrap(),
            Breakdown::new(0, 0, 0, 2, 5, 0)
        );
        assert_eq!(
            parse("1 hour and 7 minutes").unwrap(),
            Breakdown::new(0, 0, 0, 1, 7, 0)
        );
        assert_eq!(
            parse("1 day, 2 hours, and 3 minutes").unwrap(),
            Breakdown::new(0, 0, 1, 2, 3, 0)
        );
        assert_eq!(parse("+1 Day").unwrap(), Breakdown::days(1));
        assert_eq!(parse("90 minutes").unwrap(), Breakdown::minutes(90));
        // Repeated units add up
        assert_eq!(parse("1 hour 1 hour").unwrap(), Breakdown::hours(2));
    }

    #[test]
    fn invalid_phrases() {
        for input in ["", "5", "5 spoons", "minutes 5", "1 hour and", "-1 day", "5 secondly"] {
            let error = parse(input).unwrap_err();
            assert_eq!(error.reason(), format!("'{input}' is not a valid duration"));
        }
    }

    #[test]
    fn overflow() {
        assert!(parse("4294967295 weeks").is_err());
        assert!(parse("4294967295 seconds 1 second").is_err());
    }
}
