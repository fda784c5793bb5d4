//! The duration designator grammar, `P[nY][nM][nD][T[nH][nM][nS]]`.
//!
//! The week designator is not supported.
use nom::bytes::complete::tag;
use nom::character::complete::digit1;
use nom::combinator::{all_consuming, map_res, opt};
use nom::error::{context, ErrorKind};
use nom::sequence::{preceded, terminated, tuple};
use nom::IResult;

use crate::breakdown::Breakdown;
use crate::error::{InvalidDuration, Result};

/// Parse a number followed by its designator letter, e.g. `12H`
fn component<'a>(designator: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, u32> {
    map_res(terminated(digit1, tag(designator)), |digits: &str| {
        digits.parse::<u32>()
    })
}

/// Parse the time part, `T` followed by at least one of hours, minutes and seconds
fn parse_time<'a>(input: &'a str) -> IResult<&'a str, (u32, u32, u32)> {
    context("time", |input: &'a str| {
        let (rest, (hours, minutes, seconds)) = preceded(
            tag("T"),
            tuple((opt(component("H")), opt(component("M")), opt(component("S")))),
        )(input)?;
        // A lone `T` is not a time
        if hours.is_none() && minutes.is_none() && seconds.is_none() {
            return Err(nom::Err::Error(nom::error::Error::new(input, ErrorKind::Verify)));
        }
        Ok((
            rest,
            (
                hours.unwrap_or(0),
                minutes.unwrap_or(0),
                seconds.unwrap_or(0),
            ),
        ))
    })(input)
}

/// Parse a whole designator
///
/// e.g. `P1Y2M3DT4H5M6S`, `PT1337M`, `P0Y0M0DT0H0M3600S`
fn parse_designator<'a>(input: &'a str) -> IResult<&'a str, Breakdown> {
    context("designator", |input: &'a str| {
        // Literal `P`
        let (rest, _) = tag("P")(input)?;
        let (rest, (years, months, days)) = tuple((
            opt(component("Y")),
            opt(component("M")),
            opt(component("D")),
        ))(rest)?;
        let (rest, time) = opt(parse_time)(rest)?;

        // `P` on its own says nothing
        if years.is_none() && months.is_none() && days.is_none() && time.is_none() {
            return Err(nom::Err::Error(nom::error::Error::new(input, ErrorKind::Verify)));
        }

        let (hours, minutes, seconds) = time.unwrap_or_default();
        Ok((
            rest,
            Breakdown {
                years: years.unwrap_or(0),
                months: months.unwrap_or(0),
                days: days.unwrap_or(0),
                hours,
                minutes,
                seconds,
            },
        ))
    })(input)
}

/// Parse a designator into a raw breakdown, rejecting anything but a complete designator.
pub fn parse(spec: &str) -> Result<Breakdown> {
    match all_consuming(parse_designator)(spec) {
        Ok((_, breakdown)) => Ok(breakdown),
        Err(e) => Err(InvalidDuration::because(format!("Unknown or bad format ({spec})"))
            .caused_by(e.to_string())),
    }
}
