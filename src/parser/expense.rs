//! Parse an expense line.
//!
//! Since expenses have a more or less complex syntax, we use nom.

use std::cmp::Ordering;

use nom::{
    bytes::complete::{is_not, tag},
    character::complete::{char, multispace0, multispace1, not_line_ending},
    combinator::{map_res, opt},
    multi::many1,
    sequence::preceded,
    AsChar, IResult, InputTakeAtPosition,
};

use crate::types::{Amount, ParticipantId};

/// An expense as written in the snapshot. Amount and date are kept as text so
/// that the caller can report them precisely when they are invalid.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedExpense<'a> {
    pub paid_by: ParticipantId,
    pub amount: &'a str,
    pub split_with: Vec<ParticipantId>,
    pub category: Option<&'a str>,
    pub date: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Parse `<paid_by> <amount> <split_with...> [#category] [@date] [- description]`.
pub fn parse_expense(s: &str) -> IResult<&str, ParsedExpense> {
    let (s, paid_by) = preceded(multispace0, parse_participant_id)(s)?;
    let (s, amount) = preceded(multispace1, float1)(s)?;
    let (s, split_with) = many1(preceded(multispace1, parse_participant_id))(s)?;
    let (s, category) = opt(preceded(multispace1, preceded(char('#'), token)))(s)?;
    let (s, date) = opt(preceded(multispace1, preceded(char('@'), token)))(s)?;
    let (s, description) = parse_description(s)?;

    Ok((
        s,
        ParsedExpense {
            paid_by,
            amount,
            split_with,
            category,
            date,
            description,
        },
    ))
}

/// Parse `member <id> <display name>`, returning the raw id and the name.
pub fn parse_member(s: &str) -> IResult<&str, (&str, &str)> {
    let (s, _) = preceded(multispace0, tag("member"))(s)?;
    let (s, id) = preceded(multispace1, token)(s)?;
    let (s, name) = preceded(multispace1, not_line_ending)(s)?;
    Ok((s, (id, name.trim())))
}

fn token(s: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n")(s)
}

fn parse_participant_id(s: &str) -> IResult<&str, ParticipantId> {
    map_res(token, |t: &str| t.parse::<ParticipantId>())(s)
}

fn float1(s: &str) -> IResult<&str, &str> {
    s.split_at_position1_complete(
        |item| !item.is_dec_digit() && item != ',' && item != '.' && item != '-' && item != '+',
        nom::error::ErrorKind::Float,
    )
}

fn parse_description(s: &str) -> IResult<&str, Option<&str>> {
    opt(preceded(multispace0, preceded(tag("- "), not_line_ending)))(s)
}

/// Convert a decimal amount (`.` or `,` as separator) to minor units.
///
/// Missing fractional digits are padded with zeros, extra ones are truncated.
pub fn amount_to_minor_units(x: &str, digits: u32) -> Option<Amount> {
    let digits = digits as usize;
    let components: Vec<_> = x.split(&[',', '.']).collect();
    let (integer_part, fractional_part) = match components.as_slice() {
        [integer_part] => (*integer_part, ""),
        [integer_part, fractional_part] => (*integer_part, *fractional_part),
        _ => return None,
    };
    if !fractional_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let fractional_part = match fractional_part.len().cmp(&digits) {
        Ordering::Less => format!("{fractional_part:0<digits$}"),
        Ordering::Greater => fractional_part[0..digits].to_string(),
        Ordering::Equal => fractional_part.to_string(),
    };
    let integer_part = match integer_part {
        "" | "+" | "-" => format!("{integer_part}0"),
        _ => integer_part.to_string(),
    };
    (integer_part + &fractional_part).parse::<Amount>().ok()
}
