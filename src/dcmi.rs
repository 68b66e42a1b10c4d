//! Parser for the DCMI encoding-scheme syntax.
//!
//! DCMI Period, DCMI Point and DCMI Box values are all written as a list of
//! labelled components:
//!
//! ```text
//! name=The Great Depression; start=1929; end=1939;
//! east=-1.47; north=-78.82; elevation=5000;
//! northlimit=37.30134; southlimit=37.2888; eastlimit=-32.275618; westlimit=-32.27982
//! ```
//!
//! Whitespace around `=` and `;` and stray delimiters are tolerated. Keys are
//! lowercased; values are trimmed and kept in document order.

use indexmap::IndexMap;
use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    multi::many0,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};

fn key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))(input)
}

fn value(input: &str) -> IResult<&str, &str> {
    map(take_till(|c| c == ';'), str::trim)(input)
}

fn delimiters(input: &str) -> IResult<&str, Vec<char>> {
    many0(preceded(multispace0, char(';')))(input)
}

fn component(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(delimited(multispace0, key, multispace0), char('='), value)(input)
}

fn components(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    all_consuming(delimited(
        delimiters,
        many0(terminated(component, delimiters)),
        multispace0,
    ))(input)
}

/// Parse a `key=value; key=value;` list.
///
/// Returns `None` when the text does not follow the syntax or contains no
/// component at all. Later duplicates of a key overwrite earlier ones.
///
/// # Examples
///
/// ```
/// use mdingest::dcmi::parse_components;
///
/// let map = parse_components("start = 2000-01-26 ;end=2000-02-20;").unwrap();
/// assert_eq!(map.get("start").map(String::as_str), Some("2000-01-26"));
/// assert_eq!(map.get("end").map(String::as_str), Some("2000-02-20"));
/// assert!(parse_components("2000-01-26,2000-02-20").is_none());
/// ```
#[must_use]
pub fn parse_components(text: &str) -> Option<IndexMap<String, String>> {
    let (_, pairs) = components(text).ok()?;
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect(),
    )
}
