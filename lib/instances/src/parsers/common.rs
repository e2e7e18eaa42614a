use super::nom_prelude::*;
use crate::Error;
use crate::raw::{Time, ExtId};

pub fn usize_<'a, E>(input: &'a str) -> IResult<&'a str, usize, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, usize::from_str)(input)
}

pub fn u32_<'a, E>(input: &'a str) -> IResult<&'a str, u32, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, u32::from_str)(input)
}

/// `H:MM` or `H:MM:SS`, as whole minutes since midnight. Seconds are truncated to minutes.
pub fn time_of_day<'a, E>(input: &'a str) -> IResult<&'a str, Time, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  map_opt(
    tuple((
      u32_,
      preceded(char(':'), u32_),
      opt(preceded(char(':'), u32_)),
    )),
    |(h, m, s)| h.checked_mul(60)?
      .checked_add(m)?
      .checked_add(s.unwrap_or(0) / 60),
  )(input)
}

/// Decimal number where either `,` or `.` separates the fraction.
pub fn decimal<'a, E>(input: &'a str) -> IResult<&'a str, f64, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseFloatError>
{
  map_res(
    recognize(tuple((
      opt(one_of("+-")),
      digit1,
      opt(pair(one_of(",."), digit0)),
    ))),
    |s: &str| s.replace(',', ".").parse::<f64>(),
  )(input)
}

/// Identifier with a three letter prefix, e.g. `CAR17`.
pub fn prefixed_id<'a, E>(input: &'a str) -> IResult<&'a str, ExtId, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  preceded(take_while_m_n(3, 3, |c: char| c.is_ascii_alphabetic()), u32_)(input)
}

pub fn flag(token: &str) -> bool {
  matches!(token.to_ascii_lowercase().as_str(), "y" | "yes" | "1" | "true" | "+")
}

/// Run `parser` over a complete token.
pub fn token<'a, O, F>(parser: F, input: &'a str) -> Option<O>
  where
    F: Parser<&'a str, O, error::Error<&'a str>>
{
  all_consuming(parser)(input).finish().ok().map(|(_, v)| v)
}


/// A whitespace-split line of a raw table.
#[derive(Debug, Clone)]
pub struct Row<'a> {
  pub table: &'static str,
  /// 1-based line number in the source.
  pub line: usize,
  pub fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
  pub fn new(table: &'static str, line: usize, text: &'a str) -> Self {
    Row { table, line, fields: text.split_whitespace().collect() }
  }

  pub fn malformed(&self, reason: impl Into<String>) -> Error {
    Error::MalformedRow { table: self.table, line: self.line, reason: reason.into() }
  }

  pub fn require(&self, n: usize) -> Result<(), Error> {
    if self.fields.len() < n {
      Err(self.malformed(format!("expected at least {} fields, found {}", n, self.fields.len())))
    } else {
      Ok(())
    }
  }

  pub fn get(&self, idx: usize) -> Result<&'a str, Error> {
    self.fields.get(idx).copied()
      .ok_or_else(|| self.malformed(format!("missing field {}", idx + 1)))
  }

  pub fn last(&self) -> Result<&'a str, Error> {
    self.fields.last().copied().ok_or_else(|| self.malformed("empty row"))
  }

  /// Parse field `idx` with a nom parser, `what` names the field in the error message.
  pub fn parse<O, F>(&self, idx: usize, what: &str, parser: F) -> Result<O, Error>
    where
      F: Parser<&'a str, O, error::Error<&'a str>>
  {
    let field = self.get(idx)?;
    token(parser, field).ok_or_else(|| self.malformed(format!("invalid {} {:?}", what, field)))
  }
}

/// Numbered, non-blank lines of `text` following the first `header` lines.
pub fn data_lines(text: &str, header: usize) -> impl Iterator<Item=(usize, &str)> {
  text.lines()
    .enumerate()
    .skip(header)
    .map(|(k, l)| (k + 1, l.trim()))
    .filter(|(_, l)| !l.is_empty())
}
