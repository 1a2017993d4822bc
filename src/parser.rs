// ABOUTME: S-expression reader built on nom combinators

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1, take_while_m_n};
use nom::character::complete::{char, digit0, digit1, one_of};
use nom::combinator::{map, opt, recognize, value};
use nom::error::{Error, ErrorKind};
use nom::multi::many0;
use nom::sequence::preceded;
use nom::{IResult, Parser};

use crate::error::ParseError;
use crate::value::Value;
use std::rc::Rc;

// ============================================================================
// Streaming driver
// ============================================================================

/// Consumes one top-level datum at a time, handing each parse result to the
/// handler. The driver stops when the handler returns an error or when a
/// parse error is reported (the caller may re-prime with fresh input).
pub fn run_parser<E, F>(source: &str, mut handler: F) -> Result<(), E>
where
    F: FnMut(Result<Value, ParseError>) -> Result<(), E>,
{
    let mut rest = source;
    loop {
        if let Ok((after, _)) = ws(rest) {
            rest = after;
        }
        if rest.is_empty() {
            return Ok(());
        }
        match parse_datum(rest) {
            Ok((after, datum)) => {
                handler(Ok(datum))?;
                rest = after;
            }
            Err(err) => {
                handler(Err(render_error(err)))?;
                return Ok(());
            }
        }
    }
}

/// Parses exactly one datum; trailing input (other than whitespace and
/// comments) is an error.
pub fn parse(source: &str) -> Result<Value, ParseError> {
    match parse_datum(source) {
        Ok((rest, datum)) => {
            let rest = ws(rest).map(|(r, _)| r).unwrap_or(rest);
            if rest.is_empty() {
                Ok(datum)
            } else {
                Err(ParseError(format!(
                    "unexpected trailing input: {}",
                    snippet(rest)
                )))
            }
        }
        Err(err) => Err(render_error(err)),
    }
}

fn render_error(err: nom::Err<Error<&str>>) -> ParseError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            if e.input.is_empty() {
                ParseError("unexpected end of input".to_string())
            } else {
                ParseError(format!("unexpected input: {}", snippet(e.input)))
            }
        }
        nom::Err::Incomplete(_) => ParseError("unexpected end of input".to_string()),
    }
}

fn snippet(input: &str) -> String {
    let line = input.lines().next().unwrap_or("");
    let mut end = line.len().min(24);
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{:?}", &line[..end])
}

// ============================================================================
// Grammar
// ============================================================================

fn is_symbol_special(c: char) -> bool {
    matches!(
        c,
        '!' | '$'
            | '%'
            | '&'
            | '*'
            | '+'
            | '-'
            | '.'
            | '/'
            | ':'
            | '<'
            | '='
            | '>'
            | '?'
            | '@'
            | '^'
            | '_'
            | '~'
    )
}

// A standalone `.` is the dot token, so it never starts a symbol, but it may
// continue one.
fn is_symbol_start(c: char) -> bool {
    (c.is_alphabetic() || is_symbol_special(c)) && c != '.'
}

fn is_symbol_continue(c: char) -> bool {
    c.is_alphanumeric() || is_symbol_special(c)
}

/// Skips whitespace and `;` line comments between tokens.
fn ws(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), take_while1(char::is_whitespace)),
            value((), (char(';'), take_while(|c| c != '\r' && c != '\n'))),
        ))),
    )
    .parse(input)
}

fn parse_datum(input: &str) -> IResult<&str, Value> {
    let (input, _) = ws(input)?;
    alt((
        parse_bool,
        parse_number,
        parse_string,
        parse_quoted,
        parse_list,
        parse_symbol,
    ))
    .parse(input)
}

fn parse_bool(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("#t")),
        value(Value::Bool(false), tag("#f")),
    ))
    .parse(input)
}

/// `[+-]? digits ('.' digits*)? ([eE] [+-]? digits)?`. A sign not followed
/// by a digit backtracks into symbol parsing.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, literal) = recognize((
        opt(one_of("+-")),
        digit1,
        opt(preceded(char('.'), digit0)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;
    match literal.parse::<f64>() {
        Ok(num) => Ok((rest, Value::Num(num))),
        Err(_) => Err(nom::Err::Failure(Error::new(input, ErrorKind::Float))),
    }
}

/// Double-quoted string with the escapes `\\`, `\t`, `\n`, `\"`. Any other
/// escape, or a missing closing quote, is a hard failure.
fn parse_string(input: &str) -> IResult<&str, Value> {
    let (body, _) = char('"').parse(input)?;
    let mut bytes: Vec<u8> = Vec::new();
    let mut chars = body.char_indices();
    loop {
        match chars.next() {
            Some((end, '"')) => {
                return Ok((&body[end + 1..], Value::Str(Rc::from(bytes))));
            }
            Some((at, '\\')) => match chars.next() {
                Some((_, '\\')) => bytes.push(b'\\'),
                Some((_, 't')) => bytes.push(b'\t'),
                Some((_, 'n')) => bytes.push(b'\n'),
                Some((_, '"')) => bytes.push(b'"'),
                _ => {
                    return Err(nom::Err::Failure(Error::new(&body[at..], ErrorKind::Escaped)))
                }
            },
            Some((_, c)) => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            None => return Err(nom::Err::Failure(Error::new(body, ErrorKind::Char))),
        }
    }
}

fn parse_quoted(input: &str) -> IResult<&str, Value> {
    alt((
        map(preceded(tag(",@"), parse_datum), Value::unquote_splicing),
        map(preceded(char(','), parse_datum), Value::unquote),
        map(preceded(char('\''), parse_datum), Value::quote),
        map(preceded(char('`'), parse_datum), Value::quasiquote),
    ))
    .parse(input)
}

/// `(` items `)` or `[` items `]`, with `datum . datum` tails after at least
/// one item. The empty list is `Nil`.
fn parse_list(input: &str) -> IResult<&str, Value> {
    let (after_open, open) = one_of("([").parse(input)?;
    let close = if open == '(' { ')' } else { ']' };

    let mut items = Vec::new();
    let mut rest = after_open;
    loop {
        let (after_ws, _) = ws(rest)?;
        rest = after_ws;

        if let Ok((after, _)) = char::<_, Error<&str>>(close)(rest) {
            return Ok((after, Value::list(items)));
        }

        if !items.is_empty() {
            if let Ok((after, _)) = char::<_, Error<&str>>('.')(rest) {
                let (after, tail) = parse_datum(after)?;
                let (after, _) = ws(after)?;
                let (after, _) = char(close).parse(after).map_err(to_failure)?;
                return Ok((after, Value::list_with_tail(items, tail)));
            }
        }

        let (after, datum) = parse_datum(rest).map_err(to_failure)?;
        items.push(datum);
        rest = after;
    }
}

fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let (rest, name) = recognize((
        take_while_m_n(1, 1, is_symbol_start),
        take_while(is_symbol_continue),
    ))
    .parse(input)?;
    Ok((rest, Value::sym(name)))
}

/// Errors inside a list cannot be recovered by trying another alternative.
fn to_failure(err: nom::Err<Error<&str>>) -> nom::Err<Error<&str>> {
    match err {
        nom::Err::Error(e) => nom::Err::Failure(e),
        other => other,
    }
}
