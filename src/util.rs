use itertools::Itertools;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::eof,
    error::{ErrorKind, ParseError},
    IResult, Parser,
};

/// Number of columns a horizontal tab expands to.
pub const TAB_WIDTH: usize = 4;

/// Brings raw input into the shape both grammars expect.
///
/// - CRLF and lone CR become LF
/// - every tab becomes [`TAB_WIDTH`] spaces
/// - lines made of whitespace only become empty
///
/// Applying it to already normalized text changes nothing.
pub fn normalize(text: &str) -> String {
    let text = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', &" ".repeat(TAB_WIDTH));
    text.split('\n')
        .map(|line| {
            if line.chars().all(char::is_whitespace) {
                ""
            } else {
                line
            }
        })
        .join("\n")
}

/// Count of leading `c` characters (all of them are single-byte)
pub(crate) fn count_leading(input: &str, c: u8) -> usize {
    input.bytes().take_while(|b| *b == c).count()
}

/// Byte offset of the end of the first line (position of `\n`, or input length)
pub(crate) fn line_end(input: &str) -> usize {
    input.find('\n').unwrap_or(input.len())
}

/// Matches a run of newlines, or the very end of input
///
/// Nearly every block construct is terminated this way.
pub(crate) fn newlines_or_eof<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    alt((take_while1(|c: char| c == '\n'), eof))(input)
}

/// Any (Unicode) whitespace, including newlines
pub(crate) fn whitespace0<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    take_while(char::is_whitespace)(input)
}

pub(crate) fn whitespace1<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    take_while1(char::is_whitespace)(input)
}

fn shortest<'source, O, E, P>(
    allow_empty: bool,
    mut terminator: P,
) -> impl FnMut(&'source str) -> IResult<&'source str, (&'source str, O), E>
where
    E: ParseError<&'source str>,
    P: Parser<&'source str, O, E>,
{
    move |input: &'source str| {
        let ends = input.char_indices().map(|(ind, c)| ind + c.len_utf8());
        let ends = allow_empty.then_some(0).into_iter().chain(ends);
        for end in ends {
            match terminator.parse(&input[end..]) {
                Ok((rest, out)) => return Ok((rest, (&input[..end], out))),
                Err(nom::Err::Error(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::TakeUntil)))
    }
}

/// Lazy `take_until` with a parser for the terminator: the shortest (possibly empty) prefix
/// after which `terminator` matches. Yields the prefix and terminator's output, consuming both.
pub(crate) fn shortest_until<'source, O, E, P>(
    terminator: P,
) -> impl FnMut(&'source str) -> IResult<&'source str, (&'source str, O), E>
where
    E: ParseError<&'source str>,
    P: Parser<&'source str, O, E>,
{
    shortest(true, terminator)
}

/// Same as [`shortest_until`], but the prefix is never empty
pub(crate) fn shortest_until1<'source, O, E, P>(
    terminator: P,
) -> impl FnMut(&'source str) -> IResult<&'source str, (&'source str, O), E>
where
    E: ParseError<&'source str>,
    P: Parser<&'source str, O, E>,
{
    shortest(false, terminator)
}

/// Whether `parser` matches at the start of `input`
pub(crate) fn recognizes<'source, O, P>(mut parser: P, input: &'source str) -> bool
where
    P: Parser<&'source str, O, nom::error::Error<&'source str>>,
{
    parser.parse(input).is_ok()
}

/// Consumes any spaces (never fails)
pub(crate) fn spaces(input: &str) -> (&str, usize) {
    let n = count_leading(input, b' ');
    (&input[n..], n)
}

/// Removes up to `limit` leading spaces from every line of `input`
pub(crate) fn outdent(input: &str, limit: usize) -> String {
    input
        .split('\n')
        .map(|line| &line[count_leading(line, b' ').min(limit)..])
        .join("\n")
}
