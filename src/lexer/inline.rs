use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1, take_while_m_n},
    character::complete::{anychar, char, one_of},
    combinator::{cut, eof, fail, map, not, opt, peek, recognize},
    error::{context, ContextError, ErrorKind, ParseError},
    sequence::{pair, preceded, terminated, tuple},
    IResult, Parser,
};
use smart_default::SmartDefault;

use super::{applied, LexError, Level};
use crate::{
    gen::{Fragment, Renderer},
    util::{shortest_until, shortest_until1, whitespace0, whitespace1},
};

/// Inline-level grammar rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum InlineRule {
    #[display(fmt = "emph")]
    Emph,
    #[display(fmt = "italic")]
    Italic,
    #[display(fmt = "link")]
    Link,
    #[display(fmt = "inline_code")]
    InlineCode,
    #[display(fmt = "text")]
    Text,
}

/// Ordered inline rule set. Order is precedence.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct InlineRules {
    #[default(_code = "vec![
        InlineRule::Emph,
        InlineRule::Italic,
        InlineRule::Link,
        InlineRule::InlineCode,
        InlineRule::Text,
    ]")]
    pub rules: Vec<InlineRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link<'source> {
    image: bool,
    label: &'source str,
    dest: &'source str,
    title: Option<&'source str>,
}

fn error<'source, O, E: ParseError<&'source str>>(
    input: &'source str,
    kind: ErrorKind,
) -> IResult<&'source str, O, E> {
    Err(nom::Err::Error(E::from_error_kind(input, kind)))
}

/// Shortest non-empty span enclosed by `delimiter`, the closing one not followed by `_`
fn delimited_span<'source, E: ParseError<&'source str>>(
    delimiter: &'static str,
) -> impl FnMut(&'source str) -> IResult<&'source str, &'source str, E> {
    map(
        preceded(
            tag(delimiter),
            shortest_until1(terminated(tag(delimiter), not(char('_')))),
        ),
        |(span, _)| span,
    )
}

/// Parses strong emphasis: `__text__` or `**text**`
fn emph<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    alt((delimited_span("__"), delimited_span("**")))(input)
}

/// Parses emphasis: `_text_` or `*text*`
fn italic<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    alt((delimited_span("_"), delimited_span("*")))(input)
}

/// Every position a link label may end at, in increasing order
///
/// Label consists of
/// - plain characters (no brackets)
/// - `[...]` groups without `^` and `]` inside
/// - a `]`, if another `]` follows before any `[`
fn label_ends(label: &str) -> Vec<usize> {
    let mut ends = vec![0];
    let mut pos = 0;
    loop {
        let tail = &label[pos..];
        let step = match tail.chars().next() {
            None => break,
            Some('[') => match tail[1..].find(['^', ']']) {
                Some(ind) if tail[1 + ind..].starts_with(']') => ind + 2,
                _ => break,
            },
            Some(']') => match tail[1..].find(['[', ']']) {
                Some(ind) if tail[1 + ind..].starts_with(']') => 1,
                _ => break,
            },
            Some(c) => c.len_utf8(),
        };
        pos += step;
        ends.push(pos);
    }
    ends
}

/// Title text up to the closing quote and parenthesis
fn link_title<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    map(
        shortest_until(tuple((one_of("\"'"), whitespace0, char(')')))),
        |(title, _)| title,
    )(input)
}

/// Optional quoted title and the closing parenthesis
fn link_closing<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, Option<&'source str>, E> {
    alt((
        map(preceded(pair(whitespace1, one_of("\"'")), link_title), Some),
        map(preceded(whitespace0, char(')')), |_| None),
    ))(input)
}

/// Shortest destination (with optional title) that is properly closed
fn link_destination<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, (&'source str, Option<&'source str>), E> {
    preceded(
        whitespace0,
        alt((
            preceded(char('<'), shortest_until(preceded(char('>'), link_closing))),
            shortest_until(link_closing),
        )),
    )(input)
}

/// Parses link or image: `[label](dest "title")`, `![label](<dest>)`
///
/// Once a label is followed by `](`, this is a link for sure, so an unclosed destination is
/// a failure rather than a mismatch.
fn link<'source, E: ParseError<&'source str> + ContextError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, Link<'source>, E> {
    let (label, image) = terminated(opt(char('!')), char('['))
        .map(|bang| bang.is_some())
        .parse(input)?;

    let mut opened = false;
    for end in label_ends(label).into_iter().rev() {
        let Some(dest) = label[end..].strip_prefix("](") else {
            continue;
        };
        opened = true;
        if let Ok((rest, (dest, title))) = link_destination::<E>(dest) {
            return Ok((
                rest,
                Link {
                    image,
                    label: &label[..end],
                    dest,
                    title,
                },
            ));
        }
    }

    if opened {
        context("link", cut(fail))(input)
    } else {
        error(input, ErrorKind::Char)
    }
}

/// Shortest non-empty code not ending with a backtick, closed by `fence` (after an optional
/// space) that is not followed by another backtick
fn code_span<'source, E: ParseError<&'source str>>(
    fence: &'source str,
) -> impl FnMut(&'source str) -> IResult<&'source str, &'source str, E> {
    move |code: &'source str| {
        code.char_indices()
            .filter(|&(_, c)| c != '`')
            .find_map(|(ind, c)| {
                let end = ind + c.len_utf8();
                let (rest, _) =
                    tuple((opt(char::<_, E>(' ')), tag(fence), not(char('`'))))(&code[end..])
                        .ok()?;
                Some((rest, &code[..end]))
            })
            .ok_or_else(|| nom::Err::Error(E::from_error_kind(code, ErrorKind::TakeUntil)))
    }
}

/// Parses inline code
///
/// - Backtick run opens it, longer runs are tried first
/// - At most one space is skipped on either side of the code
/// - Code is the shortest non-empty text not ending with a backtick
/// - Closed by the same backtick run, not followed by another backtick
fn inline_code<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    let (_, run) = take_while1(|c: char| c == '`')(input)?;
    for fence_len in (1..=run.len()).rev() {
        let fence = &input[..fence_len];
        let found = preceded(
            tag(fence),
            alt((preceded(char(' '), code_span(fence)), code_span(fence))),
        )(input);
        if found.is_ok() {
            return found;
        }
    }
    error(input, ErrorKind::Char)
}

/// Anything a text run must stop before
fn text_stop<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    alt((
        recognize(one_of("\\<![_*`~")),
        tag("http://"),
        tag("https://"),
        // line break
        recognize(pair(
            take_while_m_n(2, usize::MAX, |c: char| c == ' '),
            char('\n'),
        )),
    ))(input)
}

/// Parses literal text: at least one character, up to the next possible inline construct
fn text<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    recognize(pair(anychar, shortest_until(alt((peek(text_stop), eof)))))(input)
}

/// Inline lexer. Every matched span is handed to the renderer right away.
#[derive(Debug)]
pub struct InlineLexer<'r, R> {
    renderer: &'r R,
    rules: &'r InlineRules,
}

impl<'r, R: Renderer> InlineLexer<'r, R> {
    pub fn new(renderer: &'r R, rules: &'r InlineRules) -> Self {
        Self { renderer, rules }
    }

    /// Renders a text span into a single fragment
    pub fn render(&self, text: &str) -> Result<R::Fragment, LexError> {
        let mut output = self.renderer.placeholder();
        let mut input = text.trim_end_matches('\n');
        'input: while !input.is_empty() {
            for &rule in &self.rules.rules {
                let Some((rest, fragment)) = self.apply(rule, input)? else {
                    continue;
                };
                if rest.len() < input.len() {
                    tracing::trace!(%rule, consumed = input.len() - rest.len(), "inline rule matched");
                    output.append(fragment);
                    input = rest;
                    continue 'input;
                }
            }
            return Err(LexError::no_rule(Level::Inline, input));
        }
        Ok(output)
    }

    fn apply<'source>(
        &self,
        rule: InlineRule,
        input: &'source str,
    ) -> Result<Option<(&'source str, R::Fragment)>, LexError> {
        let renderer = self.renderer;
        Ok(match rule {
            InlineRule::Emph => {
                applied(emph(input))?.map(|(rest, text)| (rest, renderer.emph(text)))
            }
            InlineRule::Italic => {
                applied(italic(input))?.map(|(rest, text)| (rest, renderer.italic(text)))
            }
            InlineRule::Link => applied(link(input))?.map(|(rest, link)| {
                let fragment = if link.image {
                    renderer.image(link.dest, link.label, link.title)
                } else {
                    renderer.link(link.dest, link.label, link.title)
                };
                (rest, fragment)
            }),
            InlineRule::InlineCode => {
                applied(inline_code(input))?.map(|(rest, code)| (rest, renderer.inline_code(code)))
            }
            InlineRule::Text => {
                applied(text(input))?.map(|(rest, text)| (rest, renderer.text(text)))
            }
        })
    }
}
