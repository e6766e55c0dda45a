use std::borrow::Cow;

use itertools::Itertools;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1, take_while, take_while1, take_while_m_n},
    character::complete::{char, digit1, none_of, one_of, space0},
    combinator::{cut, eof, fail, map, opt, recognize, verify},
    error::{context, ContextError, ErrorKind, ParseError},
    multi::many1_count,
    sequence::{delimited, pair, terminated, tuple},
    IResult, Parser,
};
use smart_default::SmartDefault;

use super::{applied, LexError, Level, RuleResult};
use crate::{
    data::Token,
    util::{
        count_leading, line_end, newlines_or_eof, outdent, recognizes, shortest_until1, spaces,
        whitespace0,
    },
};

/// Block-level grammar rules.
///
/// Order inside a rule set is precedence: earlier rules are tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BlockRule {
    #[display(fmt = "newline")]
    Newline,
    #[display(fmt = "block_code")]
    BlockCode,
    #[display(fmt = "fences_code")]
    FencesCode,
    #[display(fmt = "hrule")]
    Hrule,
    #[display(fmt = "heading")]
    Heading,
    #[display(fmt = "lheading")]
    LHeading,
    #[display(fmt = "block_quote")]
    BlockQuote,
    #[display(fmt = "list_block")]
    ListBlock,
    #[display(fmt = "text")]
    Text,
}

/// Rule sets used by the block lexer.
///
/// `default` drives the document itself and block quote bodies,
/// `list` drives list item bodies.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct BlockRules {
    #[default(_code = "vec![
        BlockRule::Newline,
        BlockRule::BlockCode,
        BlockRule::FencesCode,
        BlockRule::Hrule,
        BlockRule::Heading,
        BlockRule::LHeading,
        BlockRule::BlockQuote,
        BlockRule::ListBlock,
        BlockRule::Text,
    ]")]
    pub default: Vec<BlockRule>,
    #[default(_code = "vec![
        BlockRule::Newline,
        BlockRule::BlockCode,
        BlockRule::FencesCode,
        BlockRule::Hrule,
        BlockRule::BlockQuote,
        BlockRule::ListBlock,
        BlockRule::Text,
    ]")]
    pub list: Vec<BlockRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleSet {
    Default,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fenced<'source> {
    lang: Option<&'source str>,
    body: &'source str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListBlock<'source> {
    span: &'source str,
    bullet: &'source str,
}

fn error<'source, O, E: ParseError<&'source str>>(
    input: &'source str,
    kind: ErrorKind,
) -> IResult<&'source str, O, E> {
    Err(nom::Err::Error(E::from_error_kind(input, kind)))
}

/// Parses a run of newlines, yielding its length
fn newline<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, usize, E> {
    take_while1(|c: char| c == '\n')
        .map(|run: &str| run.len())
        .parse(input)
}

/// Parses indented code
///
/// - Every line starts with four spaces, followed by at least one more character
/// - Any number of newlines may follow each line
fn block_code<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    recognize(many1_count(tuple((
        tag("    "),
        take_till1(|c: char| c == '\n'),
        take_while(|c: char| c == '\n'),
    ))))(input)
}

/// Rest of the opening fence line: optional one-word language and a newline
fn fence_opening<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    delimited(
        space0,
        take_till(char::is_whitespace),
        pair(space0, char('\n')),
    )(input)
}

/// Shortest non-empty code body closed by optional whitespace and the very same fence
fn fence_body<'source, E: ParseError<&'source str>>(
    fence: &'source str,
) -> impl FnMut(&'source str) -> IResult<&'source str, &'source str, E> {
    map(
        shortest_until1(tuple((whitespace0, tag(fence), space0, newlines_or_eof))),
        |(body, _)| body,
    )
}

/// Parses fenced code
///
/// - Opening line: optional indent, 3+ backticks or tildes, an optional one-word language
/// - Body is the shortest non-empty text after which optional whitespace and the very same fence follow
/// - The closing fence takes the rest of its line and any newlines after it
///
/// Once the opening line is recognized, this is a code block for sure, so a missing closing
/// fence is a failure rather than a mismatch.
fn fences_code<'source, E: ParseError<&'source str> + ContextError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, Fenced<'source>, E> {
    let (line, _) = space0(input)?;
    let (_, fence_run) = alt((
        take_while_m_n(3, usize::MAX, |c: char| c == '`'),
        take_while_m_n(3, usize::MAX, |c: char| c == '~'),
    ))(line)?;

    let mut opened = false;
    // a shorter fence leaves the remaining fence characters to the language word
    for fence_len in (3..=fence_run.len()).rev() {
        let fence = &line[..fence_len];
        let Ok((body, lang)) = fence_opening::<E>(&line[fence_len..]) else {
            continue;
        };
        opened = true;
        if let Ok((rest, body)) = fence_body::<E>(fence)(body) {
            let lang = (!lang.is_empty()).then_some(lang);
            return Ok((rest, Fenced { lang, body }));
        }
    }

    if opened {
        context("fenced code", cut(fail))(input)
    } else {
        error(input, ErrorKind::Tag)
    }
}

/// Three or more of `-`, `*`, `_` (may be mixed), each followed by optional spaces
fn rule_markers<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, usize, E> {
    verify(
        many1_count(terminated(one_of("-*_"), space0)),
        |markers: &usize| *markers >= 3,
    )(input)
}

/// Parses horizontal rule
///
/// - Up to three spaces of indent
/// - Three or more of `-`, `*`, `_` (may be mixed), optionally separated by spaces
fn hrule<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, (), E> {
    tuple((
        take_while_m_n(0, 3, |c: char| c == ' '),
        rule_markers,
        newlines_or_eof,
    ))
    .map(|_| ())
    .parse(input)
}

/// Length of the longest suffix shaped like `space* #* space*`
fn closing_hashes_len(line: &str) -> usize {
    let trimmed = line
        .trim_end_matches(' ')
        .trim_end_matches('#')
        .trim_end_matches(' ');
    line.len() - trimmed.len()
}

/// Parses ATX header
///
/// - Optional indent, then 1-6 '#'-symbols
/// - Header text is everything up to optional closing hashes and trailing spaces
fn heading<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, (usize, &'source str), E> {
    let (line, _) = space0(input)?;
    let (line, after) = line.split_at(line_end(line));
    let (_, hashes) = take_while_m_n(1, 6, |c: char| c == '#')(line)?;
    // with too few characters left for the text, fewer hashes are tried
    for level in (1..=hashes.len()).rev() {
        let rest = &line[level..];
        if rest.is_empty() {
            continue;
        }
        let rest = &rest[count_leading(rest, b' ').min(rest.len() - 1)..];
        let text_len = (rest.len() - closing_hashes_len(rest)).max(1);
        let (after, _) = newlines_or_eof(after)?;
        return Ok((after, (level, &rest[..text_len])));
    }
    error(input, ErrorKind::Tag)
}

/// Parses setext header
///
/// - A non-empty text line
/// - A line of at least three `=` or `-`; the last of them decides the level
fn lheading<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, (usize, &'source str), E> {
    tuple((
        take_till1(|c: char| c == '\n'),
        char('\n'),
        space0,
        take_while_m_n(3, usize::MAX, |c: char| c == '=' || c == '-'),
        space0,
        newlines_or_eof,
    ))
    .map(|(text, _, _, underline, _, _)| {
        let level = if underline.ends_with('=') { 1 } else { 2 };
        (level, text)
    })
    .parse(input)
}

/// Whether the line opens a quote: `space* > char+`
fn quote_opener(line: &str) -> bool {
    recognizes(tuple((space0, char('>'), none_of("\n"))), line)
}

/// Parses block quote
///
/// - Starts from a line with '>' marker
/// - Every following non-empty line belongs to the quote (lazy continuation)
/// - After blank lines, the quote goes on only if another '>' line follows
fn block_quote<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    let mut rest = input;
    while quote_opener(rest) {
        rest = &rest[line_end(rest)..];
        while let Some(next) = rest.strip_prefix('\n') {
            if next.is_empty() || next.starts_with('\n') {
                break;
            }
            rest = &next[line_end(next)..];
        }
        rest = rest.trim_start_matches('\n');
    }
    if rest.len() == input.len() {
        return error(input, ErrorKind::Char);
    }
    Ok((rest, &input[..input.len() - rest.len()]))
}

/// Strips `space* > space?` from every quote line
fn strip_quote_markers(quote: &str) -> String {
    quote
        .split('\n')
        .map(|line| {
            let (rest, _) = spaces(line);
            match rest.strip_prefix('>') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            }
        })
        .join("\n")
}

/// List bullet: `*`, `+`, `-` or `digits.`
fn bullet<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, &'source str, E> {
    alt((
        recognize(one_of("*+-")),
        recognize(terminated(digit1, char('.'))),
    ))(input)
}

/// Whether input starts with a bullet followed by a space
fn starts_with_bullet(input: &str) -> bool {
    recognizes(pair(bullet, char(' ')), input)
}

/// Whether input starts with a line shaped like `([-*_] space*){3,}`
fn hrule_shaped(line: &str) -> bool {
    recognizes(pair(rule_markers, alt((eof, tag("\n")))), line)
}

/// Checks whether the list ends right before `tail`, yielding length of the terminator
///
/// The list ends on either:
/// - newlines followed by a rule-shaped line (optionally indented like the list)
/// - two newlines, unless an indented line or a sibling bullet follows
/// - three or more newlines
/// - trailing whitespace (`trailing` tells that nothing else follows)
fn list_terminator(tail: &str, indent: &str, trailing: bool) -> Option<usize> {
    let newlines = count_leading(tail, b'\n');
    if newlines >= 1 {
        let next = &tail[newlines..];
        let indented_rule = !indent.is_empty()
            && next.strip_prefix(indent).is_some_and(hrule_shaped);
        if indented_rule || hrule_shaped(next) {
            return Some(newlines);
        }
    }
    if newlines >= 3 {
        return Some(newlines);
    }
    if newlines == 2 {
        let next = &tail[2..];
        let sibling = next.strip_prefix(indent).is_some_and(starts_with_bullet);
        if !next.starts_with(' ') && !sibling {
            return Some(newlines);
        }
    }
    trailing.then_some(tail.len())
}

/// Parses a whole list
///
/// - Starts from an (optionally indented) bullet and a space
/// - Spans the shortest non-empty body that reaches a list terminator
fn list_block<'source, E: ParseError<&'source str>>(
    input: &'source str,
) -> IResult<&'source str, ListBlock<'source>, E> {
    let (body, (indent, bullet, _)) = tuple((space0, bullet, char(' ')))(input)?;
    let body_start = input.len() - body.len();
    let content_end = body.trim_end().len();
    let end = body.char_indices().find_map(|(ind, c)| {
        let end = ind + c.len_utf8();
        list_terminator(&body[end..], indent, end >= content_end)
            .map(|len| body_start + end + len)
    });
    match end {
        Some(end) => Ok((
            &input[end..],
            ListBlock {
                span: &input[..end],
                bullet,
            },
        )),
        None => error(input, ErrorKind::TakeUntil),
    }
}

/// Length of a list item starting at `input`, if there's a bullet line here
///
/// Item spans its bullet line and every following line that does not start a sibling item.
fn list_item_len(input: &str) -> Option<usize> {
    let (after_indent, indent_len) = spaces(input);
    if !starts_with_bullet(after_indent) {
        return None;
    }
    let indent = &input[..indent_len];
    let mut end = line_end(input);
    while let Some(next) = input[end..].strip_prefix('\n') {
        if next.strip_prefix(indent).is_some_and(starts_with_bullet) {
            break;
        }
        end += 1 + line_end(next);
    }
    Some(end)
}

/// Splits a list block into its items
fn list_items(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut pos = 0;
    while pos < list.len() {
        if let Some(len) = list_item_len(&list[pos..]) {
            items.push(&list[pos..pos + len]);
            pos += len;
        }
        pos += line_end(&list[pos..]) + 1;
    }
    items
}

/// Removes the bullet and the spaces after it, yielding the rest and the removed width
fn strip_bullet(item: &str) -> (&str, usize) {
    let head: IResult<&str, &str, nom::error::Error<&str>> =
        recognize(tuple((space0, opt(bullet), space0)))(item);
    match head {
        Ok((rest, head)) => (rest, head.len()),
        Err(_) => (item, 0),
    }
}

/// Whether item has a blank line with some content after it
fn has_inner_blank(item: &str) -> bool {
    // later blank lines only have less content after them, so the first one decides
    item.find("\n\n")
        .is_some_and(|ind| !item[ind + 2..].trim().is_empty())
}

/// Splits the input into block-level tokens.
#[derive(Debug, Clone)]
pub struct BlockLexer<'rules> {
    rules: &'rules BlockRules,
    max_depth: usize,
}

impl<'rules> BlockLexer<'rules> {
    pub fn new(rules: &'rules BlockRules, max_depth: usize) -> Self {
        Self { rules, max_depth }
    }

    /// Lexes the whole input with the default rule set
    pub fn lex<'source>(&self, input: &'source str) -> Result<Vec<Token<'source>>, LexError> {
        let mut tokens = Vec::new();
        self.lex_into(input, RuleSet::Default, 0, &mut tokens)?;
        Ok(tokens)
    }

    fn lex_into<'source>(
        &self,
        input: &'source str,
        set: RuleSet,
        depth: usize,
        tokens: &mut Vec<Token<'source>>,
    ) -> Result<(), LexError> {
        if depth > self.max_depth {
            return Err(LexError::TooDeep {
                limit: self.max_depth,
            });
        }
        let rules = match set {
            RuleSet::Default => &self.rules.default,
            RuleSet::List => &self.rules.list,
        };
        let mut input = input.trim_end_matches('\n');
        'input: while !input.is_empty() {
            for &rule in rules {
                let Some(rest) = self.apply(rule, input, depth, tokens)? else {
                    continue;
                };
                // every rule consumes something, but a stuck loop is worse than an error
                if rest.len() < input.len() {
                    tracing::trace!(%rule, depth, consumed = input.len() - rest.len(), "block rule matched");
                    input = rest;
                    continue 'input;
                }
            }
            return Err(LexError::no_rule(Level::Block, input));
        }
        Ok(())
    }

    /// Lexes a rewritten body, detaching resulting tokens from it
    fn lex_nested<'source>(
        &self,
        body: &str,
        set: RuleSet,
        depth: usize,
        tokens: &mut Vec<Token<'source>>,
    ) -> Result<(), LexError> {
        let mut nested = Vec::new();
        self.lex_into(body, set, depth, &mut nested)?;
        for token in nested {
            tokens.push(token.into_owned());
        }
        Ok(())
    }

    /// Applies a single rule, pushing its tokens. Yields the rest of input on match.
    fn apply<'source>(
        &self,
        rule: BlockRule,
        input: &'source str,
        depth: usize,
        tokens: &mut Vec<Token<'source>>,
    ) -> Result<Option<&'source str>, LexError> {
        match rule {
            BlockRule::Newline => {
                let Some((rest, run)) = applied(newline(input))? else {
                    return Ok(None);
                };
                if run > 1 {
                    tokens.push(Token::Newline);
                }
                Ok(Some(rest))
            }
            BlockRule::BlockCode => {
                let Some((rest, code)) = applied(block_code(input))? else {
                    return Ok(None);
                };
                let text = code
                    .split('\n')
                    .map(|line| line.strip_prefix("    ").unwrap_or(line))
                    .join("\n");
                tokens.push(Token::Code {
                    lang: None,
                    text: Cow::Owned(text),
                });
                Ok(Some(rest))
            }
            BlockRule::FencesCode => {
                let Some((rest, Fenced { lang, body })) = applied(fences_code(input))? else {
                    return Ok(None);
                };
                tokens.push(Token::Code {
                    lang: lang.map(Cow::from),
                    text: Cow::from(body),
                });
                Ok(Some(rest))
            }
            BlockRule::Hrule => {
                let Some((rest, ())) = applied(hrule(input))? else {
                    return Ok(None);
                };
                tokens.push(Token::Hrule);
                Ok(Some(rest))
            }
            BlockRule::Heading | BlockRule::LHeading => {
                let result: RuleResult<'source, _> = if rule == BlockRule::Heading {
                    heading(input)
                } else {
                    lheading(input)
                };
                let Some((rest, (level, text))) = applied(result)? else {
                    return Ok(None);
                };
                tokens.push(Token::Heading {
                    level,
                    text: Cow::from(text),
                });
                Ok(Some(rest))
            }
            BlockRule::BlockQuote => {
                let Some((rest, quote)) = applied(block_quote(input))? else {
                    return Ok(None);
                };
                tokens.push(Token::BlockQuoteStart);
                // quote bodies always go back to the default rules, even inside a list
                self.lex_nested(&strip_quote_markers(quote), RuleSet::Default, depth + 1, tokens)?;
                tokens.push(Token::BlockQuoteEnd);
                Ok(Some(rest))
            }
            BlockRule::ListBlock => {
                let Some((rest, list)) = applied(list_block(input))? else {
                    return Ok(None);
                };
                tokens.push(Token::ListStart {
                    ordered: list.bullet.contains('.'),
                });
                self.lex_items(list.span, depth, tokens)?;
                tokens.push(Token::ListEnd);
                Ok(Some(rest))
            }
            BlockRule::Text => {
                let Some((rest, text)) = applied(take_till1(|c: char| c == '\n')(input))? else {
                    return Ok(None);
                };
                tokens.push(Token::Text {
                    text: Cow::from(text),
                });
                Ok(Some(rest))
            }
        }
    }

    fn lex_items<'source>(
        &self,
        list: &'source str,
        depth: usize,
        tokens: &mut Vec<Token<'source>>,
    ) -> Result<(), LexError> {
        let items = list_items(list);
        let last = items.len().saturating_sub(1);
        // set by an item ending in a blank line; makes the next one loose
        let mut next_loose = false;
        for (i, item) in items.into_iter().enumerate() {
            let (stripped, width) = strip_bullet(item);
            let body = if stripped.contains("\n ") {
                Cow::Owned(outdent(stripped, width))
            } else {
                Cow::Borrowed(stripped)
            };

            let loose = next_loose || has_inner_blank(&body);
            if i != last && !body.is_empty() {
                next_loose = body.ends_with('\n');
            }

            tokens.push(if loose {
                Token::LooseItemStart
            } else {
                Token::ListItemStart
            });
            self.lex_nested(&body, RuleSet::List, depth + 1, tokens)?;
            tokens.push(Token::ListItemEnd);
        }
        Ok(())
    }
}
