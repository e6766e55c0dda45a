use std::{borrow::Cow, iter::Peekable};

use itertools::Itertools;

use crate::{
    data::{Token, TokenKind},
    gen::{Fragment, Renderer},
    lexer::inline::{InlineLexer, InlineRules},
    Error, DEFAULT_MAX_DEPTH,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Stream ended inside a quote, list or list item.
    #[error("token stream ended while waiting for {expected}")]
    Exhausted { expected: TokenKind },
    /// End token without a start token before it.
    #[error("{found} was never opened")]
    Unopened { found: TokenKind },
    /// Some other end token showed up inside a quote, list or list item.
    #[error("expected {expected}, found {found}")]
    Mismatched {
        expected: TokenKind,
        found: TokenKind,
    },
    /// Quotes and lists are nested deeper than allowed.
    #[error("nesting is deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Forward-only cursor over block tokens, with a single token of lookahead
#[derive(Debug)]
pub struct TokenStream<'source> {
    tokens: Peekable<std::vec::IntoIter<Token<'source>>>,
}

impl<'source> TokenStream<'source> {
    pub fn new(tokens: Vec<Token<'source>>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    pub fn peek(&mut self) -> Option<&Token<'source>> {
        self.tokens.peek()
    }

    /// Joins `first` with the texts of all immediately following text tokens
    pub fn take_text(&mut self, first: Cow<'source, str>) -> Cow<'source, str> {
        if !self.peek().is_some_and(Token::is_text) {
            return first;
        }
        let mut text = first.into_owned();
        for token in self.tokens.peeking_take_while(Token::is_text) {
            if let Token::Text { text: next } = token {
                text.push('\n');
                text.push_str(&next);
            }
        }
        Cow::Owned(text)
    }
}

impl<'source> Iterator for TokenStream<'source> {
    type Item = Token<'source>;

    fn next(&mut self) -> Option<Self::Item> {
        self.tokens.next()
    }
}

/// Walks block tokens in order, driving the renderer (and the inline lexer for text).
///
/// Quotes, lists and list items are rendered by draining tokens up to their end token, so
/// nesting is tracked by the call stack rather than by a tree. The call stack is bounded:
/// quotes and lists may be nested at most `max_depth` levels deep, a list and its items
/// counting as a single level (same as in [`BlockLexer`](crate::BlockLexer)).
#[derive(Debug)]
pub struct Interpreter<'r, R> {
    renderer: &'r R,
    inline: InlineLexer<'r, R>,
    max_depth: usize,
}

impl<'r, R: Renderer> Interpreter<'r, R> {
    pub fn new(renderer: &'r R, rules: &'r InlineRules) -> Self {
        Self {
            renderer,
            inline: InlineLexer::new(renderer, rules),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    /// Renders the whole stream
    pub fn output(&self, tokens: Vec<Token<'_>>) -> Result<R::Fragment, Error> {
        let mut stream = TokenStream::new(tokens);
        let mut output = self.renderer.placeholder();
        while let Some(token) = stream.next() {
            output.append(self.dispatch(token, &mut stream, 0)?);
            output.append(R::Fragment::separator());
        }
        Ok(output)
    }

    /// `depth` is the nesting level of the body `token` belongs to
    fn dispatch<'source>(
        &self,
        token: Token<'source>,
        stream: &mut TokenStream<'source>,
        depth: usize,
    ) -> Result<R::Fragment, Error> {
        tracing::trace!(kind = %token.kind(), "dispatching token");
        let renderer = self.renderer;
        let fragment = match token {
            Token::Newline => renderer.newline(),
            Token::Code { lang, text } => renderer.block_code(&text, lang.as_deref()),
            Token::Hrule => renderer.hrule(),
            Token::Heading { level, text } => renderer.header(self.inline.render(&text)?, level),
            Token::BlockQuoteStart => {
                let body = self.drain(stream, TokenKind::BlockQuoteEnd, false, depth + 1)?;
                renderer.block_quote(body)
            }
            Token::ListStart { ordered } => {
                renderer.list(self.drain(stream, TokenKind::ListEnd, false, depth + 1)?, ordered)
            }
            Token::ListItemStart => {
                renderer.list_item(self.drain(stream, TokenKind::ListItemEnd, true, depth + 1)?)
            }
            Token::LooseItemStart => {
                renderer.list_item(self.drain(stream, TokenKind::ListItemEnd, false, depth + 1)?)
            }
            Token::Text { text } => {
                renderer.text_block(self.inline.render(&stream.take_text(text))?)
            }
            Token::BlockQuoteEnd | Token::ListEnd | Token::ListItemEnd => {
                return Err(StreamError::Unopened {
                    found: token.kind(),
                }
                .into())
            }
        };
        Ok(fragment)
    }

    /// Renders tokens up to (and including) `terminator`.
    ///
    /// With `tight`, text goes straight into the body, without the literal text operation
    /// and without a separator after it.
    fn drain<'source>(
        &self,
        stream: &mut TokenStream<'source>,
        terminator: TokenKind,
        tight: bool,
        depth: usize,
    ) -> Result<R::Fragment, Error> {
        if depth > self.max_depth {
            return Err(StreamError::TooDeep {
                limit: self.max_depth,
            }
            .into());
        }
        let mut body = self.renderer.placeholder();
        loop {
            let token = stream.next().ok_or(StreamError::Exhausted {
                expected: terminator,
            })?;
            match token {
                token if token.kind() == terminator => return Ok(body),
                token if token.kind().is_end() => {
                    return Err(StreamError::Mismatched {
                        expected: terminator,
                        found: token.kind(),
                    }
                    .into())
                }
                Token::Text { text } if tight => {
                    body.append(self.inline.render(&stream.take_text(text))?);
                }
                token @ (Token::ListItemStart | Token::LooseItemStart)
                    if terminator == TokenKind::ListEnd =>
                {
                    // items share the level of their list
                    body.append(self.dispatch(token, stream, depth - 1)?);
                    body.append(R::Fragment::separator());
                }
                token => {
                    body.append(self.dispatch(token, stream, depth)?);
                    body.append(R::Fragment::separator());
                }
            }
        }
    }
}
