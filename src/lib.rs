//! This crate turns markdown-styled text (headings, emphasis, lists, quotes, code, links and images)
//! into LaTeX source. Or into anything else, given a [`Renderer`] for it.
//!
//! # Ideology
//! Conversion runs in two stages, and neither of them ever builds a syntax tree:
//! - The block lexer cuts the document into a flat sequence of [`Token`]s.
//! Quotes and list items are cut out, rewritten (quote markers and list indentation removed) and lexed again,
//! so their contents end up between a pair of start/end tokens.
//! - The interpreter walks that sequence once, from left to right. Whenever it meets a start token, it renders
//! everything up to the matching end token and wraps it. Text is pushed through the inline lexer,
//! which hands every matched span to the renderer right away, so inline tokens do not exist at all.
//!
//! Both grammars are ordered tables of rules, see [`BlockRules`] and [`InlineRules`].
//! First rule that matches at the start of remaining input wins. If none does, that's a [`LexError`],
//! there's no fallback of any kind.
//!
//! ```
//! let latex = marktex::convert("# Title\n\n**a** *b*").unwrap();
//! assert_eq!(latex, "\\section{Title}\n\n\\textbf{a} \\textit{b}\n");
//! ```

use once_cell::sync::Lazy;
use tracing::debug;

/// This module defines types that are used to represent lexed blocks
mod data;
mod gen;
mod interpret;
mod lexer;
/// This module houses "utility-like" functions shared by both grammars.
mod util;

pub use data::{Token, TokenKind};
pub use gen::{
    latex::{Latex, LatexOptions},
    Fragment, Renderer,
};
pub use interpret::{Interpreter, StreamError, TokenStream};
pub use lexer::{
    block::{BlockLexer, BlockRule, BlockRules},
    inline::{InlineLexer, InlineRule, InlineRules},
    LexError, Level,
};
pub use util::{normalize, TAB_WIDTH};

/// Quotes and lists may not be nested deeper than this, unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Anything that stops a conversion: lexing errors and malformed token streams
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From, thiserror::Error)]
pub enum Error {
    #[error("{}", .0)]
    Lex(LexError),
    #[error("{}", .0)]
    Stream(StreamError),
}

/// Converter configuration: renderer, grammar tables and nesting limit
#[derive(Debug, Clone)]
pub struct Markdown<R = Latex> {
    renderer: R,
    block_rules: BlockRules,
    inline_rules: InlineRules,
    max_depth: usize,
}

impl<R: Renderer + Default> Default for Markdown<R> {
    fn default() -> Self {
        Self {
            renderer: R::default(),
            block_rules: BlockRules::default(),
            inline_rules: InlineRules::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Markdown {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Renderer> Markdown<R> {
    pub fn with_renderer<S: Renderer>(self, renderer: S) -> Markdown<S> {
        Markdown {
            renderer,
            block_rules: self.block_rules,
            inline_rules: self.inline_rules,
            max_depth: self.max_depth,
        }
    }

    pub fn with_block_rules(self, block_rules: BlockRules) -> Self {
        Self {
            block_rules,
            ..self
        }
    }

    pub fn with_inline_rules(self, inline_rules: InlineRules) -> Self {
        Self {
            inline_rules,
            ..self
        }
    }

    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Block tokens of the (normalized) text
    pub fn tokens(&self, text: &str) -> Result<Vec<Token<'static>>, LexError> {
        let text = normalize(text);
        let tokens = BlockLexer::new(&self.block_rules, self.max_depth).lex(&text)?;
        Ok(tokens.into_iter().map(Token::into_owned).collect())
    }

    /// Converts the text. Nothing is produced unless the whole text converts.
    pub fn render(&self, text: &str) -> Result<R::Fragment, Error> {
        let text = normalize(text);
        debug!(len = text.len(), "converting document");
        let tokens = BlockLexer::new(&self.block_rules, self.max_depth).lex(&text)?;
        debug!(tokens = tokens.len(), "document lexed");
        let output = Interpreter::new(&self.renderer, &self.inline_rules)
            .with_max_depth(self.max_depth)
            .output(tokens)?;
        debug!("document rendered");
        Ok(output)
    }
}

/// Converts markdown-styled text into LaTeX with default configuration
pub fn convert(text: &str) -> Result<String, Error> {
    static DEFAULT: Lazy<Markdown> = Lazy::new(Markdown::new);
    DEFAULT.render(text)
}
