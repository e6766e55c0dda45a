use std::borrow::Cow;

type Tx<'source> = Cow<'source, str>;

/// Kind of a block-level token, without its payload.
///
/// Used for stream diagnostics and for bounded drains, where the interpreter
/// only needs to know which terminator it is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TokenKind {
    #[display(fmt = "newline")]
    Newline,
    #[display(fmt = "code")]
    Code,
    #[display(fmt = "hrule")]
    Hrule,
    #[display(fmt = "heading")]
    Heading,
    #[display(fmt = "block_quote_start")]
    BlockQuoteStart,
    #[display(fmt = "block_quote_end")]
    BlockQuoteEnd,
    #[display(fmt = "list_start")]
    ListStart,
    #[display(fmt = "list_end")]
    ListEnd,
    #[display(fmt = "list_item_start")]
    ListItemStart,
    #[display(fmt = "loose_item_start")]
    LooseItemStart,
    #[display(fmt = "list_item_end")]
    ListItemEnd,
    #[display(fmt = "text")]
    Text,
}

// Text of the top-level document is borrowed straight from the (normalized) source.
// Quote and list bodies are rewritten before they are lexed again, so tokens produced from
// them own their text instead. `Cow` covers both without a separate token type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Token<'source> {
    Newline,
    Code {
        lang: Option<Tx<'source>>,
        text: Tx<'source>,
    },
    Hrule,
    Heading {
        // 1..=6
        level: usize,
        text: Tx<'source>,
    },
    BlockQuoteStart,
    BlockQuoteEnd,
    ListStart {
        ordered: bool,
    },
    ListEnd,
    ListItemStart,
    LooseItemStart,
    ListItemEnd,
    Text {
        text: Tx<'source>,
    },
}

impl<'source> Token<'source> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Newline => TokenKind::Newline,
            Token::Code { .. } => TokenKind::Code,
            Token::Hrule => TokenKind::Hrule,
            Token::Heading { .. } => TokenKind::Heading,
            Token::BlockQuoteStart => TokenKind::BlockQuoteStart,
            Token::BlockQuoteEnd => TokenKind::BlockQuoteEnd,
            Token::ListStart { .. } => TokenKind::ListStart,
            Token::ListEnd => TokenKind::ListEnd,
            Token::ListItemStart => TokenKind::ListItemStart,
            Token::LooseItemStart => TokenKind::LooseItemStart,
            Token::ListItemEnd => TokenKind::ListItemEnd,
            Token::Text { .. } => TokenKind::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Token::Text { .. })
    }
}

impl TokenKind {
    /// Terminator that closes a bounded drain opened by this kind, if any.
    ///
    /// Both flavours of list items share a single terminator.
    pub fn terminator(self) -> Option<TokenKind> {
        match self {
            TokenKind::BlockQuoteStart => Some(TokenKind::BlockQuoteEnd),
            TokenKind::ListStart => Some(TokenKind::ListEnd),
            TokenKind::ListItemStart | TokenKind::LooseItemStart => Some(TokenKind::ListItemEnd),
            _ => None,
        }
    }

    pub fn is_end(self) -> bool {
        matches!(
            self,
            TokenKind::BlockQuoteEnd | TokenKind::ListEnd | TokenKind::ListItemEnd
        )
    }
}

pub(crate) trait ToStaticExt {
    type AsStatic;
    fn to_static(self) -> Self::AsStatic;
}

impl ToStaticExt for Cow<'_, str> {
    type AsStatic = Cow<'static, str>;

    fn to_static(self) -> Self::AsStatic {
        Cow::Owned(self.into_owned())
    }
}

impl ToStaticExt for Token<'_> {
    type AsStatic = Token<'static>;

    fn to_static(self) -> Self::AsStatic {
        match self {
            Token::Newline => Token::Newline,
            Token::Code { lang, text } => Token::Code {
                lang: lang.map(ToStaticExt::to_static),
                text: text.to_static(),
            },
            Token::Hrule => Token::Hrule,
            Token::Heading { level, text } => Token::Heading {
                level,
                text: text.to_static(),
            },
            Token::BlockQuoteStart => Token::BlockQuoteStart,
            Token::BlockQuoteEnd => Token::BlockQuoteEnd,
            Token::ListStart { ordered } => Token::ListStart { ordered },
            Token::ListEnd => Token::ListEnd,
            Token::ListItemStart => Token::ListItemStart,
            Token::LooseItemStart => Token::LooseItemStart,
            Token::ListItemEnd => Token::ListItemEnd,
            Token::Text { text } => Token::Text {
                text: text.to_static(),
            },
        }
    }
}

impl<'source> Token<'source> {
    /// Detaches the token from the buffer it was lexed from.
    pub fn into_owned(self) -> Token<'static> {
        self.to_static()
    }
}
