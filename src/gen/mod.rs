pub mod latex;

/// Unit of renderer output.
///
/// Fragments are only ever grown by appending, starting from [`Default::default`].
pub trait Fragment: Default {
    fn append(&mut self, other: Self);

    /// Put between consecutive block-level fragments
    fn separator() -> Self;
}

impl Fragment for String {
    fn append(&mut self, other: Self) {
        self.push_str(&other);
    }

    fn separator() -> Self {
        String::from("\n")
    }
}

/// Output backend.
///
/// Every operation receives already extracted plain values (never tokens), so a new output
/// format only needs a new implementation of this trait.
pub trait Renderer {
    type Fragment: Fragment;

    /// Empty accumulator
    fn placeholder(&self) -> Self::Fragment {
        Self::Fragment::default()
    }

    fn newline(&self) -> Self::Fragment {
        self.placeholder()
    }

    fn block_code(&self, code: &str, lang: Option<&str>) -> Self::Fragment;

    fn hrule(&self) -> Self::Fragment;

    /// `text` is inline-rendered already
    fn header(&self, text: Self::Fragment, level: usize) -> Self::Fragment;

    fn block_quote(&self, body: Self::Fragment) -> Self::Fragment;

    fn emph(&self, text: &str) -> Self::Fragment;

    fn italic(&self, text: &str) -> Self::Fragment;

    fn inline_code(&self, code: &str) -> Self::Fragment;

    fn image(&self, dest: &str, text: &str, title: Option<&str>) -> Self::Fragment;

    fn link(&self, dest: &str, text: &str, title: Option<&str>) -> Self::Fragment;

    /// Literal text run
    fn text(&self, text: &str) -> Self::Fragment;

    /// Paragraph text, inline-rendered already
    fn text_block(&self, text: Self::Fragment) -> Self::Fragment {
        text
    }

    fn list(&self, body: Self::Fragment, ordered: bool) -> Self::Fragment;

    fn list_item(&self, body: Self::Fragment) -> Self::Fragment;
}
