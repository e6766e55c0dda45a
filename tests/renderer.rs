use marktex::{Fragment, Markdown, Renderer};

/// Bare-bones HTML backend
#[derive(Debug, Default)]
struct Html;

impl Renderer for Html {
    type Fragment = String;

    fn block_code(&self, code: &str, lang: Option<&str>) -> String {
        match lang {
            Some(lang) => format!("<pre class=\"{lang}\">{code}</pre>"),
            None => format!("<pre>{code}</pre>"),
        }
    }

    fn hrule(&self) -> String {
        String::from("<hr>")
    }

    fn header(&self, text: String, level: usize) -> String {
        format!("<h{level}>{text}</h{level}>")
    }

    fn block_quote(&self, body: String) -> String {
        format!("<blockquote>{body}</blockquote>")
    }

    fn emph(&self, text: &str) -> String {
        format!("<strong>{text}</strong>")
    }

    fn italic(&self, text: &str) -> String {
        format!("<em>{text}</em>")
    }

    fn inline_code(&self, code: &str) -> String {
        format!("<code>{code}</code>")
    }

    fn image(&self, dest: &str, text: &str, _title: Option<&str>) -> String {
        format!("<img src=\"{dest}\" alt=\"{text}\">")
    }

    fn link(&self, dest: &str, text: &str, title: Option<&str>) -> String {
        match title {
            Some(title) => format!("<a href=\"{dest}\" title=\"{title}\">{text}</a>"),
            None => format!("<a href=\"{dest}\">{text}</a>"),
        }
    }

    fn text(&self, text: &str) -> String {
        text.to_owned()
    }

    fn text_block(&self, text: String) -> String {
        format!("<p>{text}</p>")
    }

    fn list(&self, body: String, ordered: bool) -> String {
        let tag = if ordered { "ol" } else { "ul" };
        format!("<{tag}>{body}</{tag}>")
    }

    fn list_item(&self, body: String) -> String {
        format!("<li>{body}</li>")
    }
}

/// Collects heading levels only, to check that fragments need not be text
#[derive(Debug, Default, PartialEq)]
struct Outline(Vec<usize>);

impl Fragment for Outline {
    fn append(&mut self, mut other: Self) {
        self.0.append(&mut other.0);
    }

    fn separator() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
struct Headings;

impl Renderer for Headings {
    type Fragment = Outline;

    fn block_code(&self, _code: &str, _lang: Option<&str>) -> Outline {
        Outline::default()
    }

    fn hrule(&self) -> Outline {
        Outline::default()
    }

    fn header(&self, mut text: Outline, level: usize) -> Outline {
        text.0.insert(0, level);
        text
    }

    fn block_quote(&self, body: Outline) -> Outline {
        body
    }

    fn emph(&self, _text: &str) -> Outline {
        Outline::default()
    }

    fn italic(&self, _text: &str) -> Outline {
        Outline::default()
    }

    fn inline_code(&self, _code: &str) -> Outline {
        Outline::default()
    }

    fn image(&self, _dest: &str, _text: &str, _title: Option<&str>) -> Outline {
        Outline::default()
    }

    fn link(&self, _dest: &str, _text: &str, _title: Option<&str>) -> Outline {
        Outline::default()
    }

    fn text(&self, _text: &str) -> Outline {
        Outline::default()
    }

    fn list(&self, body: Outline, _ordered: bool) -> Outline {
        body
    }

    fn list_item(&self, body: Outline) -> Outline {
        body
    }
}

#[test]
fn html_backend() {
    let markdown = Markdown::new().with_renderer(Html);
    let output = markdown
        .render("## Hi\n\nSome **bold** [link](/a \"A\")\n\n- one\n- two\n")
        .unwrap();
    assert_eq!(
        output,
        "<h2>Hi</h2>\n<p>Some <strong>bold</strong> <a href=\"/a\" title=\"A\">link</a></p>\n\n<ul><li>one</li>\n<li>two</li>\n</ul>\n"
    );
}

#[test]
fn html_code_and_quote() {
    let markdown = Markdown::new().with_renderer(Html);
    let output = markdown.render("> *quoted*\n\n```rust\nlet a = 1;\n```\n").unwrap();
    assert_eq!(
        output,
        "<blockquote><p><em>quoted</em></p>\n</blockquote>\n<pre class=\"rust\">let a = 1;</pre>\n"
    );
}

#[test]
fn non_text_fragments() {
    let markdown = Markdown::new().with_renderer(Headings);
    let output = markdown
        .render("# One\n\ntext\n\n### Three\n\n> ## Two\n")
        .unwrap();
    assert_eq!(output, Outline(vec![1, 3, 2]));
}
