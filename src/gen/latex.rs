use smart_default::SmartDefault;

use super::Renderer;

/// Options of the LaTeX backend
#[derive(Debug, Clone, PartialEq, SmartDefault)]
pub struct LatexOptions {
    /// Image width, as a fraction of `\textwidth`
    #[default(0.8)]
    pub figure_width: f32,
    /// Float placement specifier of figures
    #[default(_code = "String::from(\"htbp\")")]
    pub figure_placement: String,
}

/// Default renderer, emitting LaTeX source.
///
/// Content is inserted as is: LaTeX special characters are not escaped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Latex {
    options: LatexOptions,
}

impl Latex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LatexOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LatexOptions {
        &self.options
    }
}

impl Renderer for Latex {
    type Fragment = String;

    fn block_code(&self, code: &str, lang: Option<&str>) -> String {
        let code = code.trim_end_matches('\n');
        let lang = lang
            .map(|lang| format!("[language={lang}]"))
            .unwrap_or_default();
        format!("\\begin{{lstlisting}}{lang}\n{code}\n\\end{{lstlisting}}\n")
    }

    fn hrule(&self) -> String {
        String::from("\\newpage\n")
    }

    fn header(&self, text: String, level: usize) -> String {
        let command = match level {
            1 => "section",
            2 => "subsection",
            3 => "subsubsection",
            // deeper sectioning is not worth it
            _ => "textbf",
        };
        format!("\\{command}{{{text}}}\n")
    }

    fn block_quote(&self, body: String) -> String {
        format!("\\begin{{quotation}}\n{body}\n\\end{{quotation}}\n")
    }

    fn emph(&self, text: &str) -> String {
        format!("\\textbf{{{text}}}")
    }

    fn italic(&self, text: &str) -> String {
        format!("\\textit{{{text}}}")
    }

    fn inline_code(&self, code: &str) -> String {
        format!("\\lstinline{{{code}}}")
    }

    fn image(&self, dest: &str, text: &str, _title: Option<&str>) -> String {
        let LatexOptions {
            figure_width,
            figure_placement,
        } = &self.options;
        format!(
            "\\begin{{figure}}[{figure_placement}]\n\\centering\n\
             \\includegraphics[width={figure_width}\\textwidth]{{{dest}}}\n\
             \\caption{{{text}}}\n\\label{{fig:{text}}}\n\\end{{figure}}\n"
        )
    }

    fn link(&self, dest: &str, text: &str, _title: Option<&str>) -> String {
        format!("\\href{{{dest}}}{{{text}}}")
    }

    fn text(&self, text: &str) -> String {
        text.to_owned()
    }

    fn list(&self, body: String, ordered: bool) -> String {
        let environment = if ordered { "enumerate" } else { "itemize" };
        format!("\n\\begin{{{environment}}}\n{body}\\end{{{environment}}}\n")
    }

    fn list_item(&self, body: String) -> String {
        format!("\\item\n{body}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_with_language() {
        let output = Latex::new().block_code("print(1)\n\n", Some("python"));
        assert_eq!(
            output,
            "\\begin{lstlisting}[language=python]\nprint(1)\n\\end{lstlisting}\n"
        );
    }

    #[test]
    fn code_without_language() {
        let output = Latex::new().block_code("a\n\nb", None);
        assert_eq!(output, "\\begin{lstlisting}\na\n\nb\n\\end{lstlisting}\n");
    }

    #[test]
    fn header_levels() {
        let latex = Latex::new();
        assert_eq!(latex.header("A".into(), 1), "\\section{A}\n");
        assert_eq!(latex.header("A".into(), 2), "\\subsection{A}\n");
        assert_eq!(latex.header("A".into(), 3), "\\subsubsection{A}\n");
        assert_eq!(latex.header("A".into(), 4), "\\textbf{A}\n");
        assert_eq!(latex.header("A".into(), 6), "\\textbf{A}\n");
    }

    #[test]
    fn figure_default() {
        let output = Latex::new().image("cat.png", "Cat", None);
        assert_eq!(
            output,
            "\\begin{figure}[htbp]\n\\centering\n\\includegraphics[width=0.8\\textwidth]{cat.png}\n\\caption{Cat}\n\\label{fig:Cat}\n\\end{figure}\n"
        );
    }

    #[test]
    fn figure_options() {
        let latex = Latex::with_options(LatexOptions {
            figure_width: 0.5,
            figure_placement: String::from("h!"),
        });
        let output = latex.image("a.png", "A", Some("ignored"));
        assert!(output.starts_with("\\begin{figure}[h!]\n"));
        assert!(output.contains("\\includegraphics[width=0.5\\textwidth]{a.png}\n"));
    }

    #[test]
    fn lists() {
        let latex = Latex::new();
        let item = latex.list_item(String::from("one"));
        assert_eq!(item, "\\item\none\n");
        assert_eq!(
            latex.list(item.clone(), false),
            "\n\\begin{itemize}\n\\item\none\n\\end{itemize}\n"
        );
        assert_eq!(
            latex.list(item, true),
            "\n\\begin{enumerate}\n\\item\none\n\\end{enumerate}\n"
        );
    }

    #[test]
    fn inline_commands() {
        let latex = Latex::new();
        assert_eq!(latex.emph("a"), "\\textbf{a}");
        assert_eq!(latex.italic("a"), "\\textit{a}");
        assert_eq!(latex.inline_code("a"), "\\lstinline{a}");
        assert_eq!(latex.link("http://a.b", "a", None), "\\href{http://a.b}{a}");
        assert_eq!(latex.hrule(), "\\newpage\n");
        assert_eq!(latex.block_quote(String::from("q")), "\\begin{quotation}\nq\n\\end{quotation}\n");
    }
}
