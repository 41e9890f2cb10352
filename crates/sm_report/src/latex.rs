//! Shared LaTeX table plumbing: cell formatting with missing-value
//! footnotes, and the one `booktabs` template every table renders through.

use minijinja::{context, Environment};
use serde::Serialize;
use sm_core::value::safe_ratio;

use crate::ReportError;

pub const MISSING_MARK: &str = r"$^\dagger$";
pub const MISSING_NOTE: &str = r"$^\dagger$Not present in the aggregated input; shown as 0.";

/// Row terminators.
pub const ROW_END: &str = r"\\";
pub const ROW_END_GAP: &str = r"\\[2pt]";

/// Python-style rounding (ties to even), so tables match across toolchains.
#[inline]
pub fn round_half_even(x: f64) -> i64 {
    x.round_ties_even() as i64
}

/// Escape the LaTeX specials that show up in report key names.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '&' | '%' | '#' | '$' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// `token_paste` → `Token_paste`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A stored ratio wins; otherwise `count / total` when both are present.
pub fn stored_or_computed(count: Option<f64>, stored: Option<f64>, total: Option<f64>) -> Option<f64> {
    stored.or_else(|| safe_ratio(count?, total?))
}

/// Formats cells and remembers whether any value was missing.
#[derive(Clone, Debug, Default)]
pub struct Cells {
    missing: bool,
}

impl Cells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rounded integer, or `0` plus the footnote marker.
    pub fn int(&mut self, v: Option<f64>) -> String {
        match v {
            Some(x) => round_half_even(x).to_string(),
            None => self.mark(),
        }
    }

    /// Rounded percent of a ratio, without the `\%`.
    pub fn percent(&mut self, ratio: Option<f64>) -> String {
        self.int(ratio.map(|r| r * 100.0))
    }

    /// `count (pct\%)`.
    pub fn entry(&mut self, count: Option<f64>, ratio: Option<f64>) -> String {
        let count = self.int(count);
        let pct = self.percent(ratio);
        format!(r"{count} ({pct}\%)")
    }

    pub fn footnote(&self) -> Option<&'static str> {
        self.missing.then_some(MISSING_NOTE)
    }

    fn mark(&mut self) -> String {
        self.missing = true;
        format!("0{MISSING_MARK}")
    }
}

/* ------------------------------ Template ------------------------------ */

#[derive(Clone, Debug, Serialize)]
pub struct Row {
    pub label: String,
    pub cells: Vec<String>,
    pub end: &'static str,
    /// Emit `\addlinespace` before this row.
    pub space_before: bool,
}

impl Row {
    pub fn new(label: impl Into<String>, cells: Vec<String>) -> Self {
        Self { label: label.into(), cells, end: ROW_END, space_before: false }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TableSpec {
    pub caption: String,
    pub label: String,
    pub colspec: String,
    /// Header cells, already formatted.
    pub header: Vec<String>,
    pub rows: Vec<Row>,
    /// Wrap the tabular in `\resizebox{\linewidth}{!}{...}`.
    pub resize: bool,
    pub footnote: Option<&'static str>,
}

static TABLE_TEMPLATE: &str = r#"\begin{table}[t]
\centering
\caption{ {{- caption }}}
\label{ {{- label }}}
{% if resize %}
\resizebox{\linewidth}{!}{
{% endif %}
\begin{tabular}{ {{- colspec }}}
\toprule
{{ header | join(" & ") }} \\
\midrule
{% for row in rows %}
{% if row.space_before %}
\addlinespace
{% endif %}
{{ row.label }}{% for cell in row.cells %} & {{ cell }}{% endfor %} {{ row.end }}
{% endfor %}
\bottomrule
{{ tabular_close }}
{% if footnote %}
\par\smallskip
{\footnotesize {{ footnote }}}
{% endif %}
\end{table}
"#;

/// Render `spec` through the shared table template.
pub fn render_table(spec: &TableSpec) -> Result<String, ReportError> {
    render_source(TABLE_TEMPLATE, spec)
}

fn render_source(source: &str, spec: &TableSpec) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_template("table.tex", source).map_err(template_error)?;
    let tmpl = env.get_template("table.tex").map_err(template_error)?;

    let tabular_close = if spec.resize { r"\end{tabular}}" } else { r"\end{tabular}" };
    let ctx = context! {
        caption => &spec.caption,
        label => &spec.label,
        colspec => &spec.colspec,
        header => &spec.header,
        rows => &spec.rows,
        resize => spec.resize,
        tabular_close => tabular_close,
        footnote => spec.footnote,
    };
    tmpl.render(ctx).map_err(template_error)
}

fn template_error(e: minijinja::Error) -> ReportError {
    ReportError::Template(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(rows: Vec<Row>, resize: bool, footnote: Option<&'static str>) -> TableSpec {
        TableSpec {
            caption: "Cap".into(),
            label: "tab:x".into(),
            colspec: "lr".into(),
            header: vec![r"\textbf{A}".into(), r"\textbf{B}".into()],
            rows,
            resize,
            footnote,
        }
    }

    #[test]
    fn plain_table_layout() {
        let mut last = Row::new(r"\textbf{Sum}", vec!["3".into()]);
        last.space_before = true;
        let out = render_table(&spec(vec![Row::new("one", vec!["1".into()]), last], false, None)).unwrap();
        assert_eq!(
            out,
            "\\begin{table}[t]\n\\centering\n\\caption{Cap}\n\\label{tab:x}\n\\begin{tabular}{lr}\n\
             \\toprule\n\\textbf{A} & \\textbf{B} \\\\\n\\midrule\none & 1 \\\\\n\\addlinespace\n\
             \\textbf{Sum} & 3 \\\\\n\\bottomrule\n\\end{tabular}\n\\end{table}\n"
        );
    }

    #[test]
    fn resize_and_footnote() {
        let out = render_table(&spec(vec![], true, Some(MISSING_NOTE))).unwrap();
        assert!(out.contains("\\resizebox{\\linewidth}{!}{\n\\begin{tabular}{lr}"));
        assert!(out.contains("\\end{tabular}}\n\\par\\smallskip\n"));
        assert!(out.contains(&format!("{{\\footnotesize {MISSING_NOTE}}}\n\\end{{table}}\n")));
    }

    #[test]
    fn template_failure_keeps_engine_message() {
        let err = render_source("{% for row in %}", &spec(vec![], false, None)).unwrap_err();
        let ReportError::Template(msg) = &err else { panic!("expected template error, got {err:?}") };
        assert!(msg.contains("syntax error"), "{msg}");
        assert!(err.to_string().starts_with("template error: "));
    }

    #[test]
    fn rounding_matches_half_even() {
        assert_eq!(round_half_even(2.5), 2);
        assert_eq!(round_half_even(3.5), 4);
        assert_eq!(round_half_even(13.333), 13);
        assert_eq!(round_half_even(-0.4), 0);
    }

    #[test]
    fn cells_track_missing_values() {
        let mut cells = Cells::new();
        assert_eq!(cells.entry(Some(30.0), Some(0.75)), r"30 (75\%)");
        assert!(cells.footnote().is_none());
        assert_eq!(cells.entry(None, Some(0.5)), r"0$^\dagger$ (50\%)");
        assert_eq!(cells.footnote(), Some(MISSING_NOTE));
    }

    #[test]
    fn stored_ratio_wins_over_fallback() {
        assert_eq!(stored_or_computed(Some(1.0), Some(0.9), Some(4.0)), Some(0.9));
        assert_eq!(stored_or_computed(Some(1.0), None, Some(4.0)), Some(0.25));
        assert_eq!(stored_or_computed(Some(1.0), None, Some(0.0)), None);
        assert_eq!(stored_or_computed(None, None, Some(4.0)), None);
    }

    #[test]
    fn text_helpers() {
        assert_eq!(capitalize("token_paste"), "Token_paste");
        assert_eq!(capitalize(""), "");
        assert_eq!(escape("a_b & 5%"), r"a\_b \& 5\%");
    }
}
