//! Server-rendered single page.
//!
//! Model output is rendered from markdown and sanitized; every other dynamic
//! string is escaped as text.

use ammonia::clean_text;
use contextor::QaAnswer;
use pulldown_cmark::{Options, Parser, html};

use crate::core::session::{Notice, SessionContext};

pub const TITLE: &str = "QA with Documents";
pub const PROCESSING_TEXT: &str = "Processing and embedding the document...";
pub const ANSWERING_TEXT: &str = "Generating answer...";
pub const SUCCESS_TEXT: &str = "Document processed successfully!";

/// Snapshot of a session needed to draw the page.
#[derive(Debug, Default)]
pub struct PageView {
    pub file_name: Option<String>,
    pub has_engine: bool,
    pub question: Option<String>,
    pub answer: Option<QaAnswer>,
    pub notice: Option<Notice>,
}

impl PageView {
    /// Copies what the page needs and consumes the one-shot notice.
    pub fn from_session(ctx: &mut SessionContext) -> Self {
        Self {
            file_name: ctx.file_name.clone(),
            has_engine: ctx.engine.is_some(),
            question: ctx.last_question.clone(),
            answer: ctx.last_answer.clone(),
            notice: ctx.take_notice(),
        }
    }
}

/// Markdown to sanitized HTML.
pub fn render_markdown(md: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    let mut out = String::with_capacity(md.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(md, opts));
    ammonia::clean(&out)
}

fn notice_html(notice: &Notice) -> String {
    match notice {
        Notice::Success(msg) => {
            format!(r#"<div class="notice success">{}</div>"#, clean_text(msg))
        }
        Notice::Error { category, message } => format!(
            r#"<div class="notice error"><strong>{}:</strong> {}</div>"#,
            clean_text(category),
            clean_text(message)
        ),
    }
}

fn question_form(view: &PageView) -> String {
    let current = view
        .file_name
        .as_deref()
        .map(|f| format!(r#"<p class="current">Current document: {}</p>"#, clean_text(f)))
        .unwrap_or_else(|| r#"<p class="current">Current documents: default folder</p>"#.into());
    format!(
        r#"<section id="ask">
{current}
<form method="post" action="/ask" onsubmit="document.getElementById('answering').hidden = false;">
  <label for="question">Ask your question:</label>
  <input id="question" name="question" type="text" autocomplete="off" required>
  <button type="submit">Ask</button>
</form>
<p id="answering" class="indicator" hidden>{ANSWERING_TEXT}</p>
</section>"#
    )
}

fn answer_html(question: Option<&str>, answer: &QaAnswer) -> String {
    let mut out = String::from(r#"<section id="answer">"#);
    if let Some(q) = question {
        out.push_str(&format!(r#"<p class="question">{}</p>"#, clean_text(q)));
    }
    out.push_str(r#"<div class="markdown">"#);
    out.push_str(&render_markdown(&answer.answer));
    out.push_str("</div>");
    if !answer.sources.is_empty() {
        out.push_str("<details><summary>Sources</summary><ol>");
        for s in &answer.sources {
            out.push_str(&format!(
                "<li><code>{}</code> [{}..{}] score {:.3}<pre>{}</pre></li>",
                clean_text(&s.file_name),
                s.start_char,
                s.end_char,
                s.score,
                clean_text(&s.text)
            ));
        }
        out.push_str("</ol></details>");
    }
    out.push_str("</section>");
    out
}

const STYLE: &str = r#"body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}
.notice{padding:.75rem;border-radius:.25rem;margin:1rem 0}
.success{background:#e6f4ea;color:#1e4620}
.error{background:#fdecea;color:#611a15}
.indicator{font-style:italic}
input[type=text]{width:100%;padding:.5rem;margin:.5rem 0}
pre{white-space:pre-wrap}"#;

const UPLOAD_SCRIPT: &str = r#"<script>
const input = document.getElementById('file');
const button = document.getElementById('process');
input.addEventListener('change', () => { button.disabled = input.files.length === 0; });
document.getElementById('upload').addEventListener('submit', () => {
  document.getElementById('processing').hidden = false;
  button.disabled = true;
});
</script>"#;

/// Full HTML document for `view`.
pub fn render(view: &PageView) -> String {
    let notice = view.notice.as_ref().map(notice_html).unwrap_or_default();
    let ask = if view.has_engine {
        question_form(view)
    } else {
        String::new()
    };
    let answer = view
        .answer
        .as_ref()
        .map(|a| answer_html(view.question.as_deref(), a))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{TITLE}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>{TITLE}</h1>
<p>Upload a document, press <em>Process Document</em>, then ask questions about its contents.</p>
{notice}
<form id="upload" method="post" action="/process" enctype="multipart/form-data">
  <input id="file" name="file" type="file">
  <button id="process" type="submit" disabled>Process Document</button>
</form>
<p id="processing" class="indicator" hidden>{PROCESSING_TEXT}</p>
{ask}
{answer}
{UPLOAD_SCRIPT}
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextor::UsedChunk;

    #[test]
    fn question_form_only_with_engine() {
        let page = render(&PageView::default());
        assert!(page.contains(TITLE));
        assert!(page.contains(r#"name="file""#));
        assert!(!page.contains(r#"name="question""#));

        let page = render(&PageView {
            has_engine: true,
            ..PageView::default()
        });
        assert!(page.contains(r#"name="question""#));
    }

    #[test]
    fn process_button_starts_disabled() {
        let page = render(&PageView::default());
        assert!(page.contains(r#"<button id="process" type="submit" disabled>"#));
    }

    #[test]
    fn answer_markdown_is_sanitized() {
        let html = render_markdown("**blue** <script>alert(1)</script>");
        assert!(html.contains("<strong>blue</strong>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn notices_and_sources_are_escaped() {
        let page = render(&PageView {
            has_engine: true,
            question: Some("<b>why</b>".into()),
            answer: Some(QaAnswer {
                answer: "Because.".into(),
                sources: vec![UsedChunk {
                    score: 0.5,
                    file_name: "a<b>.txt".into(),
                    start_char: 0,
                    end_char: 3,
                    text: "x<y".into(),
                }],
            }),
            notice: Some(Notice::Error {
                category: "Query error",
                message: "<oops>".into(),
            }),
            ..PageView::default()
        });
        assert!(page.contains("Query error"));
        assert!(!page.contains("<oops>"));
        assert!(!page.contains("<b>why</b>"));
        assert!(!page.contains("a<b>.txt"));
        assert!(page.contains("Because."));
    }
}
