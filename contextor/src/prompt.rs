//! Question-answer prompt with a token-budgeted context block.
//!
//! Tokens are estimated as `ceil(chars / 4)`. The context is cut so that the
//! rendered prompt plus the reserved answer tokens fit the context window.

use rag_store::RagHit;

use crate::cfg::QueryConfig;

const SEPARATOR: &str = "---------------------";

/// Rough token count for budgeting.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Renders the question-answer template around `context`.
///
/// # Example
/// ```
/// # use contextor::prompt::render;
/// let p = render("file_name: sky.txt\n\nThe sky is blue.", "What color is the sky?");
/// assert!(p.starts_with("Context information is below."));
/// assert!(p.contains("Query: What color is the sky?"));
/// ```
pub fn render(context: &str, question: &str) -> String {
    format!(
        "Context information is below.\n{SEPARATOR}\n{context}\n{SEPARATOR}\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\nAnswer: "
    )
}

/// Final prompt plus how much retrieved context made it in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub prompt: String,
    /// Hits included in full or in part.
    pub segments_used: usize,
    /// True when the last included hit was cut short.
    pub truncated: bool,
}

/// Tokens left for context once the template, question and answer are reserved.
pub fn context_budget(question: &str, cfg: &QueryConfig) -> usize {
    let fixed = estimate_tokens(&render("", question));
    (cfg.context_window as usize)
        .saturating_sub(cfg.num_output as usize)
        .saturating_sub(fixed)
}

/// Builds the prompt from ranked hits, keeping ranking order.
pub fn build_prompt(question: &str, hits: &[RagHit], cfg: &QueryConfig) -> BuiltPrompt {
    let max_chars = context_budget(question, cfg) * 4;
    let mut context = String::new();
    let mut used = 0;
    let mut chars = 0;
    let mut truncated = false;

    for hit in hits {
        let section = format!(
            "file_name: {}\n\n{}",
            hit.segment.file_name,
            hit.segment.text.trim()
        );
        let sep = if context.is_empty() { "" } else { "\n\n" };
        let need = sep.len() + section.chars().count();

        if chars + need <= max_chars {
            context.push_str(sep);
            context.push_str(&section);
            chars += need;
            used += 1;
            continue;
        }

        let room = max_chars.saturating_sub(chars + sep.len());
        if room > 0 {
            context.push_str(sep);
            context.extend(section.chars().take(room));
            used += 1;
            truncated = true;
        }
        break;
    }

    BuiltPrompt {
        prompt: render(&context, question),
        segments_used: used,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_store::TextSegment;

    fn hit(name: &str, text: &str, score: f32) -> RagHit {
        RagHit {
            score,
            segment: TextSegment {
                id: format!("{name}-0"),
                doc_id: name.into(),
                file_name: name.into(),
                text: text.into(),
                start_char: 0,
                end_char: text.chars().count(),
            },
        }
    }

    #[test]
    fn estimates_round_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn includes_hits_in_order_with_file_names() {
        let hits = vec![hit("a.txt", "first", 0.9), hit("b.txt", "second", 0.5)];
        let built = build_prompt("Why?", &hits, &QueryConfig::default());
        let p = &built.prompt;
        assert_eq!(built.segments_used, 2);
        assert!(!built.truncated);
        assert!(p.contains("file_name: a.txt\n\nfirst\n\nfile_name: b.txt\n\nsecond"));
        assert!(p.find("first").unwrap() < p.find("second").unwrap());
        assert!(p.ends_with("Query: Why?\nAnswer: "));
    }

    #[test]
    fn truncates_to_fit_window() {
        let cfg = QueryConfig {
            similarity_top_k: 2,
            num_output: 100,
            context_window: 200,
        };
        let long = "x".repeat(2000);
        let hits = vec![hit("a.txt", &long, 0.9), hit("b.txt", "never shown", 0.1)];
        let built = build_prompt("What?", &hits, &cfg);

        assert!(built.truncated);
        assert_eq!(built.segments_used, 1);
        assert!(!built.prompt.contains("never shown"));
        assert!(estimate_tokens(&built.prompt) + 100 <= 200);
    }

    #[test]
    fn no_room_leaves_context_empty() {
        let cfg = QueryConfig {
            similarity_top_k: 2,
            num_output: 10,
            context_window: 20,
        };
        let built = build_prompt("a rather long question", &[hit("a.txt", "t", 1.0)], &cfg);
        assert_eq!(built.segments_used, 0);
        assert_eq!(built.prompt, render("", "a rather long question"));
    }
}
