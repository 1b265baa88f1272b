//! Terminal output for the CLI
//!
//! Search results render as Markdown with `**bold**` around matched terms. The
//! windowed listing goes through [`VirtualList`] with a text host, so only the
//! requested rows are ever formatted.

use crate::config::VirtualListConfig;
use crate::models::{Category, Prompt, Tag};
use crate::search::{highlight, HighlightMarker, SearchOutcome};
use crate::virtual_list::{ElementHost, ItemHeight, VirtualList, VirtualListOptions};

/// Content longer than this is cut in result listings
const SNIPPET_CHARS: usize = 240;

fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

/// Prefix every line with `> ` so multi-line text stays inside the quote
fn quote(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn meta_line(prompt: &Prompt) -> String {
    let mut parts = vec![format!("`{}`", prompt.id)];
    if !prompt.category.is_empty() {
        parts.push(prompt.category.clone());
    }
    if !prompt.tags.is_empty() {
        parts.push(
            prompt
                .tags
                .iter()
                .map(|t| format!("#{}", t))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    if let Some(ts) = prompt.effective_timestamp() {
        parts.push(ts.to_string());
    }
    parts.join(" · ")
}

/// Markdown listing of the first `limit` results
pub fn format_search_results(outcome: &SearchOutcome, query: &str, limit: usize) -> String {
    let marker = HighlightMarker::markdown();
    let terms = &outcome.highlight_terms;
    let total = outcome.results.len();

    let mut md = String::new();
    if query.trim().is_empty() {
        md.push_str(&format!("# Prompts · {}\n\n", total));
    } else {
        md.push_str(&format!("# Search Results · {} prompts for \"{}\"\n\n", total, query.trim()));
    }

    if total == 0 {
        md.push_str("No prompts matched.\n");
        return md;
    }

    for prompt in outcome.results.iter().take(limit) {
        md.push_str(&format!("## {}\n\n", highlight(&prompt.title, terms, &marker)));
        md.push_str(&format!("{}\n\n", meta_line(prompt)));

        if !prompt.description.is_empty() {
            md.push_str(&format!("{}\n\n", highlight(&prompt.description, terms, &marker)));
        }
        if !prompt.content.is_empty() {
            let content = highlight(&snippet(&prompt.content), terms, &marker);
            md.push_str(&format!("{}\n\n", quote(&content)));
        }

        md.push_str("---\n\n");
    }

    if total > limit {
        md.push_str(&format!("_{} more not shown_\n", total - limit));
    }

    md
}

/// Full Markdown view of one prompt
pub fn format_prompt(prompt: &Prompt) -> String {
    let mut md = format!("# {}\n\n{}\n\n", prompt.title, meta_line(prompt));
    if !prompt.description.is_empty() {
        md.push_str(&format!("{}\n\n", prompt.description));
    }
    md.push_str("```\n");
    md.push_str(&prompt.content);
    if !prompt.content.ends_with('\n') {
        md.push('\n');
    }
    md.push_str("```\n");
    md
}

pub fn format_categories(categories: &[Category]) -> String {
    format_catalog("Categories", categories.iter().map(|c| (&c.id, &c.name)))
}

pub fn format_tags(tags: &[Tag]) -> String {
    format_catalog("Tags", tags.iter().map(|t| (&t.id, &t.name)))
}

fn format_catalog<'a>(heading: &str, entries: impl ExactSizeIterator<Item = (&'a String, &'a String)>) -> String {
    let mut md = format!("# {} · {}\n\n", heading, entries.len());
    for (id, name) in entries {
        md.push_str(&format!("- {} (`{}`)\n", name, id));
    }
    md
}

/// One rendered terminal line
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    pub index: usize,
    pub line: String,
    pub offset: f64,
}

/// Element host that renders prompts into numbered text lines
pub struct TextHost {
    terms: Vec<String>,
    marker: HighlightMarker,
}

impl TextHost {
    pub fn new(terms: Vec<String>) -> Self {
        Self {
            terms,
            marker: HighlightMarker::markdown(),
        }
    }
}

impl ElementHost<Prompt> for TextHost {
    type Handle = TextRow;

    fn create_element(&mut self, item: &Prompt, index: usize) -> Option<TextRow> {
        let title = if item.title.is_empty() {
            "(untitled)".to_string()
        } else {
            highlight(&item.title, &self.terms, &self.marker)
        };
        Some(TextRow {
            index,
            line: format!("{:>5}. {}  [{}]", index + 1, title, item.id),
            offset: 0.0,
        })
    }

    fn position_element(&mut self, handle: &mut TextRow, offset: f64) {
        handle.offset = offset;
    }

    fn destroy_element(&mut self, _handle: TextRow) {}

    // Plain text has no scrollbar to size
    fn set_content_height(&mut self, _height: f64) {}
}

/// Render `rows` result lines starting at `offset`, one line per prompt
pub fn render_window(outcome: &SearchOutcome, offset: usize, rows: usize, config: &VirtualListConfig) -> String {
    let total = outcome.results.len();
    if rows == 0 || offset >= total {
        return format!("(no rows in range; {} results)\n", total);
    }

    let item_height = if config.item_height.is_finite() && config.item_height > 0.0 {
        config.item_height
    } else {
        1.0
    };
    let options = VirtualListOptions {
        viewport_height: rows as f64 * item_height,
        // One spare row each side absorbs float rounding at fractional heights
        buffer: 1,
    };
    let mut list = VirtualList::new(
        TextHost::new(outcome.highlight_terms.clone()),
        outcome.results.clone(),
        ItemHeight::Fixed(item_height),
        options,
    );
    list.scroll_to_index(offset);
    list.on_animation_frame();

    let end = offset.saturating_add(rows).min(total);
    let lines: Vec<String> = (offset..end)
        .filter_map(|index| list.rendered_handle(index))
        .map(|row| row.line.clone())
        .collect();
    let shown = lines.len();
    list.destroy();

    format!(
        "{}\n\nRows {}-{} of {}\n",
        lines.join("\n"),
        offset + 1,
        offset + shown,
        total
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(id: &str, title: &str, content: &str) -> Prompt {
        Prompt {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tags: vec!["react".to_string()],
            category: "dev".to_string(),
            ..Default::default()
        }
    }

    fn outcome(n: usize) -> SearchOutcome {
        SearchOutcome {
            results: (0..n)
                .map(|i| prompt(&format!("p{}", i), &format!("React prompt {}", i), "body"))
                .collect(),
            highlight_terms: vec!["react".to_string()],
        }
    }

    #[test]
    fn test_results_are_highlighted() {
        let md = format_search_results(&outcome(2), "react", 10);
        assert!(md.starts_with("# Search Results · 2 prompts for \"react\""));
        assert!(md.contains("## **React** prompt 0"));
        assert!(md.contains("`p1` · dev · #react"));
        assert!(md.contains("> body"));
    }

    #[test]
    fn test_limit_reports_remainder() {
        let md = format_search_results(&outcome(5), "react", 2);
        assert!(md.contains("prompt 1"));
        assert!(!md.contains("prompt 2"));
        assert!(md.contains("_3 more not shown_"));
    }

    #[test]
    fn test_empty_outcome() {
        let md = format_search_results(&SearchOutcome::default(), "nothing", 10);
        assert!(md.contains("No prompts matched."));
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let long = "é".repeat(SNIPPET_CHARS + 10);
        let cut = snippet(&long);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 1);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_multiline_content_stays_quoted() {
        assert_eq!(quote("one\ntwo"), "> one\n> two");
    }

    #[test]
    fn test_render_window_shows_requested_rows() {
        let text = render_window(&outcome(100), 40, 5, &VirtualListConfig::default());
        let lines: Vec<&str> = text.lines().take(5).collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("   41. **React** prompt 40"));
        assert!(lines[4].contains("[p44]"));
        assert!(text.contains("Rows 41-45 of 100"));
    }

    #[test]
    fn test_render_window_clamps_at_end() {
        let text = render_window(&outcome(10), 8, 5, &VirtualListConfig::default());
        assert!(text.contains("Rows 9-10 of 10"));
    }

    #[test]
    fn test_render_window_fractional_height_starts_at_offset() {
        let config = VirtualListConfig {
            buffer: 5,
            item_height: 0.1,
        };
        let results = outcome(100);
        for offset in 0..97 {
            let text = render_window(&results, offset, 3, &config);
            let lines: Vec<&str> = text.lines().take(3).collect();
            assert!(
                lines[0].contains(&format!("[p{}]", offset)),
                "offset {} printed {:?}",
                offset,
                lines[0]
            );
            assert!(lines[2].contains(&format!("[p{}]", offset + 2)));
            assert!(text.contains(&format!("Rows {}-{} of 100", offset + 1, offset + 3)));
        }
    }

    #[test]
    fn test_render_window_out_of_range() {
        let text = render_window(&outcome(3), 10, 5, &VirtualListConfig::default());
        assert!(text.starts_with("(no rows in range"));
    }

    #[test]
    fn test_format_prompt_and_catalog() {
        let md = format_prompt(&prompt("p1", "Title", "Line"));
        assert!(md.contains("```\nLine\n```"));

        let categories = vec![Category {
            id: "dev".to_string(),
            name: "Development".to_string(),
        }];
        assert!(format_categories(&categories).contains("- Development (`dev`)"));
        assert!(format_tags(&[]).starts_with("# Tags · 0"));
    }
}
