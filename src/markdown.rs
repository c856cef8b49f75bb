//! The small markdown subset used by journal entries.
//!
//! Rules run in a fixed order over the whole text, each seeing the output of the previous one.
//! Input is not escaped. A `\r` ends a line the same way `\n` does.

use once_cell::sync::Lazy;
use regex::Regex;

static H3: Lazy<Regex> = Lazy::new(|| compile(r"(?mR)^### (.*)$"));
static H2: Lazy<Regex> = Lazy::new(|| compile(r"(?mR)^## (.*)$"));
static H1: Lazy<Regex> = Lazy::new(|| compile(r"(?mR)^# (.*)$"));
static BOLD: Lazy<Regex> = Lazy::new(|| compile(r"(?R)\*\*(.*?)\*\*"));
static ITALIC: Lazy<Regex> = Lazy::new(|| compile(r"(?R)\*(.*?)\*"));
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| compile(r"(?mR)^- (.*)$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid markdown pattern")
}

pub fn render(text: &str) -> String {
    let html = H3.replace_all(text, "<h3>${1}</h3>");
    let html = H2.replace_all(&html, "<h2>${1}</h2>");
    let html = H1.replace_all(&html, "<h1>${1}</h1>");
    let html = BOLD.replace_all(&html, "<strong>${1}</strong>");
    let html = ITALIC.replace_all(&html, "<em>${1}</em>");
    let html = LIST_ITEM.replace_all(&html, "<li>${1}</li>");
    html.replace('\n', "<br />")
}

#[cfg(test)]
mod tests {
    use super::render;

    #[test]
    fn renders_headers_emphasis_and_list_items() {
        assert_eq!(
            render("# Title\n**bold** and *italic*\n- item"),
            "<h1>Title</h1><br /><strong>bold</strong> and <em>italic</em><br /><li>item</li>"
        );
    }

    #[test]
    fn header_levels_do_not_swallow_each_other() {
        assert_eq!(
            render("### Three\n## Two\n# One"),
            "<h3>Three</h3><br /><h2>Two</h2><br /><h1>One</h1>"
        );
    }

    #[test]
    fn markers_must_start_the_line() {
        assert_eq!(render("not # a header - nor item"), "not # a header - nor item");
    }

    #[test]
    fn every_newline_becomes_a_break() {
        assert_eq!(render("a\n\nb\n"), "a<br /><br />b<br />");
    }

    #[test]
    fn carriage_returns_stay_outside_the_tags() {
        assert_eq!(
            render("# T\r\n- a\r\n"),
            "<h1>T</h1>\r<br /><li>a</li>\r<br />"
        );
    }

    #[test]
    fn existing_markup_is_left_as_is() {
        assert_eq!(render("<b>kept</b> *x*"), "<b>kept</b> <em>x</em>");
    }
}
