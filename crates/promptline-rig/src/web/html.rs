//! Readable text extraction from HTML.

/// Text and title of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlText {
    /// Content of the first `<title>` element.
    pub title: Option<String>,
    /// Visible text with whitespace collapsed.
    pub text: String,
}

/// Elements whose content is never visible.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extracts the visible text of `html`.
///
/// Drops comments and hidden elements, strips tags, decodes the common
/// entities and collapses whitespace. Block-level closing tags become
/// spaces so adjacent paragraphs do not run together.
pub fn extract_text(html: &str) -> HtmlText {
    let title = element_text(html, "title").map(|t| collapse(&decode_entities(&t)));

    let mut visible = strip_comments(html);
    for element in HIDDEN_ELEMENTS {
        visible = strip_element(&visible, element);
    }

    let mut text = String::with_capacity(visible.len());
    let mut in_tag = false;
    for c in visible.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    HtmlText {
        title: title.filter(|t| !t.is_empty()),
        text: collapse(&decode_entities(&text)),
    }
}

/// Returns the raw content of the first `name` element.
fn element_text(html: &str, name: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find(&format!("<{name}"))?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find(&format!("</{name}>"))?;
    Some(html[start..end].to_string())
}

/// Removes every `name` element and its content.
fn strip_element(html: &str, name: &str) -> String {
    let open_tag = format!("<{name}");
    let close_tag = format!("</{name}>");
    let lower = html.to_ascii_lowercase();

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    while let Some(offset) = lower[cursor..].find(&open_tag) {
        let start = cursor + offset;
        out.push_str(&html[cursor..start]);
        match lower[start..].find(&close_tag) {
            Some(end) => cursor = start + end + close_tag.len(),
            None => {
                cursor = html.len();
                break;
            }
        }
    }
    out.push_str(&html[cursor..]);
    out
}

fn strip_comments(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start..].find("-->") {
            Some(end) => rest = &rest[start + end + 3..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_visible_text() {
        let html = r#"<!DOCTYPE html>
<html>
<head>
  <title>Rust &amp; You</title>
  <style>body { color: red; }</style>
  <SCRIPT type="text/javascript">alert("hi")</SCRIPT>
</head>
<body>
  <!-- navigation -->
  <h1>Hello</h1><p>Fearless&nbsp;concurrency &lt;3</p>
</body>
</html>"#;

        let page = extract_text(html);
        assert_eq!(page.title.as_deref(), Some("Rust & You"));
        assert_eq!(page.text, "Rust & You Hello Fearless concurrency <3");
    }

    #[test]
    fn unterminated_hidden_element_drops_the_rest() {
        let page = extract_text("<p>before</p><script>never closed");
        assert_eq!(page.text, "before");
        assert_eq!(page.title, None);
    }

    #[test]
    fn plain_text_passes_through() {
        let page = extract_text("  just\n\ttext  ");
        assert_eq!(page.text, "just text");
    }
}
