//! Individual formatting transforms
//!
//! Each transform is a pure `&str -> String` rewrite. Line-start rules run
//! after `Newlines`, so "line start" means the start of the text or right
//! after a `<br>`.

use regex::{Captures, Regex};

/// One step of the formatting pipeline
pub trait Transform: Send + Sync {
    /// Stable identifier, used in tests and debug logs
    fn name(&self) -> &'static str;

    fn apply(&self, input: &str) -> String;
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid formatter pattern {pattern:?}: {e}"))
}

/// A transform that is a single regex replacement
struct Replace {
    regex: Regex,
    replacement: &'static str,
}

impl Replace {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            regex: compile(pattern),
            replacement,
        }
    }

    fn apply(&self, input: &str) -> String {
        self.regex.replace_all(input, self.replacement).into_owned()
    }
}

/// Image references to `<img>` tags rooted at `/images/`
///
/// Handles `<image>path</image>`, `![alt](images/path)` and `(images/path)`.
pub struct Images {
    tag: Replace,
    markdown: Replace,
    parenthetical: Replace,
}

impl Images {
    pub fn new() -> Self {
        Self {
            tag: Replace::new(
                r"<image>\s*/?(?:images/)?([^<]+?)\s*</image>",
                r#"<img src="/images/$1" alt="Resource Image" class="chat-image" />"#,
            ),
            markdown: Replace::new(
                r"!\[([^\]]*)\]\(/?images/([^)]+)\)",
                r#"<img src="/images/$2" alt="$1" class="chat-image" />"#,
            ),
            parenthetical: Replace::new(
                r"\(/?images/([^)]+)\)",
                r#"<img src="/images/$1" alt="Resource Image" class="chat-image" />"#,
            ),
        }
    }
}

impl Transform for Images {
    fn name(&self) -> &'static str {
        "images"
    }

    fn apply(&self, input: &str) -> String {
        let out = self.tag.apply(input);
        let out = self.markdown.apply(&out);
        self.parenthetical.apply(&out)
    }
}

/// Markdown links and bare URLs to anchors opening in a new tab
///
/// Both forms are matched in one pass so a converted link is never rewrapped
/// within the same run.
pub struct Links {
    regex: Regex,
}

impl Links {
    pub fn new() -> Self {
        Self {
            regex: compile(
                r#"\[([^\]]+)\]\((https?://[^\s)]+)\)|(https?://[^\s<>"')\]]*[^\s<>"')\].,;:!?])"#,
            ),
        }
    }

    fn anchor(href: &str, label: &str) -> String {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            href, label
        )
    }
}

impl Transform for Links {
    fn name(&self) -> &'static str {
        "links"
    }

    fn apply(&self, input: &str) -> String {
        self.regex
            .replace_all(input, |caps: &Captures| match (caps.get(2), caps.get(3)) {
                (Some(href), _) => Self::anchor(href.as_str(), &caps[1]),
                (None, Some(url)) => Self::anchor(url.as_str(), url.as_str()),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Each newline to one `<br>`
pub struct Newlines(Replace);

impl Newlines {
    pub fn new() -> Self {
        Self(Replace::new(r"\r?\n", "<br>"))
    }
}

impl Transform for Newlines {
    fn name(&self) -> &'static str {
        "newlines"
    }

    fn apply(&self, input: &str) -> String {
        self.0.apply(input)
    }
}

/// `### Heading:` to an emphasized heading on its own line
pub struct Headings(Replace);

impl Headings {
    pub fn new() -> Self {
        Self(Replace::new(
            r"###[ \t]*([^:<]+):",
            "<br><br><strong>$1:</strong><br>",
        ))
    }
}

impl Transform for Headings {
    fn name(&self) -> &'static str {
        "headings"
    }

    fn apply(&self, input: &str) -> String {
        self.0.apply(input)
    }
}

/// Numbered list items get an extra break in front
pub struct NumberedItems(Replace);

impl NumberedItems {
    pub fn new() -> Self {
        Self(Replace::new(r"(^|<br>)[ \t]*(\d+\.[ \t]+)", "$1<br>$2"))
    }
}

impl Transform for NumberedItems {
    fn name(&self) -> &'static str {
        "numbered_items"
    }

    fn apply(&self, input: &str) -> String {
        self.0.apply(input)
    }
}

/// `- **Label**:` bullets to an indented bullet with a bold label
pub struct BoldBullets(Replace);

impl BoldBullets {
    pub fn new() -> Self {
        Self(Replace::new(
            r"(?:^|<br>)[ \t]*[-*][ \t]+\*\*([^*]+)\*\*:",
            "<br>&emsp;• <strong>$1:</strong>",
        ))
    }
}

impl Transform for BoldBullets {
    fn name(&self) -> &'static str {
        "bold_bullets"
    }

    fn apply(&self, input: &str) -> String {
        self.0.apply(input)
    }
}

/// Plain `- item` bullets to indented bullet glyphs
pub struct Bullets(Replace);

impl Bullets {
    pub fn new() -> Self {
        Self(Replace::new(r"(?:^|<br>)[ \t]*-[ \t]+", "<br>&emsp;• "))
    }
}

impl Transform for Bullets {
    fn name(&self) -> &'static str {
        "bullets"
    }

    fn apply(&self, input: &str) -> String {
        self.0.apply(input)
    }
}

/// `**x**` to `<strong>x</strong>`
pub struct Emphasis(Replace);

impl Emphasis {
    pub fn new() -> Self {
        Self(Replace::new(r"\*\*(.+?)\*\*", "<strong>$1</strong>"))
    }
}

impl Transform for Emphasis {
    fn name(&self) -> &'static str {
        "emphasis"
    }

    fn apply(&self, input: &str) -> String {
        self.0.apply(input)
    }
}

/// Break runs around inserted headings and numbered items down to two
///
/// Runs elsewhere came from the source text and are kept as written.
pub struct CollapseBreaks {
    before_heading: Replace,
    after_heading: Replace,
    before_item: Replace,
}

impl CollapseBreaks {
    pub fn new() -> Self {
        Self {
            before_heading: Replace::new(
                r"(?:<br>[ \t]*){3,}(<strong>[^<]*:</strong><br>)",
                "<br><br>$1",
            ),
            after_heading: Replace::new(
                r"(<br><strong>[^<]*:</strong>)(?:<br>[ \t]*){3,}",
                "$1<br><br>",
            ),
            before_item: Replace::new(r"(?:<br>[ \t]*){3,}(\d+\.[ \t])", "<br><br>$1"),
        }
    }
}

impl Transform for CollapseBreaks {
    fn name(&self) -> &'static str {
        "collapse_breaks"
    }

    fn apply(&self, input: &str) -> String {
        let text = self.before_heading.apply(input);
        let text = self.after_heading.apply(&text);
        self.before_item.apply(&text)
    }
}
