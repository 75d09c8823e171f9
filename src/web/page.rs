//! Chat page rendering
//!
//! User text is escaped by tera's autoescaping; bot text is already markup
//! produced by the response formatter and is emitted as-is.

use tera::{Context, Tera};

use crate::core::{HistoryEntry, Result};

const PAGE_NAME: &str = "index.html";

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>DisasterConnect</title>
    <link rel="stylesheet" href="/css/style.css">
</head>
<body>
    <div class="chat-container">
        <div class="chat-header">
            <img src="/images/logo.png" alt="DisasterConnect" class="chat-logo">
            <h1>DisasterConnect</h1>
        </div>
        <div class="chat-box" id="chat-box">
            {%- for entry in chat_history %}
            {%- if entry.speaker == "user" %}
            <div class="message user-message">
                <div class="message-text">{{ entry.text }}</div>
                <div class="timestamp">{{ entry.timestamp }}</div>
            </div>
            {%- else %}
            <div class="message bot-message">
                <div class="message-text">{{ entry.text | safe }}</div>
                <div class="timestamp">{{ entry.timestamp }}</div>
            </div>
            {%- endif %}
            {%- endfor %}
        </div>
        <form method="post" action="/" id="chat-form" class="chat-form">
            <input type="text" name="user_input" id="user-input" placeholder="Type your message..." autocomplete="off" required>
            <button type="submit">Send</button>
        </form>
    </div>
    <script>
    (function () {
        var form = document.getElementById("chat-form");
        var input = document.getElementById("user-input");
        var box = document.getElementById("chat-box");

        function entryNode(entry) {
            var wrap = document.createElement("div");
            wrap.className = "message " + (entry.speaker === "user" ? "user-message" : "bot-message");
            var text = document.createElement("div");
            text.className = "message-text";
            if (entry.speaker === "user") {
                text.textContent = entry.text;
            } else {
                text.innerHTML = entry.text;
            }
            var stamp = document.createElement("div");
            stamp.className = "timestamp";
            stamp.textContent = entry.timestamp;
            wrap.appendChild(text);
            wrap.appendChild(stamp);
            return wrap;
        }

        form.addEventListener("submit", function (event) {
            event.preventDefault();
            var sent = input.value;
            if (!sent.trim()) {
                return;
            }
            var body = new URLSearchParams(new FormData(form));
            input.value = "";
            fetch("/", {
                method: "POST",
                headers: { "X-Requested-With": "XMLHttpRequest" },
                body: body
            })
                .then(function (response) {
                    if (!response.ok) {
                        throw new Error(response.status);
                    }
                    return response.json();
                })
                .then(function (data) {
                    box.innerHTML = "";
                    data.history.forEach(function (entry) { box.appendChild(entryNode(entry)); });
                    box.scrollTop = box.scrollHeight;
                })
                .catch(function () {
                    // Hand the text back rather than posting it a second time
                    if (!input.value) {
                        input.value = sent;
                    }
                });
        });

        box.scrollTop = box.scrollHeight;
    })();
    </script>
</body>
</html>
"#;

/// Renders the single chat page
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_NAME, INDEX_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, history: &[HistoryEntry]) -> Result<String> {
        let mut context = Context::new();
        context.insert("chat_history", history);
        Ok(self.tera.render(PAGE_NAME, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_text_escaped_bot_markup_kept() {
        let page = PageRenderer::new().unwrap();
        let history = vec![
            HistoryEntry::bot("<strong>Welcome</strong>"),
            HistoryEntry::user("<b>help</b> & thanks"),
        ];
        let html = page.render(&history).unwrap();

        assert!(html.contains("<strong>Welcome</strong>"));
        assert!(html.contains("&lt;b&gt;help&lt;&#x2F;b&gt; &amp; thanks"));
        assert!(!html.contains("<b>help</b>"));
    }

    #[test]
    fn test_script_never_resubmits_the_form() {
        let html = PageRenderer::new().unwrap().render(&[]).unwrap();
        assert!(!html.contains("form.submit()"));
        assert!(html.contains("input.value = sent"));
    }

    #[test]
    fn test_empty_history_renders_form() {
        let page = PageRenderer::new().unwrap();
        let html = page.render(&[]).unwrap();
        assert!(html.contains(r#"name="user_input""#));
        assert!(!html.contains("bot-message\">"));
    }
}
