//! Email delivery through the SendGrid v3 API
//!
//! The body the model writes is run through the response formatter and
//! embedded in a fixed HTML template.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::ToolDefinition;
use crate::format::format_response;
use crate::tools::{error_payload, string_arg, Tool};

const EMAIL_TEMPLATE: &str = r#"<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .email-container { max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 10px; background-color: #f9f9f9; }
        .email-header { font-size: 24px; color: #4CAF50; margin-bottom: 20px; }
        .email-content { font-size: 16px; color: #555; }
        .email-footer { margin-top: 20px; font-size: 14px; color: #777; }
    </style>
</head>
<body>
    <div class="email-container">
        <div class="email-header">Requested Information</div>
        <div class="email-content">
            This email was sent by DisasterConnect Chatbot.
            <br><br>
            You have requested the following information:
            <br><br>
            {{content}}
        </div>
        <div class="email-footer">
            Thank you for using DisasterConnect. Stay safe!
        </div>
    </div>
</body>
</html>"#;

/// `send_email(to, subject, body)`
pub struct EmailTool {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    sender: String,
}

impl EmailTool {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            sender: sender.into(),
        }
    }

    /// HTML email body around the formatted message
    pub fn render_html(body: &str) -> String {
        EMAIL_TEMPLATE.replace("{{content}}", &format_response(body))
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Value {
        let Some(api_key) = self.api_key.as_deref() else {
            return json!({ "status": "error", "error": "SENDGRID_API_KEY is not configured" });
        };

        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.sender },
            "subject": subject,
            "content": [{ "type": "text/html", "value": Self::render_html(body) }],
        });

        let response = match self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return error_payload(format!("Failed to send email: {}", e)),
        };

        let status = response.status().as_u16();
        if matches!(status, 200 | 202) {
            tracing::info!(status, "Email sent");
            json!({ "status": "success", "status_code": status })
        } else {
            tracing::warn!(status, "Email delivery rejected");
            json!({ "status": "error", "status_code": status })
        }
    }
}

#[async_trait]
impl Tool for EmailTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "send_email",
            "Send an email with the requested information to the user.",
            json!({
                "type": "object",
                "properties": {
                    "to": {
                        "type": "string",
                        "description": "the recipient email address"
                    },
                    "subject": {
                        "type": "string",
                        "description": "the subject of the email"
                    },
                    "body": {
                        "type": "string",
                        "description": "the body of the email"
                    }
                },
                "required": ["to", "subject", "body"],
                "additionalProperties": false
            }),
            true,
        )
    }

    async fn execute(&self, args: Value) -> Value {
        let (to, subject, body) = match (
            string_arg(&args, "to"),
            string_arg(&args, "subject"),
            string_arg(&args, "body"),
        ) {
            (Ok(to), Ok(subject), Ok(body)) => (to, subject, body),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
        };
        self.send(to, subject, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_body_is_formatted_into_template() {
        let html = EmailTool::render_html("**Shelter**: Main St Gym\n- bring ID");
        assert!(html.contains("<strong>Shelter</strong>: Main St Gym"));
        assert!(html.contains("&emsp;• bring ID"));
        assert!(html.contains("Thank you for using DisasterConnect"));
        assert!(!html.contains("{{content}}"));
    }

    #[tokio::test]
    async fn test_accepted_email_is_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v3/mail/send")
            .match_header("authorization", "Bearer sg-test")
            .match_body(Matcher::PartialJson(json!({
                "personalizations": [{"to": [{"email": "pat@example.org"}]}],
                "from": {"email": "noreply@disasterconnect.org"},
                "subject": "Shelter list"
            })))
            .with_status(202)
            .create_async()
            .await;

        let tool = EmailTool::new(
            Client::new(),
            server.url(),
            Some("sg-test".to_string()),
            "noreply@disasterconnect.org",
        );
        let result = tool
            .execute(json!({"to": "pat@example.org", "subject": "Shelter list", "body": "Main St Gym"}))
            .await;

        mock.assert_async().await;
        assert_eq!(result["status"], "success");
        assert_eq!(result["status_code"], 202);
    }

    #[tokio::test]
    async fn test_rejected_email_is_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v3/mail/send")
            .with_status(403)
            .create_async()
            .await;

        let tool = EmailTool::new(Client::new(), server.url(), Some("k".to_string()), "a@b.c");
        let result = tool
            .execute(json!({"to": "x@y.z", "subject": "s", "body": "b"}))
            .await;
        assert_eq!(result["status"], "error");
        assert_eq!(result["status_code"], 403);
    }

    #[tokio::test]
    async fn test_connection_failure_is_error_payload() {
        let tool = EmailTool::new(Client::new(), "http://127.0.0.1:9", Some("k".to_string()), "a@b.c");
        let result = tool
            .execute(json!({"to": "x@y.z", "subject": "s", "body": "b"}))
            .await;
        assert!(result["error"].as_str().unwrap().starts_with("Failed to send email"));
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let tool = EmailTool::new(Client::new(), "http://127.0.0.1:9", None, "a@b.c");
        let result = tool.execute(json!({"to": "x@y.z", "body": "b"})).await;
        assert_eq!(result["error"], "Missing or invalid argument: subject");
    }
}
