use minijinja::Environment;
use serde_json::{json, Value};

use super::error::DispatchError;
use crate::server::RequestHead;

const DIAGNOSTIC_TEMPLATE_NAME: &str = "diagnostic.html";

// Autoescaped: the `.html` name enables minijinja's HTML escaping.
const DIAGNOSTIC_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ status }} {{ error.type }}</title>
<style>
body { font-family: monospace; margin: 2em; }
h1 { color: #b00020; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ccc; padding: 2px 8px; text-align: left; }
</style>
</head>
<body>
<h1>{{ status }} {{ error.type }}</h1>
<p>{{ error.message }}</p>
{% if error.chain %}
<h2>Caused by</h2>
<ol>
{% for cause in error.chain %}<li>{{ cause }}</li>
{% endfor %}
</ol>
{% endif %}
<h2>Request</h2>
<table>
<tr><th>Method</th><td>{{ request.method }}</td></tr>
<tr><th>URL</th><td>{{ request.scheme }}://{{ request.host or "" }}{{ request.path }}</td></tr>
<tr><th>Version</th><td>{{ request.version }}</td></tr>
{% for name, value in request.headers|items %}<tr><th>{{ name }}</th><td>{{ value }}</td></tr>
{% endfor %}
</table>
{% if request.attributes %}
<h2>Attributes</h2>
<table>
{% for key, value in request.attributes|items %}<tr><th>{{ key }}</th><td>{{ value }}</td></tr>
{% endfor %}
</table>
{% endif %}
</body>
</html>
"#;

/// Captured failure context.
///
/// Holds the error, the client status when the failure is request-caused, and
/// a JSON diagnostic payload describing the error and the request it broke.
#[derive(Debug)]
pub struct Snapshot {
    error: DispatchError,
    status: Option<u16>,
    payload: Value,
}

impl Snapshot {
    pub fn capture(error: DispatchError, head: &RequestHead) -> Self {
        let status = error.client_status();
        let (kind, chain): (&str, Vec<String>) = match &error {
            DispatchError::Client { .. } => ("ClientError", Vec::new()),
            DispatchError::Internal(cause) => (
                "InternalError",
                cause.chain().skip(1).map(ToString::to_string).collect(),
            ),
        };
        let payload = json!({
            "error": {
                "type": kind,
                "message": error.to_string(),
                "chain": chain,
            },
            "request": head,
        });
        Self {
            error,
            status,
            payload,
        }
    }

    #[must_use]
    pub fn error(&self) -> &DispatchError {
        &self.error
    }

    /// Client status code, `None` for unclassified failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Diagnostic payload for machine-readable responses.
    #[must_use]
    pub fn package(&self) -> &Value {
        &self.payload
    }

    /// Full human-readable diagnostic page.
    pub fn render_html(&self, status: u16) -> Result<String, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(DIAGNOSTIC_TEMPLATE_NAME, DIAGNOSTIC_TEMPLATE)?;
        let template = env.get_template(DIAGNOSTIC_TEMPLATE_NAME)?;
        let mut ctx = self.payload.clone();
        if let Value::Object(map) = &mut ctx {
            map.insert("status".to_string(), json!(status));
        }
        template.render(&ctx)
    }
}
