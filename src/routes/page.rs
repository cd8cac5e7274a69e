use crate::models::{ClassifyResponse, ErrorResponse};

/// Outcome shown below the form, if any
pub enum PageOutcome<'a> {
    Empty,
    Result(&'a ClassifyResponse),
    Error(&'a ErrorResponse),
}

/// Render the manual entry page
pub fn render(bodies: &[&str], text: &str, outcome: PageOutcome<'_>) -> String {
    let mut html = String::with_capacity(2048);

    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>biscuit-server</title></head>\n<body>\n");
    html.push_str("<h1>Which body of text is this?</h1>\n");
    html.push_str("<form method=\"post\" action=\"/\">\n");
    html.push_str(&format!(
        "<textarea name=\"text\" rows=\"8\" cols=\"80\">{}</textarea><br>\n",
        escape(text)
    ));
    html.push_str("<button type=\"submit\">Classify</button>\n</form>\n");

    match outcome {
        PageOutcome::Empty => {}
        PageOutcome::Result(response) => {
            html.push_str(&format!(
                "<h2>Best match: {}</h2>\n<ol>\n",
                escape(response.best_match.as_deref().unwrap_or("none"))
            ));
            for label in &response.ranking {
                let score = response.scores.get(label).copied().unwrap_or_default();
                html.push_str(&format!("<li>{} ({:.4})</li>\n", escape(label), score));
            }
            html.push_str(&format!(
                "</ol>\n<p>Processed in {:.2} ms</p>\n",
                response.processing_time_ms
            ));
        }
        PageOutcome::Error(err) => {
            html.push_str(&format!("<p class=\"error\">{}</p>\n", escape(&err.message)));
        }
    }

    html.push_str(&format!("<h3>Supported bodies ({})</h3>\n<ul>\n", bodies.len()));
    for body in bodies {
        html.push_str(&format!("<li>{}</li>\n", escape(body)));
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    html
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
