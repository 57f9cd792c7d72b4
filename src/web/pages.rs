//! Minimal HTML pages for the form flow.

const STYLESHEET: &str = r#"<link rel="stylesheet" href="/static/style.css">"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n{STYLESHEET}\n</head>\n<body>\n<nav><a href=\"/\">Home</a> | <a href=\"/message\">Send message</a></nav>\n{body}\n</body>\n</html>\n"
    )
}

pub fn index() -> String {
    layout(
        "Message relay",
        "<h1>Message relay</h1>\n<p>Leave a message for the team.</p>",
    )
}

pub fn message_form(success: bool) -> String {
    let notice = if success {
        "<p class=\"success\">Message sent!</p>\n"
    } else {
        ""
    };
    let body = format!(
        "<h1>Send a message</h1>\n{notice}<form method=\"post\" action=\"/message\">\n<input type=\"text\" name=\"username\" placeholder=\"Your name\">\n<textarea name=\"message\" placeholder=\"Message\"></textarea>\n<button type=\"submit\">Send</button>\n</form>"
    );
    layout("Send a message", &body)
}

pub fn not_found() -> String {
    layout("Not found", "<h1>404</h1>\n<p>Page not found.</p>")
}

pub fn submission_failed() -> String {
    layout(
        "Submission failed",
        "<h1>Submission failed</h1>\n<p>Your message could not be sent. Please try again.</p>",
    )
}
