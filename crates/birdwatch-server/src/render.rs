//! Server-rendered HTML for the single-page form.

use birdwatch_core::{SessionContext, REPORT_FILENAME};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Render the page. `sidebar` notices sit under the key fields, `main`
/// notices above the Generate button.
pub fn render_page(session: &SessionContext, sidebar: &[Notice], main: &[Notice]) -> String {
    let mut html = String::new();
    html.push_str(HEAD);
    html.push_str("<body>\n<div class=\"layout\">\n");
    push_sidebar(&mut html, session, sidebar);
    html.push_str("<main>\n");
    html.push_str(
        "<h1>🐦 Bird Watch Companion Bot</h1>\n\
         <p class=\"intro\">Spot and identify birds through your camera lens, and receive \
         personalized care, feeding, and migration guidance.</p>\n<hr>\n",
    );
    push_profile_form(&mut html, main);
    if let Some(cached) = &session.current {
        html.push_str("<hr>\n<section id=\"report\">\n<h2>🖼️ Uploaded Bird Image</h2>\n");
        html.push_str(&format!(
            "<img class=\"bird\" src=\"/report/image?v={}\" alt=\"{}\">\n",
            cached.generated_at.timestamp_millis(),
            escape_html(&cached.image.filename)
        ));
        html.push_str("<div id=\"report-rendered\" class=\"markdown\">\n");
        html.push_str(&render_markdown(cached.report.as_str()));
        html.push_str("</div>\n");
        html.push_str(&format!(
            "<a class=\"button\" href=\"/report/download\" download=\"{REPORT_FILENAME}\">\
             📥 Download Bird Report</a>\n"
        ));
        html.push_str("</section>\n");
    }
    html.push_str("</main>\n</div>\n");
    html.push_str(SCRIPTS);
    html.push_str("</body>\n</html>\n");
    html
}

/// Render report markdown to HTML. Raw HTML in the source is shown as text
/// and links or images with a scheme other than http(s)/mailto are disarmed.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim_start().to_ascii_lowercase();
    let has_scheme = lower
        .split_once(':')
        .is_some_and(|(scheme, _)| !scheme.contains(['/', '?', '#']));
    let allowed = ["http:", "https:", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme));
    if has_scheme && !allowed {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn push_notices(html: &mut String, notices: &[Notice]) {
    for notice in notices {
        let class = match notice.kind {
            NoticeKind::Success => "notice success",
            NoticeKind::Error => "notice error",
        };
        html.push_str(&format!(
            "<div class=\"{class}\" role=\"status\">{}</div>\n",
            escape_html(&notice.text)
        ));
    }
}

fn push_sidebar(html: &mut String, session: &SessionContext, notices: &[Notice]) {
    let status = |present: bool| if present { "configured" } else { "not set" };
    html.push_str("<aside>\n<h2>🔐 API Configuration</h2>\n<hr>\n");
    html.push_str("<form method=\"post\" action=\"/credentials\">\n");
    html.push_str(&format!(
        "<label for=\"model_api_key\">OpenAI API Key <span class=\"key-status\">({})</span></label>\n\
         <input type=\"password\" id=\"model_api_key\" name=\"model_api_key\" autocomplete=\"off\">\n\
         <p class=\"help\">Don't have an API key? Get one \
         <a href=\"https://platform.openai.com/account/api-keys\">here</a>.</p>\n",
        status(session.credentials.model_key().is_some())
    ));
    html.push_str(&format!(
        "<label for=\"search_api_key\">Serp API Key <span class=\"key-status\">({})</span></label>\n\
         <input type=\"password\" id=\"search_api_key\" name=\"search_api_key\" autocomplete=\"off\">\n\
         <p class=\"help\">Don't have an API key? Get one \
         <a href=\"https://serpapi.com/manage-api-key\">here</a>.</p>\n",
        status(session.credentials.search_key().is_some())
    ));
    html.push_str("<button type=\"submit\">Save keys</button>\n</form>\n");
    push_notices(html, notices);
    html.push_str("<hr>\n</aside>\n");
}

fn push_profile_form(html: &mut String, notices: &[Notice]) {
    html.push_str(
        "<form id=\"profile\" method=\"post\" action=\"/report\" enctype=\"multipart/form-data\">\n\
         <div class=\"columns\">\n\
         <div>\n<h3>📸 Upload Bird Image</h3>\n\
         <label for=\"image\">Choose a photo of the bird you spotted</label>\n\
         <input type=\"file\" id=\"image\" name=\"image\" accept=\".jpg,.jpeg,.png,image/jpeg,image/png\">\n\
         </div>\n\
         <div>\n<h3>🗺️ Bird Sighting Details</h3>\n\
         <label for=\"region\">Where did you spot the bird?</label>\n\
         <input type=\"text\" id=\"region\" name=\"region\" placeholder=\"e.g., Central Park, NY or Western Ghats\">\n\
         <label for=\"behavior\">Describe the bird's behavior (optional)</label>\n\
         <input type=\"text\" id=\"behavior\" name=\"behavior\" placeholder=\"e.g., hopping on the ground, flying in circles, feeding\">\n\
         </div>\n</div>\n<hr>\n",
    );
    push_notices(html, notices);
    html.push_str(
        "<button type=\"submit\" id=\"generate\">🐦 Generate Bird Report</button>\n\
         <div id=\"spinner\" class=\"spinner\" hidden>Identifying the bird and generating a \
         personalized habitat and behavior guide...</div>\n</form>\n",
    );
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Bird Watch Companion Bot</title>
<style>
* { box-sizing: border-box; }
body { margin: 0; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #fafafa; color: #222; line-height: 1.5; }
.layout { display: flex; min-height: 100vh; }
aside { width: 300px; padding: 20px; background: #f0f2f6; }
main { flex: 1; padding: 20px 1rem; max-width: 1200px; margin: 0 auto; }
h1 { font-size: 2.5rem; margin: 0 0 8px; }
label { display: block; margin-top: 12px; font-weight: 600; }
input[type=text], input[type=password] { width: 100%; padding: 8px; margin-top: 4px; border: 1px solid #ccc; border-radius: 6px; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }
.help { font-size: 0.85rem; color: #666; margin: 4px 0 0; }
.key-status { font-weight: normal; color: #666; }
button, .button { display: inline-block; margin-top: 12px; padding: 8px 16px; border: 1px solid #ccc; border-radius: 6px; background: #fff; color: #222; cursor: pointer; text-decoration: none; }
.notice { margin-top: 12px; padding: 10px 14px; border-radius: 6px; }
.notice.success { background: #e3f6e8; color: #176b2c; }
.notice.error { background: #fdecea; color: #8a1c13; }
.spinner { margin-top: 12px; color: #555; }
img.bird { max-width: 100%; max-height: 480px; border-radius: 6px; }
div.markdown a { word-break: break-all; }
</style>
</head>
"#;

const SCRIPTS: &str = r#"<script>
document.getElementById('profile').addEventListener('submit', function () {
  document.getElementById('spinner').hidden = false;
  document.getElementById('generate').disabled = true;
});
</script>
"#;
