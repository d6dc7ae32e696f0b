//! HTML and SVG rendering for frame pages.
//!
//! A frame document is an ordinary HTML page whose `<meta>` tags tell the
//! frame host which image and buttons to show and where to post presses.

use std::fmt::Write as _;

use frame_api::{CardKind, Dashboard, FrameImage, FramePage};
use shared::protocol::ButtonAction;
use url::Url;

pub const GENERATING_IMAGE_PATH: &str = "/frames/images/generating.svg";
pub const ERROR_IMAGE_PATH: &str = "/frames/images/error.svg";

const CARD_WIDTH: u32 = 1146;
const CARD_HEIGHT: u32 = 600;

pub fn frame_document(page: &FramePage, public_url: &Url) -> Result<String, serde_json::Error> {
    let state = serde_json::to_string(&page.state)?;
    let image = image_url(&page.image, public_url);
    let post_url = absolute(public_url, &page.pathname);

    let mut meta = vec![
        ("fc:frame".to_string(), "vNext".to_string()),
        ("fc:frame:image".to_string(), image.clone()),
        ("og:image".to_string(), image.clone()),
        ("fc:frame:post_url".to_string(), post_url),
    ];
    if let Some(placeholder) = &page.input_placeholder {
        meta.push(("fc:frame:input:text".to_string(), placeholder.clone()));
    }
    for (index, button) in page.buttons.iter().enumerate() {
        let n = index + 1;
        meta.push((format!("fc:frame:button:{n}"), button.label.clone()));
        match &button.action {
            ButtonAction::Post => {
                meta.push((format!("fc:frame:button:{n}:action"), "post".to_string()));
            }
            ButtonAction::Link { target } => {
                meta.push((format!("fc:frame:button:{n}:action"), "link".to_string()));
                meta.push((format!("fc:frame:button:{n}:target"), target.clone()));
            }
        }
    }
    meta.push(("fc:frame:state".to_string(), state));

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Artcast</title>\n");
    for (property, content) in &meta {
        let _ = writeln!(
            html,
            "<meta property=\"{}\" content=\"{}\">",
            escape_html(property),
            escape_html(content)
        );
    }
    html.push_str("</head>\n<body>\n");
    match &page.dashboard {
        Some(dashboard) => html.push_str(&dashboard_html(dashboard)),
        None => {
            let _ = writeln!(html, "<p>{}</p>", caption(&page.image));
        }
    }
    let _ = writeln!(
        html,
        "<img src=\"{}\" alt=\"frame\" width=\"{CARD_WIDTH}\">",
        escape_html(&image)
    );
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

pub fn image_url(image: &FrameImage, public_url: &Url) -> String {
    match image {
        FrameImage::Cast { url, .. } => url.to_string(),
        FrameImage::Generating => absolute(public_url, GENERATING_IMAGE_PATH),
        FrameImage::Error { message } => match public_url.join(ERROR_IMAGE_PATH) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("message", message);
                url.to_string()
            }
            Err(_) => ERROR_IMAGE_PATH.to_string(),
        },
    }
}

fn absolute(public_url: &Url, path: &str) -> String {
    public_url
        .join(path)
        .map(String::from)
        .unwrap_or_else(|_| path.to_string())
}

fn caption(image: &FrameImage) -> &'static str {
    match image {
        FrameImage::Cast {
            kind: CardKind::Root,
            ..
        } => "Artcast",
        FrameImage::Cast {
            kind: CardKind::Derivative,
            ..
        } => "Artcast remix",
        FrameImage::Cast {
            kind: CardKind::Created,
            ..
        } => "Your Artcast is ready",
        FrameImage::Cast {
            kind: CardKind::Start,
            ..
        } => "Join this Artcast",
        FrameImage::Generating => "generating",
        FrameImage::Error { .. } => "Something went wrong",
    }
}

fn dashboard_html(dashboard: &Dashboard) -> String {
    let cast = &dashboard.cast;
    let mut html = String::new();
    html.push_str("<main class=\"dashboard\">\n<h2>Dashboard</h2>\n<section class=\"summary\">\n");
    if let Some(image_url) = &dashboard.image_url {
        let _ = writeln!(
            html,
            "<img class=\"cast-image\" src=\"{}\" alt=\"cast\">",
            escape_html(image_url.as_str())
        );
    }
    let _ = writeln!(
        html,
        "<p>Artcast #{} by <a href=\"{}\" target=\"_blank\">@{}</a></p>",
        cast.id,
        escape_html(dashboard.owner_profile_url.as_str()),
        escape_html(&cast.farcaster_id)
    );
    let _ = writeln!(html, "<h3>{}</h3>", escape_html(&cast.name));
    let _ = writeln!(html, "<p>Created on {}</p>", dashboard.created_on());
    html.push_str("</section>\n<section class=\"stats\">\n");
    stat_card(
        &mut html,
        "Latest Prompt",
        &escape_html(cast.latest_prompt().unwrap_or("None!")),
    );
    stat_card(&mut html, "Total Remixes", &cast.num_total_derivatives.to_string());
    stat_card(&mut html, "Direct Remixes", &cast.num_derivatives.to_string());
    html.push_str("</section>\n<section class=\"panels\">\n");

    html.push_str("<div class=\"panel\">\n<h3>Recent History</h3>\n<ul>\n");
    if cast.version_history.is_empty() {
        html.push_str("<li>No remixes yet.</li>\n");
    }
    for version in &cast.version_history {
        let status = if version.image_path.is_some() {
            "ready"
        } else {
            "generating"
        };
        let _ = writeln!(
            html,
            "<li><a href=\"/cast/{id}\">#{id}</a> {} (branch {}, {status}) {}</li>",
            escape_html(&version.name),
            version.branch_num,
            frame_api::page::human_date(version.created_at),
            id = version.cast_id,
        );
    }
    html.push_str("</ul>\n</div>\n");

    html.push_str("<div class=\"panel\">\n<h3>Latest Prompts</h3>\n<ul>\n");
    if cast.latest_prompts.is_empty() {
        html.push_str("<li>No prompts yet.</li>\n");
    }
    for prompt in &cast.latest_prompts {
        let _ = writeln!(
            html,
            "<li><a href=\"/cast/{id}\">#{id}</a> {}</li>",
            escape_html(&prompt.prompt_input),
            id = prompt.cast_id,
        );
    }
    html.push_str("</ul>\n</div>\n</section>\n</main>\n");
    html
}

fn stat_card(html: &mut String, title: &str, value: &str) {
    let _ = writeln!(
        html,
        "<div class=\"card\"><h3>{title}</h3><div class=\"value\">{value}</div></div>"
    );
}

pub fn generating_svg() -> String {
    card_svg(&["Generating your Artcast...", "Press Refresh to check on it."])
}

pub fn error_svg(message: &str) -> String {
    let lines = wrap(message, 42);
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    card_svg(&lines)
}

fn card_svg(lines: &[&str]) -> String {
    let line_height = 64;
    let total = line_height * lines.len() as u32;
    let first_y = (CARD_HEIGHT.saturating_sub(total)) / 2 + line_height / 2;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CARD_WIDTH}\" height=\"{CARD_HEIGHT}\" viewBox=\"0 0 {CARD_WIDTH} {CARD_HEIGHT}\">"
    );
    let _ = writeln!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"#0f0f14\"/>"
    );
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(
            svg,
            "<text x=\"50%\" y=\"{}\" fill=\"#f4f4f5\" font-family=\"sans-serif\" font-size=\"44\" text-anchor=\"middle\">{}</text>",
            first_y + line_height * i as u32,
            escape_html(line)
        );
    }
    svg.push_str("</svg>\n");
    svg
}

/// Greedy word wrap on character counts.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn escape_html(raw: &str) -> String {
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

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
