use super::*;
use shared::{
    domain::CastId,
    frame_state::{FrameState, Stage},
    protocol::FrameButton,
};

fn public() -> Url {
    Url::parse("https://frames.example.com").expect("url")
}

fn view_page() -> FramePage {
    FramePage {
        pathname: "/cast/5".to_string(),
        state: FrameState {
            stage: Stage::View,
            total_button_presses: 1,
            input_text: String::new(),
            current_cast_id: CastId(5),
            error: None,
        },
        image: FrameImage::Cast {
            url: Url::parse("https://cdn.example.com/artcast_images/a.png").expect("url"),
            kind: CardKind::Root,
        },
        input_placeholder: Some("add a prompt...".to_string()),
        buttons: vec![
            FrameButton::link("Stats", "https://artcast.ai/cast/5"),
            FrameButton::post("Create"),
        ],
        dashboard: None,
    }
}

#[test]
fn frame_document_carries_frame_meta_tags() {
    let html = frame_document(&view_page(), &public()).expect("html");

    assert!(html.contains(r#"<meta property="fc:frame" content="vNext">"#));
    assert!(html.contains(
        r#"<meta property="fc:frame:image" content="https://cdn.example.com/artcast_images/a.png">"#
    ));
    assert!(html.contains(
        r#"<meta property="fc:frame:post_url" content="https://frames.example.com/cast/5">"#
    ));
    assert!(html.contains(r#"<meta property="fc:frame:input:text" content="add a prompt...">"#));
    assert!(html.contains(r#"<meta property="fc:frame:button:1" content="Stats">"#));
    assert!(html.contains(r#"<meta property="fc:frame:button:1:action" content="link">"#));
    assert!(html.contains(
        r#"<meta property="fc:frame:button:1:target" content="https://artcast.ai/cast/5">"#
    ));
    assert!(html.contains(r#"<meta property="fc:frame:button:2" content="Create">"#));
    assert!(html.contains(r#"<meta property="fc:frame:button:2:action" content="post">"#));
    assert!(!html.contains("fc:frame:button:3"));
}

#[test]
fn state_round_trips_through_escaped_meta() {
    let html = frame_document(&view_page(), &public()).expect("html");
    let marker = r#"<meta property="fc:frame:state" content=""#;
    let start = html.find(marker).expect("state tag") + marker.len();
    let end = start + html[start..].find('"').expect("end quote");
    let escaped = &html[start..end];
    assert!(escaped.contains("&quot;stage&quot;"));

    let raw = escaped.replace("&quot;", "\"").replace("&amp;", "&");
    let state: FrameState = serde_json::from_str(&raw).expect("state");
    assert_eq!(state, view_page().state);
}

#[test]
fn placeholder_images_point_at_this_server() {
    assert_eq!(
        image_url(&FrameImage::Generating, &public()),
        "https://frames.example.com/frames/images/generating.svg"
    );
    assert_eq!(
        image_url(
            &FrameImage::Error {
                message: "You need a prompt & more".to_string()
            },
            &public()
        ),
        "https://frames.example.com/frames/images/error.svg?message=You+need+a+prompt+%26+more"
    );
}

#[test]
fn escapes_markup() {
    assert_eq!(
        escape_html(r#"<b>"hi" & 'bye'</b>"#),
        "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;"
    );
}

#[test]
fn error_svg_wraps_and_escapes_message() {
    let svg = error_svg("You need to specify a prompt to continue. <script>");
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("&lt;script&gt;"));
    assert_eq!(svg.matches("<text").count(), 2);
}

#[test]
fn wrap_keeps_single_empty_line() {
    assert_eq!(wrap("", 10), vec![String::new()]);
    assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
}
