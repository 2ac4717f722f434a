//! On-the-fly placeholder images for missing sentinel defaults.

/// Canvas width of generated placeholders
pub const PLACEHOLDER_WIDTH: u32 = 800;
/// Canvas height of generated placeholders
pub const PLACEHOLDER_HEIGHT: u32 = 600;

pub const SVG_MIME_TYPE: &str = "image/svg+xml";

/// Render a placeholder SVG with a centred caption
pub fn placeholder_svg(caption: &str) -> String {
    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
            r##"<rect width="100%" height="100%" fill="#e9ecef"/>"##,
            r##"<text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" "##,
            r##"font-family="Arial, sans-serif" font-size="36" fill="#6c757d">{caption}</text>"##,
            "</svg>"
        ),
        w = PLACEHOLDER_WIDTH,
        h = PLACEHOLDER_HEIGHT,
        caption = escape_xml(caption),
    )
}

/// Caption for a default image name: `default-project.jpg` → `Project Image`
pub fn caption_for(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
    let subject = stem.strip_prefix("default-").unwrap_or(stem);

    let words: Vec<String> = subject
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        "Image".to_string()
    } else {
        format!("{} Image", words.join(" "))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
