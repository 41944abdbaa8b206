//! SVG serialization of a scene

use crate::host::Size;
use crate::layout::Thumbnail;
use crate::scene::{ElementId, Scene};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Render the whole scene as a standalone SVG document
#[must_use]
pub fn render(scene: &Scene, size: Size) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size.width,
        h = size.height
    );
    write_element(scene, Scene::ROOT, &mut out);
    out.push_str("</svg>");
    out
}

/// Serialize the scene into a sidebar thumbnail
#[must_use]
pub fn thumbnail(scene: &Scene, size: Size) -> Thumbnail {
    let markup = render(scene, size);
    let digest = hex::encode(Sha256::digest(markup.as_bytes()));
    Thumbnail { markup, digest }
}

fn write_element(scene: &Scene, id: ElementId, out: &mut String) {
    let Some(element) = scene.get(id) else {
        return;
    };
    let tag = element.kind.tag();
    let _ = write!(out, "<{tag}");
    if !element.classes.is_empty() {
        let classes: Vec<&str> = element.classes.iter().map(String::as_str).collect();
        let _ = write!(out, r#" class="{}""#, escape(&classes.join(" ")));
    }
    for (name, value) in &element.attrs {
        let _ = write!(out, r#" {name}="{}""#, escape(&value.to_string()));
    }

    if element.children.is_empty() && element.text.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(text) = &element.text {
        out.push_str(&escape(text));
    }
    for child in &element.children {
        write_element(scene, *child, out);
    }
    let _ = write!(out, "</{tag}>");
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ElementKind;

    #[test]
    fn test_render_nested() {
        let mut scene = Scene::new();
        let group = scene.append_with_class(Scene::ROOT, ElementKind::Group, "axes").unwrap();
        let label = scene.append(group, ElementKind::Text).unwrap();
        scene.set_text(label, "Month <3>").unwrap();
        scene.set_attr(label, "x", 1.234).unwrap();

        let svg = render(&scene, Size::new(10.0, 20.0));
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"<g class="axes"><text x="1.23">Month &lt;3&gt;</text></g>"#));
        assert!(svg.ends_with("</g></svg>"));
    }

    #[test]
    fn test_thumbnail_digest_is_stable() {
        let scene = Scene::new();
        let a = thumbnail(&scene, Size::new(1.0, 1.0));
        let b = thumbnail(&scene, Size::new(1.0, 1.0));
        assert_eq!(a, b);
        assert_eq!(a.digest.len(), 64);
    }
}
