//! Icon markup normalization.
//!
//! Remote icon SVGs arrive with inconsistent framing: stray root attributes,
//! layout-affecting inline styles, and a full-bleed background `<rect>` that
//! some icon packs ship as a canvas frame. Normalization rewrites the root
//! element's presentation attributes and strips those frame rects so the
//! glyph inherits the surrounding slide styling.
//!
//! Everything here is best-effort string surgery over well-formed markup.
//! Markup the scanner cannot understand is returned unchanged; a broken
//! icon is a rendering blemish, never an error.

use serde::{Deserialize, Serialize};

/// Rendering options for a remote icon. Also part of the cache key: two
/// loads of one reference with different styling are distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconStyle {
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub class: Option<String>,
}

/// Inline resets applied to the root element so the glyph sits flush in
/// the surrounding flow. Appended after any existing inline style, so
/// these declarations win per CSS ordering.
const ROOT_STYLE_RESETS: &str = "outline:none;border:none;margin:0;padding:0;display:inline-block;vertical-align:middle;overflow:visible;position:relative";

/// Relative tolerance when testing whether a rect covers the viewBox.
const FRAME_COVER_TOLERANCE: f32 = 0.02;

/// Normalize remote icon markup for inline display.
///
/// Returns only the `<svg>` element (leading XML prolog or comments are
/// dropped), with `class`/`stroke`/`fill` overridden when provided and
/// direct-child frame rects removed. Input without a recognizable root
/// element comes back unchanged.
pub fn normalize_icon_markup(markup: &str, style: &IconStyle) -> String {
    let Some(root) = find_svg_root(markup) else {
        return markup.to_string();
    };

    let mut attrs = root.attrs.to_string();

    let merged_style = match attr_value(&attrs, "style") {
        Some(existing) if !existing.is_empty() => format!("{existing};{ROOT_STYLE_RESETS}"),
        _ => ROOT_STYLE_RESETS.to_string(),
    };
    set_attr(&mut attrs, "style", &merged_style);

    // Only provided options override; never clobber inner shapes' defaults.
    if let Some(class) = &style.class {
        set_attr(&mut attrs, "class", class);
    }
    if let Some(stroke) = &style.stroke {
        set_attr(&mut attrs, "stroke", stroke);
    }
    if let Some(fill) = &style.fill {
        set_attr(&mut attrs, "fill", fill);
    }

    let viewbox = attr_value(&attrs, "viewBox").and_then(parse_viewbox);
    let inner = strip_frame_rects(root.inner, viewbox);

    format!("<svg{attrs}>{inner}</svg>")
}

/// The fixed fallback glyph shown when a reference is missing, is not an
/// SVG, or fails to load.
pub fn placeholder_glyph(style: &IconStyle) -> String {
    let stroke = style.stroke.as_deref().unwrap_or("currentColor");
    let fill = style.fill.as_deref().unwrap_or("none");
    let class = style
        .class
        .as_deref()
        .map(|c| format!(" class=\"{c}\""))
        .unwrap_or_default();
    format!(
        "<svg{class} xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\" \
         stroke=\"{stroke}\" fill=\"{fill}\" stroke-width=\"2\" stroke-linecap=\"round\" \
         stroke-linejoin=\"round\"><circle cx=\"12\" cy=\"12\" r=\"10\" fill=\"currentColor\" \
         opacity=\"0.12\"></circle><path d=\"M8 12l3 3 5-6\" fill=\"none\"></path></svg>"
    )
}

// ─── Root element scanning ──────────────────────────────────────────────

struct SvgRoot<'a> {
    /// Raw attribute text of the open tag (leading space included).
    attrs: &'a str,
    /// Markup between the open tag and the final `</svg>`.
    inner: &'a str,
}

fn find_svg_root(markup: &str) -> Option<SvgRoot<'_>> {
    // First `<svg` followed by whitespace, `>`, or `/`.
    let mut search = 0;
    let open = loop {
        let at = search + markup[search..].find("<svg")?;
        match markup[at + 4..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => break at,
            None => return None,
            _ => search = at + 4,
        }
    };

    let tag_end = open + find_tag_end(&markup[open..])?;
    let tag = &markup[open..=tag_end];

    if tag.ends_with("/>") {
        return Some(SvgRoot {
            attrs: &tag[4..tag.len() - 2],
            inner: "",
        });
    }

    let close = markup.rfind("</svg>")?;
    if close <= tag_end {
        return None;
    }

    Some(SvgRoot {
        attrs: &tag[4..tag.len() - 1],
        inner: &markup[tag_end + 1..close],
    })
}

/// Byte offset of the open tag's `>` within `tag_start`, quote-aware.
fn find_tag_end(from_tag: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in from_tag.char_indices() {
        match (quote, c) {
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

// ─── Attribute surgery ──────────────────────────────────────────────────

/// Find `name="value"` (or single-quoted) in raw attribute text, returning
/// the value. A match must start at a word boundary so `stroke` does not
/// match `stroke-width`.
fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let range = attr_range(attrs, name)?;
    let piece = &attrs[range.0..range.1];
    let eq = piece.find('=')?;
    let rest = piece[eq + 1..].trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &rest[1..rest.len() - 1];
    Some(value)
}

/// Byte range of a whole `name="value"` occurrence in `attrs`.
fn attr_range(attrs: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = attrs.as_bytes();
    let mut search = 0;
    loop {
        let at = search + attrs[search..].find(name)?;
        let before_ok = at == 0 || bytes[at - 1].is_ascii_whitespace();
        let after = &attrs[at + name.len()..];
        let after_trimmed = after.trim_start();
        if before_ok && after_trimmed.starts_with('=') {
            let eq_rel = after.len() - after_trimmed.len();
            let value_part = after_trimmed[1..].trim_start();
            let quote = value_part.chars().next()?;
            if quote != '"' && quote != '\'' {
                return None;
            }
            let value_start =
                at + name.len() + eq_rel + 1 + (after_trimmed[1..].len() - value_part.len()) + 1;
            let value_len = attrs[value_start..].find(quote)?;
            return Some((at, value_start + value_len + 1));
        }
        search = at + name.len();
    }
}

/// Replace or append `name="value"` in raw attribute text.
fn set_attr(attrs: &mut String, name: &str, value: &str) {
    if let Some((start, end)) = attr_range(attrs, name) {
        attrs.replace_range(start..end, &format!("{name}=\"{value}\""));
    } else {
        attrs.push_str(&format!(" {name}=\"{value}\""));
    }
}

// ─── Frame rect stripping ───────────────────────────────────────────────

fn parse_viewbox(value: &str) -> Option<[f32; 4]> {
    let mut parts = value.split_whitespace().map(|p| p.parse::<f32>());
    let vb = [
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
    ];
    Some(vb)
}

/// Remove direct-child `<rect>` elements that look like canvas frames:
/// no fill and either exactly 100%×100% at the origin or covering the
/// viewBox within tolerance. Deeper rects are real shapes and are kept.
fn strip_frame_rects(inner: &str, viewbox: Option<[f32; 4]>) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut depth: i32 = 0;
    let mut rest = inner;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        rest = &rest[lt..];

        // Comments pass through untouched.
        if rest.starts_with("<!--") {
            let end = match rest.find("-->") {
                Some(e) => e + 3,
                None => rest.len(),
            };
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        let Some(tag_end) = find_tag_end(rest) else {
            // Unterminated tag: give up on surgery, emit the remainder.
            out.push_str(rest);
            return out;
        };
        let tag = &rest[..=tag_end];
        rest = &rest[tag_end + 1..];

        if tag.starts_with("</") {
            depth -= 1;
            out.push_str(tag);
            continue;
        }

        let self_closing = tag.ends_with("/>");
        let name_end = tag[1..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .map(|n| n + 1)
            .unwrap_or(tag.len());
        let name = &tag[1..name_end];

        if depth == 0 && name == "rect" && is_frame_rect(tag, viewbox) {
            if !self_closing {
                // Drop the matching close tag too.
                if let Some(close) = rest.find("</rect>") {
                    rest = &rest[close + "</rect>".len()..];
                }
            }
            continue;
        }

        out.push_str(tag);
        if !self_closing {
            depth += 1;
        }
    }

    out.push_str(rest);
    out
}

fn is_frame_rect(tag: &str, viewbox: Option<[f32; 4]>) -> bool {
    let attrs = &tag[5..tag.len() - 1]; // inside "<rect" .. ">"
    let x = attr_value(attrs, "x").unwrap_or("0");
    let y = attr_value(attrs, "y").unwrap_or("0");
    let w = attr_value(attrs, "width").unwrap_or("");
    let h = attr_value(attrs, "height").unwrap_or("");
    let fill = attr_value(attrs, "fill");

    let no_fill = matches!(fill, None | Some("none") | Some("transparent"));
    if !no_fill {
        return false;
    }

    let at_origin = |v: &str| v == "0" || v == "0%";
    if w == "100%" && h == "100%" && at_origin(x) && at_origin(y) {
        return true;
    }

    let Some([vx, vy, vw, vh]) = viewbox else {
        return false;
    };
    if vw <= 0.0 || vh <= 0.0 {
        return false;
    }
    let (Ok(x), Ok(y), Ok(w), Ok(h)) = (
        x.parse::<f32>(),
        y.parse::<f32>(),
        w.parse::<f32>(),
        h.parse::<f32>(),
    ) else {
        return false;
    };

    let tol_w = (vw * FRAME_COVER_TOLERANCE).max(1.0);
    let tol_h = (vh * FRAME_COVER_TOLERANCE).max(1.0);
    (w - vw).abs() <= tol_w && (h - vh).abs() <= tol_h && (x - vx).abs() <= tol_w && (y - vy).abs() <= tol_h
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style(stroke: &str, class: &str) -> IconStyle {
        IconStyle {
            stroke: Some(stroke.to_string()),
            fill: None,
            class: Some(class.to_string()),
        }
    }

    #[test]
    fn injects_root_attributes() {
        let out = normalize_icon_markup(
            "<svg viewBox=\"0 0 24 24\"><path d=\"M0 0h24v24\"/></svg>",
            &style("#1a1a1a", "icon-sm"),
        );
        assert!(out.contains("class=\"icon-sm\""));
        assert!(out.contains("stroke=\"#1a1a1a\""));
        assert!(out.contains("style=\""));
        assert!(out.contains("<path d=\"M0 0h24v24\"/>"));
    }

    #[test]
    fn replaces_existing_class_and_keeps_others() {
        let out = normalize_icon_markup(
            "<svg class=\"old\" viewBox=\"0 0 24 24\" stroke-width=\"2\"></svg>",
            &style("red", "new"),
        );
        assert!(out.contains("class=\"new\""));
        assert!(!out.contains("class=\"old\""));
        // `stroke` override must not clobber `stroke-width`.
        assert!(out.contains("stroke-width=\"2\""));
        assert!(out.contains("stroke=\"red\""));
    }

    #[test]
    fn drops_percent_frame_rect() {
        let out = normalize_icon_markup(
            "<svg viewBox=\"0 0 24 24\">\
             <rect width=\"100%\" height=\"100%\" fill=\"none\"/>\
             <path d=\"M2 2l20 20\"/></svg>",
            &IconStyle::default(),
        );
        assert!(!out.contains("<rect"));
        assert!(out.contains("<path"));
    }

    #[test]
    fn drops_viewbox_covering_frame_rect() {
        let out = normalize_icon_markup(
            "<svg viewBox=\"0 0 48 48\">\
             <rect x=\"0\" y=\"0\" width=\"47.6\" height=\"48\" fill=\"transparent\"></rect>\
             <circle cx=\"24\" cy=\"24\" r=\"10\"/></svg>",
            &IconStyle::default(),
        );
        assert!(!out.contains("<rect"));
        assert!(out.contains("<circle"));
    }

    #[test]
    fn keeps_filled_and_small_rects() {
        let out = normalize_icon_markup(
            "<svg viewBox=\"0 0 24 24\">\
             <rect width=\"100%\" height=\"100%\" fill=\"#eee\"/>\
             <rect x=\"4\" y=\"4\" width=\"8\" height=\"8\" fill=\"none\"/></svg>",
            &IconStyle::default(),
        );
        assert_eq!(out.matches("<rect").count(), 2);
    }

    #[test]
    fn keeps_nested_frame_like_rects() {
        let out = normalize_icon_markup(
            "<svg viewBox=\"0 0 24 24\"><g>\
             <rect width=\"100%\" height=\"100%\" fill=\"none\"/></g></svg>",
            &IconStyle::default(),
        );
        assert!(out.contains("<rect"));
    }

    #[test]
    fn drops_prolog_and_keeps_only_the_svg_element() {
        let out = normalize_icon_markup(
            "<?xml version=\"1.0\"?><svg viewBox=\"0 0 24 24\"></svg>",
            &IconStyle::default(),
        );
        assert!(out.starts_with("<svg"));
        assert!(out.ends_with("</svg>"));
    }

    #[test]
    fn markup_without_svg_root_is_unchanged() {
        let not_svg = "<div>definitely not an icon</div>";
        assert_eq!(normalize_icon_markup(not_svg, &IconStyle::default()), not_svg);
    }

    #[test]
    fn placeholder_glyph_carries_options() {
        let glyph = placeholder_glyph(&style("blue", "fallback"));
        assert!(glyph.contains("class=\"fallback\""));
        assert!(glyph.contains("stroke=\"blue\""));
        assert!(glyph.contains("<circle"));
    }
}
