//! Structural SVG optimization
//!
//! Text-level passes over vector output: dead-markup removal, dimension →
//! viewBox normalization, and id deduplication. Passes repeat until the
//! output is stable or the pass ceiling is hit; optimizing already-optimized
//! output changes nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Ceiling on optimization passes per document.
pub const MAX_PASSES: usize = 3;

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"));
static METADATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<metadata\b[^>]*>.*?</metadata>|<metadata\b[^>]*/>")
        .expect("valid metadata pattern")
});
static DESC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<desc\b[^>]*>.*?</desc>|<desc\b[^>]*/>").expect("valid desc pattern")
});
static EMPTY_DEFS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<defs\b[^>]*>\s*</defs>|<defs\s*/>").expect("valid defs pattern")
});
static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\n").expect("valid blank-line pattern"));
static SVG_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<svg\b[^>]*>").expect("valid svg-open pattern"));
static WIDTH_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+width="([0-9]+(?:\.[0-9]+)?)(?:px)?""#).expect("valid width pattern")
});
static HEIGHT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+height="([0-9]+(?:\.[0-9]+)?)(?:px)?""#).expect("valid height pattern")
});
static ID_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bid="([^"]*)""#).expect("valid id pattern"));

/// Optimize SVG text until stable or the pass ceiling is reached.
pub fn optimize(input: &str) -> String {
    let mut current = input.trim().to_string();

    for _ in 0..MAX_PASSES {
        let next = optimize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    current
}

fn optimize_pass(input: &str) -> String {
    let text = strip_dead_markup(input);
    let text = normalize_dimensions(&text);
    dedupe_ids(&text)
}

/// Remove comments, `<metadata>`, `<desc>`, empty `<defs>`, and the blank
/// lines they leave behind.
fn strip_dead_markup(input: &str) -> String {
    let text = COMMENT.replace_all(input, "");
    let text = METADATA.replace_all(&text, "");
    let text = DESC.replace_all(&text, "");
    let text = EMPTY_DEFS.replace_all(&text, "");
    BLANK_LINES.replace_all(&text, "").trim().to_string()
}

/// Fold numeric `width`/`height` on the root element into a `viewBox`.
///
/// Documents that already carry a viewBox are left untouched.
fn normalize_dimensions(input: &str) -> String {
    let Some(open_match) = SVG_OPEN.find(input) else {
        return input.to_string();
    };
    let open = open_match.as_str();
    if open.contains("viewBox") {
        return input.to_string();
    }

    let (Some(width), Some(height)) = (WIDTH_ATTR.captures(open), HEIGHT_ATTR.captures(open))
    else {
        return input.to_string();
    };
    let view_box = format!(r#" viewBox="0 0 {} {}""#, &width[1], &height[1]);

    let stripped = WIDTH_ATTR.replace(open, "");
    let stripped = HEIGHT_ATTR.replace(&stripped, "").into_owned();

    // Insert the viewBox just before the closing bracket of the open tag
    let new_open = match stripped.rfind('>') {
        Some(pos) if stripped[..pos].ends_with('/') => {
            format!("{}{}{}", &stripped[..pos - 1], view_box, &stripped[pos - 1..])
        }
        Some(pos) => format!("{}{}{}", &stripped[..pos], view_box, &stripped[pos..]),
        None => stripped,
    };

    input.replacen(open, &new_open, 1)
}

/// Rename duplicate `id` attributes; the first occurrence wins.
fn dedupe_ids(input: &str) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in ID_ATTR.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        let id = &caps[1];

        if seen.insert(id.to_string()) {
            continue;
        }

        let mut n = 2;
        let fresh = loop {
            let candidate = format!("{id}-{n}");
            if !seen.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        out.push_str(&input[last..whole.start()]);
        out.push_str(&format!(r#"id="{fresh}""#));
        last = whole.end();
        seen.insert(fresh);
    }

    out.push_str(&input[last..]);
    out
}
