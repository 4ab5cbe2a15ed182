//! Minimal tag-block helpers for scraping table-based school pages.
//!
//! Registration systems render their class pages as nested `<table>`
//! layouts with no stable ids, so providers walk `<tr>`, `<th>`, and `<td>`
//! blocks by tag name instead of relying on a full DOM.

/// A table row reduced to its label cell and data cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Row {
    /// Text of the first `<th>` in the row; empty if the row has none.
    pub label: String,
    /// Text of each `<td>` in the row, in order.
    pub cells: Vec<String>,
}

/// Finds the next `<tag ...>` at or after `from` in `lower`, returning the
/// offsets of the block start, the end of the opening tag, and the start of
/// the matching close tag.
///
/// `lower` must be the ASCII-lowercased form of the document, so offsets
/// are valid for both.
fn next_block(lower: &str, tag: &str, from: usize) -> Option<(usize, usize, usize)> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut search = from;
    loop {
        let start = lower.get(search..)?.find(&open)? + search;
        let after_name = start + open.len();
        let next = lower.get(after_name..)?.chars().next()?;
        if next != '>' && !next.is_ascii_whitespace() {
            // `<th` matched `<thead`, keep looking.
            search = after_name;
            continue;
        }
        let open_end = lower.get(start..)?.find('>')? + start + 1;
        let close_start = lower.get(open_end..)?.find(&close)? + open_end;
        return Some((start, open_end, close_start));
    }
}

/// Returns every `<tag>` block in `doc` as `(opening tag, inner html)` pairs.
///
/// Blocks are visited in document order, including blocks nested inside
/// other blocks of the same tag.
pub(crate) fn blocks<'a>(doc: &'a str, tag: &str) -> Vec<(&'a str, &'a str)> {
    let lower = doc.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some((start, open_end, close_start)) = next_block(&lower, tag, from) {
        if let (Some(opening), Some(inner)) =
            (doc.get(start..open_end), doc.get(open_end..close_start))
        {
            out.push((opening, inner));
        }
        from = open_end;
    }
    out
}

/// Strips tags and entities, collapsing whitespace.
pub(crate) fn text(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&normalize_entities(&out))
}

fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `doc` into rows with their label and cell texts.
pub(crate) fn rows(doc: &str) -> Vec<Row> {
    blocks(doc, "tr")
        .into_iter()
        .map(|(_, inner)| Row {
            label: blocks(inner, "th")
                .first()
                .map(|(_, th)| text(th))
                .unwrap_or_default(),
            cells: blocks(inner, "td")
                .into_iter()
                .map(|(_, td)| text(td))
                .collect(),
        })
        .collect()
}

/// Returns the text of the first `<th>` whose opening tag has `class_name`.
pub(crate) fn first_th_with_class(doc: &str, class_name: &str) -> Option<String> {
    let needle = class_name.to_ascii_lowercase();
    blocks(doc, "th")
        .into_iter()
        .find(|(opening, _)| opening.to_ascii_lowercase().contains(&needle))
        .map(|(_, inner)| text(inner))
}
