// ABOUTME: Heading-anchored sections: the features list and the key/value attributes table.
// ABOUTME: Both locate a labeled heading and read the element that follows it.

use indexmap::IndexMap;

use crate::dom::page::{next_sibling, query_all_in, query_first_in, text};
use crate::dom::LineMode;
use crate::error::FieldError;
use crate::extractors::FieldContext;

/// Feature bullet points listed after the features heading.
///
/// A list item that wraps paragraphs contributes one entry per paragraph,
/// otherwise the item's own text. Items containing nested items are skipped in
/// favour of their children.
pub fn extract_features(ctx: &FieldContext<'_>) -> Result<Vec<String>, FieldError> {
    let spec = match ctx.profile.features {
        Some(ref spec) => spec,
        None => return Ok(Vec::new()),
    };
    let heading = match ctx
        .page
        .heading_labeled(&ctx.profile.heading_selector, &spec.labels)?
    {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    let list = match next_sibling(heading) {
        Some(el) => el,
        None => return Ok(Vec::new()),
    };

    let mut features = Vec::new();
    for item in query_all_in(list, "li")? {
        if query_first_in(item, "li")?.is_some() {
            continue;
        }
        let paragraphs = query_all_in(item, "p")?;
        if paragraphs.is_empty() {
            push_non_empty(&mut features, text(item, LineMode::Keep));
        } else {
            for p in paragraphs {
                push_non_empty(&mut features, text(p, LineMode::Keep));
            }
        }
    }
    Ok(features)
}

/// Term/description pairs from the table after the attributes heading.
///
/// Reads the first `dl` inside the following element (or that element itself)
/// and pairs the i-th `dt` with the i-th `dd`. Later duplicates of a label
/// overwrite the value but keep the label's first position.
pub fn extract_attributes(
    ctx: &FieldContext<'_>,
) -> Result<IndexMap<String, String>, FieldError> {
    let mut attributes = IndexMap::new();
    let spec = match ctx.profile.attributes {
        Some(ref spec) => spec,
        None => return Ok(attributes),
    };
    let heading = match ctx
        .page
        .heading_labeled(&ctx.profile.heading_selector, &spec.labels)?
    {
        Some(h) => h,
        None => return Ok(attributes),
    };
    let container = match next_sibling(heading) {
        Some(el) => el,
        None => return Ok(attributes),
    };
    let table = query_first_in(container, "dl")?.unwrap_or(container);

    let terms = query_all_in(table, "dt")?;
    let descriptions = query_all_in(table, "dd")?;
    for (term, description) in terms.into_iter().zip(descriptions) {
        let label = text(term, LineMode::Keep);
        if label.is_empty() {
            continue;
        }
        attributes.insert(label, text(description, LineMode::Keep));
    }
    Ok(attributes)
}

fn push_non_empty(out: &mut Vec<String>, value: String) {
    if !value.is_empty() {
        out.push(value);
    }
}
