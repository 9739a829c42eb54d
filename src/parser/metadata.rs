use chrono::NaiveDate;
use tracing::warn;

use super::render::collapse_whitespace;
use super::xml::Element;
use crate::document::{DocumentMetadata, HeaderAttributes};

const UNTITLED: &str = "Untitled Document";

/// Read the document header. Missing fields degrade to defaults, never to errors.
pub fn extract(root: &Element) -> DocumentMetadata {
    let attributes = extract_attributes(root);

    let document_id = root
        .child("id")
        .and_then(|id| non_blank(id.attr("root")))
        .or_else(|| attributes.set_id.clone())
        .unwrap_or_else(|| {
            warn!("document has neither id nor setId");
            String::new()
        });

    let revision_number = root
        .child("versionNumber")
        .and_then(|v| v.attr("value"))
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1);

    let effective_date = root
        .child("effectiveTime")
        .and_then(|t| t.attr("value"))
        .and_then(parse_effective_date);

    let title = root
        .child("title")
        .map(|t| collapse_whitespace(&t.text_content()))
        .filter(|t| !t.is_empty())
        .or_else(|| attributes.product_name.clone())
        .unwrap_or_else(|| UNTITLED.to_string());

    let issuer = root
        .child_path(&["author", "assignedEntity", "representedOrganization", "name"])
        .map(|n| collapse_whitespace(&n.text_content()))
        .unwrap_or_default();
    if issuer.is_empty() {
        warn!(document_id = %document_id, "document has no issuing organization");
    }

    DocumentMetadata {
        document_id,
        revision_number,
        effective_date,
        title,
        issuer,
        attributes,
    }
}

fn extract_attributes(root: &Element) -> HeaderAttributes {
    let code = root.child("code");
    let product = root
        .find_all("manufacturedProduct")
        .into_iter()
        .chain(root.find_all("manufacturedMedicine"))
        .find(|p| p.child("name").is_some());

    let mut dosage_forms = Vec::new();
    for form in root.find_all("formCode") {
        if let Some(name) = non_blank(form.attr("displayName")) {
            push_unique(&mut dosage_forms, name);
        }
    }

    let mut strengths = Vec::new();
    for ingredient in root
        .find_all("ingredient")
        .into_iter()
        .filter(|i| i.attr("classCode").is_some_and(|c| c.starts_with("ACT")))
        .chain(root.find_all("activeIngredient"))
    {
        if let Some(strength) = ingredient
            .child_path(&["quantity", "numerator"])
            .and_then(format_quantity)
        {
            push_unique(&mut strengths, strength);
        }
    }

    HeaderAttributes {
        set_id: root.child("setId").and_then(|s| non_blank(s.attr("root"))),
        document_type_code: code.and_then(|c| non_blank(c.attr("code"))),
        document_type: code.and_then(|c| non_blank(c.attr("displayName"))),
        product_name: product
            .and_then(|p| p.child("name"))
            .map(|n| collapse_whitespace(&n.text_content()))
            .filter(|n| !n.is_empty()),
        generic_name: root
            .find("genericMedicine")
            .and_then(|g| g.child("name"))
            .map(|n| collapse_whitespace(&n.text_content()))
            .filter(|n| !n.is_empty()),
        dosage_forms,
        strengths,
    }
}

/// `YYYYMMDD` with an optional time suffix.
fn parse_effective_date(value: &str) -> Option<NaiveDate> {
    let digits = value.trim().get(..8)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

fn format_quantity(numerator: &Element) -> Option<String> {
    let value = non_blank(numerator.attr("value"))?;
    match non_blank(numerator.attr("unit")).filter(|u| u != "1") {
        Some(unit) => Some(format!("{} {}", value, unit)),
        None => Some(value),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
