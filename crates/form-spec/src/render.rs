use serde_json::{Value, json};

use crate::options::options_for_select;
use crate::spec::{Field, FieldType, Response};
use crate::view::{FormDetail, FormSummary, ResponseDetail};

fn field_json(field: &Field) -> Value {
    let mut value = json!({
        "id": field.id,
        "label": field.label,
        "type": field.field_type().as_str(),
        "position": field.position,
    });
    if field.field_type() == FieldType::Select {
        value["choices"] = Value::Array(
            options_for_select(field.options())
                .into_iter()
                .map(|(label, value)| json!({ "label": label, "value": value }))
                .collect(),
        );
    }
    value
}

/// Render a form as the structure a fill-in screen needs.
pub fn render_form_json(detail: &FormDetail) -> Value {
    json!({
        "id": detail.form.id,
        "title": detail.form.title,
        "description": detail.form.description,
        "fields": detail.fields.iter().map(field_json).collect::<Vec<_>>(),
    })
}

pub fn render_forms_text(forms: &[FormSummary]) -> String {
    if forms.is_empty() {
        return "No forms yet.".to_string();
    }
    forms
        .iter()
        .map(|form| {
            format!(
                "#{} {} ({} fields, {} responses)",
                form.id, form.title, form.field_count, form.response_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a form and its fields as human-friendly text.
pub fn render_form_text(detail: &FormDetail) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} (#{})", detail.form.title, detail.form.id));
    if let Some(description) = &detail.form.description {
        lines.push(description.clone());
    }
    if detail.fields.is_empty() {
        lines.push("No fields.".to_string());
    }
    for field in &detail.fields {
        lines.push(format!(
            "  [{}] {} ({}, field #{})",
            field.position,
            field.label,
            field.field_type(),
            field.id
        ));
        for (label, value) in options_for_select(field.options()) {
            if label == value {
                lines.push(format!("      - {label}"));
            } else {
                lines.push(format!("      - {label} = {value}"));
            }
        }
    }
    lines.join("\n")
}

pub fn render_responses_text(title: &str, responses: &[&Response]) -> String {
    let mut lines = vec![format!("Responses for {title}: {}", responses.len())];
    lines.extend(responses.iter().map(|response| {
        format!(
            "  #{} submitted {}",
            response.id,
            response.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }));
    lines.join("\n")
}

/// Render a response with each answer labelled by its field.
pub fn render_response_text(detail: &ResponseDetail) -> String {
    let mut lines = vec![format!(
        "Response #{} to {} ({})",
        detail.response.id,
        detail.form_title,
        detail.response.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];
    for answer in &detail.answers {
        let shown = answer
            .options
            .iter()
            .find(|option| option.effective_value() == answer.value)
            .map(|option| option.label.as_str())
            .unwrap_or(answer.value.as_str());
        lines.push(format!("  {}: {}", answer.label, shown));
    }
    lines.join("\n")
}
