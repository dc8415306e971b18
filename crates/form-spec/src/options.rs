use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One choice offered by a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OptionPair {
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl OptionPair {
    pub fn new(label: impl Into<String>, value: Option<String>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Value a respondent submits for this option; the label stands in when unset.
    pub fn effective_value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.label)
    }
}

/// Options as written by a form author.
///
/// Free text holds one option per line, either `label|value` or a bare
/// `label`. A structured list is taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OptionsInput {
    Text(String),
    Structured(Vec<OptionPair>),
}

impl OptionsInput {
    /// Produce the structured option list, parsing free text when needed.
    pub fn normalize(&self) -> Vec<OptionPair> {
        match self {
            OptionsInput::Text(raw) => parse_options(raw),
            OptionsInput::Structured(options) => options.clone(),
        }
    }
}

/// Parse free-text options into label/value pairs, preserving line order.
///
/// Blank lines are dropped. A line is split on its first `|` only, so any
/// further `|` characters stay in the value.
pub fn parse_options(raw: &str) -> Vec<OptionPair> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> OptionPair {
    let Some((label, value)) = line.split_once('|') else {
        return OptionPair::new(line, None);
    };
    let label = label.trim();
    let value = value.trim();

    match (label.is_empty(), value.is_empty()) {
        (true, true) => OptionPair::new(line, None),
        (false, true) => OptionPair::new(label, None),
        (true, false) => OptionPair::new(value, Some(value.to_string())),
        (false, false) => OptionPair::new(label, Some(value.to_string())),
    }
}

/// `(label, value)` pairs ready for a choice widget.
pub fn options_for_select(options: &[OptionPair]) -> Vec<(&str, &str)> {
    options
        .iter()
        .map(|option| (option.label.as_str(), option.effective_value()))
        .collect()
}
