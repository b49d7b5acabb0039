//! Style rules and the editable rule sheet.

use std::fs;
use std::path::Path;

use facet_raster::{Color, LineCap, LineJoin, StrokeStyle};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StyleError;
use crate::value::{Filter, Properties, StyleValue, truthy};

/// Rules for this source paint the tile outline beneath the data.
pub const BACKGROUND_SOURCE: &str = "bg";

pub const DEFAULT_STYLE: &str = r##"[{"source":"bg","fill":"#ffffff"}]"##;

const DEFAULT_MARK_SIZE: f64 = 10.0;
const DEFAULT_FONT_SIZE: f64 = 10.0;

/// How one layer is drawn.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleRule {
    pub source: String,
    pub stroke: Option<StyleValue>,
    pub fill: Option<StyleValue>,
    #[serde(rename = "stroke-width")]
    pub stroke_width: Option<StyleValue>,
    #[serde(rename = "stroke-opacity")]
    pub stroke_opacity: Option<f64>,
    #[serde(rename = "fill-opacity")]
    pub fill_opacity: Option<f64>,
    #[serde(rename = "stroke-dasharray")]
    pub dasharray: Option<String>,
    #[serde(rename = "stroke-linecap")]
    pub linecap: Option<StyleValue>,
    #[serde(rename = "stroke-linejoin")]
    pub linejoin: Option<StyleValue>,
    pub filter: Option<Filter>,
    /// Draw points as this mark instead of a label.
    pub mark: Option<String>,
    pub size: Option<StyleValue>,
    /// Label template with `${key}` or `<%= key %>` placeholders.
    pub label: Option<String>,
    pub font: Option<StyleValue>,
    /// Animated overlays are not composited.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl StyleRule {
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.source == BACKGROUND_SOURCE
    }

    #[must_use]
    pub fn is_overlay(&self) -> bool {
        self.kind.as_deref() == Some("wind")
    }

    #[must_use]
    pub fn accepts(&self, properties: &Properties) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(properties))
    }

    #[must_use]
    pub fn has_stroke(&self) -> bool {
        is_set(self.stroke.as_ref())
    }

    #[must_use]
    pub fn has_fill(&self) -> bool {
        is_set(self.fill.as_ref())
    }

    #[must_use]
    pub fn stroke_color(&self, properties: &Properties) -> Color {
        paint(self.stroke.as_ref(), self.stroke_opacity, properties)
    }

    #[must_use]
    pub fn fill_color(&self, properties: &Properties) -> Color {
        paint(self.fill.as_ref(), self.fill_opacity, properties)
    }

    #[must_use]
    pub fn stroke_style(&self, properties: &Properties) -> StrokeStyle {
        let name = |value: &Option<StyleValue>| {
            value
                .as_ref()
                .and_then(|v| v.as_str(properties))
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        StrokeStyle {
            width: self
                .stroke_width
                .as_ref()
                .and_then(|w| w.as_f64(properties))
                .filter(|w| *w > 0.0)
                .unwrap_or(1.0),
            cap: name(&self.linecap).map_or(LineCap::Round, |n| LineCap::from_name(&n)),
            join: name(&self.linejoin).map_or(LineJoin::Round, |n| LineJoin::from_name(&n)),
            dash: self.dasharray.as_deref().map(parse_dash).unwrap_or_default(),
            ..StrokeStyle::default()
        }
    }

    /// The mark name with stray quotes removed.
    #[must_use]
    pub fn mark(&self) -> Option<&str> {
        self.mark
            .as_deref()
            .map(|m| m.trim_matches('"'))
            .filter(|m| !m.is_empty())
    }

    #[must_use]
    pub fn mark_size(&self, properties: &Properties) -> f64 {
        self.size
            .as_ref()
            .and_then(|s| s.as_f64(properties))
            .filter(|s| *s > 0.0)
            .unwrap_or(DEFAULT_MARK_SIZE)
    }

    /// Label pixel size from a CSS-like font such as `14px sans-serif`.
    #[must_use]
    pub fn font_size(&self, properties: &Properties) -> f64 {
        self.font
            .as_ref()
            .map(|f| f.resolve(properties))
            .and_then(|font| match font {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s
                    .split_whitespace()
                    .find_map(|part| part.strip_suffix("px").and_then(|n| n.parse().ok())),
                _ => None,
            })
            .filter(|s: &f64| *s > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    #[must_use]
    pub fn label_text(&self, properties: &Properties) -> Option<String> {
        self.label.as_deref().map(|t| expand_template(t, properties))
    }
}

/// Empty strings and zeros count as unset.
fn is_set(value: Option<&StyleValue>) -> bool {
    value.is_some_and(|v| truthy(&v.0))
}

fn paint(value: Option<&StyleValue>, opacity: Option<f64>, properties: &Properties) -> Color {
    let color = value
        .and_then(|v| v.as_str(properties))
        .and_then(|s| s.parse::<Color>().ok())
        .unwrap_or(Color::DEFAULT_INK);
    match opacity {
        Some(o) if o != 0.0 => color.with_opacity(o),
        _ => color,
    }
}

fn parse_dash(pattern: &str) -> Vec<f64> {
    pattern
        .split([' ', ','])
        .filter_map(|part| part.trim().parse::<f64>().ok())
        .filter(|d| *d != 0.0 && d.is_finite())
        .collect()
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Substitute `${key}` and `<%= key %>` placeholders.
fn expand_template(template: &str, properties: &Properties) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = [("${", "}"), ("<%=", "%>")]
            .into_iter()
            .filter_map(|(open, close)| rest.find(open).map(|at| (at, open, close)))
            .min_by_key(|(at, _, _)| *at);
        let Some((at, open, close)) = next else {
            out.push_str(rest);
            return out;
        };
        let after = &rest[at + open.len()..];
        let Some(end) = after.find(close) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..at]);
        let key = after[..end].trim();
        if let Some(value) = properties.get(key) {
            out.push_str(&property_text(value));
        }
        rest = &after[end + close.len()..];
    }
}

/// The active rule set.
///
/// Edits that fail to parse leave the previous rules in place.
#[derive(Clone, Debug)]
pub struct StyleSheet {
    code: String,
    rules: Vec<StyleRule>,
    revision: u64,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            code: DEFAULT_STYLE.to_string(),
            rules: vec![StyleRule {
                source: BACKGROUND_SOURCE.to_string(),
                fill: Some(StyleValue(Value::String("#ffffff".into()))),
                ..StyleRule::default()
            }],
            revision: 0,
        }
    }
}

impl StyleSheet {
    /// Parse a rule array; non-object entries are ignored.
    pub fn parse(code: &str) -> Result<Vec<StyleRule>, StyleError> {
        let Value::Array(items) = serde_json::from_str::<Value>(code)? else {
            return Err(StyleError::NotAnArray);
        };
        let rules = items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| match serde_json::from_value::<StyleRule>(item) {
                Ok(rule) => Some(rule),
                Err(error) => {
                    warn!(%error, "style rule skipped");
                    None
                }
            })
            .collect();
        Ok(rules)
    }

    /// Replace the rules with `code`, keeping the old ones on error.
    pub fn update(&mut self, code: &str) -> Result<(), StyleError> {
        self.code = code.to_string();
        let rules = Self::parse(code)?;
        debug!(rules = rules.len(), "style updated");
        self.rules = rules;
        self.revision += 1;
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<(), StyleError> {
        let code = fs::read_to_string(path).map_err(|source| StyleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.update(&code)
    }

    /// The last submitted text, valid or not.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Bumped every time a new rule set is accepted.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Data sources some rule draws, in rule order.
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !rule.is_background() && !sources.contains(&rule.source.as_str()) {
                sources.push(&rule.source);
            }
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_default_sheet_is_white_background() {
        let sheet = StyleSheet::default();
        assert_eq!(sheet.rules().len(), 1);
        assert!(sheet.rules()[0].is_background());
        assert_eq!(sheet.rules()[0].fill_color(&Properties::new()), Color::WHITE);
        assert_eq!(StyleSheet::parse(sheet.code()).expect("default parses"), sheet.rules());
    }

    #[test]
    fn test_bad_json_keeps_last_rules() {
        let mut sheet = StyleSheet::default();
        sheet
            .update(r##"[{"source":"roads","stroke":"#ff0000"}, 42]"##)
            .expect("valid style");
        assert_eq!(sheet.rules().len(), 1, "non-object entries dropped");
        assert_eq!(sheet.rules()[0].stroke_color(&Properties::new()), Color::rgb(255, 0, 0));
        assert_eq!(sheet.revision(), 1);

        assert!(sheet.update(r#"[{"source": "roads""#).is_err());
        assert!(matches!(sheet.update(r#"{"source":"x"}"#), Err(StyleError::NotAnArray)));
        assert_eq!(sheet.rules()[0].source, "roads", "previous rules survive");
        assert_eq!(sheet.code(), r#"{"source":"x"}"#);
        assert_eq!(sheet.revision(), 1);
    }

    #[test]
    fn test_stroke_defaults() {
        let rule: StyleRule = serde_json::from_value(json!({"source": "roads", "stroke": "not a colour"})).expect("rule");
        let style = rule.stroke_style(&Properties::new());
        assert_eq!(style.width, 1.0);
        assert_eq!(style.cap, LineCap::Round);
        assert_eq!(style.join, LineJoin::Round);
        assert!(style.dash.is_empty());
        assert_eq!(rule.stroke_color(&Properties::new()), Color::DEFAULT_INK);
    }

    #[test]
    fn test_stroke_properties() {
        let rule: StyleRule = serde_json::from_value(json!({
            "source": "roads",
            "stroke": "#ff0000",
            "stroke-opacity": 0.5,
            "stroke-width": [1, ["lanes", ">=", 4, 3]],
            "stroke-dasharray": "4 2 x",
            "stroke-linecap": "butt",
            "stroke-linejoin": "miter"
        }))
        .expect("rule");
        let p = props(json!({"lanes": 6}));
        let style = rule.stroke_style(&p);
        assert_eq!(style.width, 3.0);
        assert_eq!(style.dash, vec![4.0, 2.0]);
        assert_eq!(style.cap, LineCap::Butt);
        assert_eq!(style.join, LineJoin::Miter);
        assert_eq!(rule.stroke_color(&p), Color::rgba(255, 0, 0, 128));
    }

    #[test]
    fn test_marks_fonts_and_labels() {
        let rule: StyleRule = serde_json::from_value(json!({
            "source": "cities",
            "mark": "\"square\"",
            "size": 6,
            "font": "14px sans-serif",
            "label": "${name} (<%= pop %>)"
        }))
        .expect("rule");
        let p = props(json!({"name": "Oslo", "pop": 700000}));
        assert_eq!(rule.mark(), Some("square"));
        assert_eq!(rule.mark_size(&p), 6.0);
        assert_eq!(rule.font_size(&p), 14.0);
        assert_eq!(rule.label_text(&p).as_deref(), Some("Oslo (700000)"));
        assert_eq!(expand_template("${missing}!", &p), "!");
    }

    #[test]
    fn test_sources_skip_background() {
        let mut sheet = StyleSheet::default();
        sheet
            .update(r##"[{"source":"bg","fill":"#fff"},{"source":"roads"},{"source":"water"},{"source":"roads"}]"##)
            .expect("style");
        assert_eq!(sheet.sources(), vec!["roads", "water"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("style.json");
        fs::write(&path, r#"[{"source":"rivers","stroke":"blue","type":"line"}]"#).expect("write");
        let mut sheet = StyleSheet::default();
        sheet.load(&path).expect("load");
        assert_eq!(sheet.rules()[0].source, "rivers");
        assert!(!sheet.rules()[0].is_overlay());
        assert!(matches!(sheet.load(&dir.path().join("nope.json")), Err(StyleError::Io { .. })));
    }
}
