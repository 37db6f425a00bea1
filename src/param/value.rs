//! Parameter values, colors, and numeric bounds.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Tag;

/// Largest magnitude at which every integer is exactly representable in `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A 24-bit RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Create a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a packed `0xRRGGBB` integer.
    #[must_use]
    pub fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xff) as u8,
            g: ((packed >> 8) & 0xff) as u8,
            b: (packed & 0xff) as u8,
        }
    }

    /// Packed `0xRRGGBB` form.
    #[must_use]
    pub fn packed(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    /// Accepts `#rrggbb`, `rrggbb`, `#rgb` and `rgb`.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("invalid color: {s:?}");
        }
        match hex.len() {
            6 => {
                let packed = u32::from_str_radix(hex, 16)
                    .with_context(|| format!("invalid color: {s:?}"))?;
                Ok(Self::from_packed(packed))
            }
            3 => {
                let mut channels = [0u8; 3];
                for (slot, c) in channels.iter_mut().zip(hex.chars()) {
                    let digit = c.to_digit(16).with_context(|| format!("invalid color: {s:?}"))?;
                    *slot = (digit * 17) as u8;
                }
                Ok(Self::new(channels[0], channels[1], channels[2]))
            }
            _ => bail!("invalid color: {s:?}"),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The value held by a leaf parameter.
///
/// Buttons and folders hold no value. Labels and strings both use `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean toggle state.
    Bool(bool),
    /// Numeric value (integral or not).
    Number(f64),
    /// String or label text.
    Text(String),
    /// Color value.
    Color(Color),
}

impl ParamValue {
    /// Convert `self` into a value acceptable for a node of `tag`.
    ///
    /// Conversions follow what a loosely typed peer would mean: numbers
    /// become booleans by non-zero test, text is parsed into numbers,
    /// booleans and colors, and anything becomes text.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot represent the tag (for
    /// example non-numeric text for a number) or the tag carries no value.
    pub fn coerce(self, tag: Tag) -> Result<Self> {
        let coerced = match (tag, self) {
            (Tag::Boolean, Self::Bool(b)) => Self::Bool(b),
            (Tag::Boolean, Self::Number(n)) => Self::Bool(n != 0.0),
            (Tag::Boolean, Self::Text(t)) => Self::Bool(parse_bool(&t)?),

            (Tag::Number, Self::Number(n)) => Self::Number(n),
            (Tag::Number, Self::Bool(b)) => Self::Number(if b { 1.0 } else { 0.0 }),
            (Tag::Number, Self::Text(t)) => Self::Number(
                t.trim()
                    .parse::<f64>()
                    .with_context(|| format!("not a number: {t:?}"))?,
            ),

            (Tag::String | Tag::Label, Self::Text(t)) => Self::Text(t),
            (Tag::String | Tag::Label, other) => Self::Text(other.to_string()),

            (Tag::Color, Self::Color(c)) => Self::Color(c),
            (Tag::Color, Self::Text(t)) => Self::Color(t.parse()?),
            (Tag::Color, Self::Number(n)) if n >= 0.0 && n <= f64::from(0x00ff_ffff_u32) => {
                Self::Color(Color::from_packed(n as u32))
            }

            (Tag::Button | Tag::Folder, _) => bail!("{tag} nodes hold no value"),
            (tag, value) => bail!("cannot use {value} as a {tag} value"),
        };
        if let Self::Number(n) = coerced {
            if !n.is_finite() {
                bail!("non-finite number: {n}");
            }
        }
        Ok(coerced)
    }

    /// Numeric content, if any.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean content, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text content, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Convert to a JSON value; integral numbers become JSON integers.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => match integral(*n) {
                Some(i) => serde_json::Value::from(i),
                None => serde_json::Value::from(*n),
            },
            Self::Text(t) => serde_json::Value::String(t.clone()),
            Self::Color(c) => serde_json::Value::String(c.to_string()),
        }
    }

    /// Convert a JSON scalar into a value, without a target tag.
    ///
    /// Returns `None` for null, arrays and objects.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
            Self::Text(t) => f.write_str(t),
            Self::Color(c) => write!(f, "{c}"),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Returns `n` as an integer when it is integral and exactly representable.
#[must_use]
pub fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER).then_some(n as i64)
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        other => bail!("not a boolean: {other:?}"),
    }
}

/// Bounds and step for a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberRange {
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Step between selectable values, anchored at `min` (or 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl NumberRange {
    /// Unbounded range without a step.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { min: None, max: None, step: None }
    }

    /// Whether every value on this range's grid is an integer.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        match self.step {
            Some(step) => step.fract() == 0.0 && self.min.is_none_or(|m| m.fract() == 0.0),
            None => false,
        }
    }

    /// Clamp `value` into the bounds and snap it onto the step grid.
    ///
    /// Snapping rounds to the nearest grid point; a point that lands past
    /// `max` falls back one step so the result is always in range.
    #[must_use]
    pub fn constrain(&self, value: f64) -> f64 {
        let mut v = self.clamp(value);
        if let Some(step) = self.step.filter(|s| *s > 0.0 && s.is_finite()) {
            let origin = self.min.unwrap_or(0.0);
            let steps = ((v - origin) / step).round();
            v = origin + steps * step;
            if self.max.is_some_and(|max| v > max) {
                v -= step;
            }
            if self.is_integral() {
                v = v.round();
            }
            v = self.clamp(v);
        }
        v
    }

    /// Distance moved by one nudge of a slider over this range.
    #[must_use]
    pub fn nudge_step(&self) -> f64 {
        if let Some(step) = self.step.filter(|s| *s > 0.0) {
            return step;
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) if max > min => {
                (max - min) / crate::constants::UNSTEPPED_NUDGE_DIVISIONS
            }
            _ => 1.0,
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        let mut v = value;
        if let Some(min) = self.min {
            v = v.max(min);
        }
        if let Some(max) = self.max {
            v = v.min(max);
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port_range() -> NumberRange {
        NumberRange { min: Some(1024.0), max: Some(65535.0), step: Some(1.0) }
    }

    #[test]
    fn test_color_parse_and_display() {
        let c: Color = "#ff8800".parse().unwrap();
        assert_eq!(c, Color::new(255, 136, 0));
        assert_eq!(c.to_string(), "#ff8800");

        let short: Color = "f80".parse().unwrap();
        assert_eq!(short, Color::new(255, 136, 0));

        assert!("#12345".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_packed_round_trip() {
        let c = Color::new(0x12, 0x34, 0x56);
        assert_eq!(c.packed(), 0x123456);
        assert_eq!(Color::from_packed(0x123456), c);
    }

    #[test]
    fn test_constrain_clamps_to_bounds() {
        let range = port_range();
        assert_eq!(range.constrain(80.0), 1024.0);
        assert_eq!(range.constrain(70000.0), 65535.0);
        assert_eq!(range.constrain(9000.0), 9000.0);
    }

    #[test]
    fn test_constrain_rounds_integral_steps() {
        let range = port_range();
        assert_eq!(range.constrain(9000.4), 9000.0);
        assert_eq!(range.constrain(9000.6), 9001.0);
    }

    #[test]
    fn test_constrain_snaps_to_grid_anchored_at_min() {
        let range = NumberRange { min: Some(1.0), max: Some(10.0), step: Some(2.0) };
        assert_eq!(range.constrain(4.2), 5.0);
        // 10 is off-grid (1,3,5,7,9); nearest grid point past max falls back
        assert_eq!(range.constrain(10.0), 9.0);
    }

    #[test]
    fn test_constrain_fractional_step() {
        let range = NumberRange { min: Some(0.0), max: Some(1.0), step: Some(0.25) };
        assert!((range.constrain(0.6) - 0.5).abs() < 1e-9);
        assert!(!range.is_integral());
    }

    #[test]
    fn test_constrain_unbounded_passthrough() {
        assert_eq!(NumberRange::unbounded().constrain(-3.7), -3.7);
    }

    #[test]
    fn test_nudge_step() {
        assert_eq!(port_range().nudge_step(), 1.0);
        let unstepped = NumberRange { min: Some(0.0), max: Some(50.0), step: None };
        assert_eq!(unstepped.nudge_step(), 0.5);
        assert_eq!(NumberRange::unbounded().nudge_step(), 1.0);
    }

    #[test]
    fn test_coerce_number_to_boolean() {
        assert_eq!(ParamValue::Number(1.0).coerce(Tag::Boolean).unwrap(), ParamValue::Bool(true));
        assert_eq!(ParamValue::Number(0.0).coerce(Tag::Boolean).unwrap(), ParamValue::Bool(false));
    }

    #[test]
    fn test_coerce_text_to_number() {
        assert_eq!(
            ParamValue::Text(" 42 ".into()).coerce(Tag::Number).unwrap(),
            ParamValue::Number(42.0)
        );
        assert!(ParamValue::Text("abc".into()).coerce(Tag::Number).is_err());
    }

    #[test]
    fn test_coerce_into_text() {
        assert_eq!(
            ParamValue::Number(5.0).coerce(Tag::String).unwrap(),
            ParamValue::Text("5".into())
        );
        assert_eq!(
            ParamValue::Bool(true).coerce(Tag::Label).unwrap(),
            ParamValue::Text("true".into())
        );
    }

    #[test]
    fn test_coerce_color() {
        assert_eq!(
            ParamValue::Text("#010203".into()).coerce(Tag::Color).unwrap(),
            ParamValue::Color(Color::new(1, 2, 3))
        );
        assert_eq!(
            ParamValue::Number(f64::from(0x0a0b0c_u32)).coerce(Tag::Color).unwrap(),
            ParamValue::Color(Color::new(10, 11, 12))
        );
        assert!(ParamValue::Bool(true).coerce(Tag::Color).is_err());
    }

    #[test]
    fn test_coerce_rejects_valueless_tags() {
        assert!(ParamValue::Bool(true).coerce(Tag::Button).is_err());
        assert!(ParamValue::Number(1.0).coerce(Tag::Folder).is_err());
    }

    #[test]
    fn test_json_integral_numbers() {
        assert_eq!(ParamValue::Number(8080.0).to_json(), serde_json::json!(8080));
        assert_eq!(ParamValue::Number(0.5).to_json(), serde_json::json!(0.5));
        assert_eq!(
            ParamValue::Color(Color::new(255, 0, 0)).to_json(),
            serde_json::json!("#ff0000")
        );
    }

    #[test]
    fn test_from_json_scalars_only() {
        assert_eq!(ParamValue::from_json(&serde_json::json!(true)), Some(ParamValue::Bool(true)));
        assert_eq!(ParamValue::from_json(&serde_json::json!(2)), Some(ParamValue::Number(2.0)));
        assert_eq!(ParamValue::from_json(&serde_json::json!(null)), None);
        assert_eq!(ParamValue::from_json(&serde_json::json!([1])), None);
    }
}
