//! CSS-style colour parsing.

use std::str::FromStr;

use crate::error::RasterError;

/// Straight (non-premultiplied) 8-bit RGBA.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fallback for styles whose colour does not parse.
    pub const DEFAULT_INK: Self = Self::rgb(0x33, 0x33, 0x33);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Replace alpha with `opacity` in `[0, 1]`.
    #[must_use]
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    #[must_use]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear `[0, 1]` components, as wgpu clear colours expect.
    #[must_use]
    pub fn to_f64(self) -> [f64; 4] {
        let to_linear = |c: u8| {
            let c = f64::from(c) / 255.0;
            if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        };
        [to_linear(self.r), to_linear(self.g), to_linear(self.b), f64::from(self.a) / 255.0]
    }

    fn named(name: &str) -> Option<Self> {
        Some(match name {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "cyan" | "aqua" => Self::rgb(0, 255, 255),
            "magenta" | "fuchsia" => Self::rgb(255, 0, 255),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "silver" => Self::rgb(192, 192, 192),
            "navy" => Self::rgb(0, 0, 128),
            "teal" => Self::rgb(0, 128, 128),
            "brown" => Self::rgb(165, 42, 42),
            "transparent" => Self::TRANSPARENT,
            _ => return None,
        })
    }

    fn hex(digits: &str) -> Option<Self> {
        let nibble = |i: usize| u8::from_str_radix(digits.get(i..=i)?, 16).ok();
        let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            3 | 4 => {
                let n = |i| nibble(i).map(|v| v * 17);
                let a = if digits.len() == 4 { n(3)? } else { 255 };
                Some(Self::rgba(n(0)?, n(1)?, n(2)?, a))
            }
            6 | 8 => {
                let a = if digits.len() == 8 { byte(6)? } else { 255 };
                Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
            }
            _ => None,
        }
    }

    fn functional(args: &str, with_alpha: bool) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != if with_alpha { 4 } else { 3 } {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            let v = match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? * 2.55,
                None => s.parse::<f64>().ok()?,
            };
            Some(v.round().clamp(0.0, 255.0) as u8)
        };
        let alpha = if with_alpha {
            (parts[3].parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            255
        };
        Some(Self::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha))
    }
}

impl FromStr for Color {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('"');
        let lower = trimmed.to_ascii_lowercase();
        let parsed = if let Some(digits) = lower.strip_prefix('#') {
            Self::hex(digits)
        } else if let Some(args) = lower.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
            Self::functional(args, true)
        } else if let Some(args) = lower.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            Self::functional(args, false)
        } else {
            Self::named(&lower)
        };
        parsed.ok_or_else(|| RasterError::InvalidColor(s.to_string()))
    }
}
