// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! sRGB material colours as delivered by the colour picker.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// 8-bit sRGB colour.
///
/// Parses `#rgb`, `#rrggbb` and the handful of CSS names the default
/// configuration uses; always prints as lowercase `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED: &[(&str, Color)] = &[
    ("white", Color::rgb(0xff, 0xff, 0xff)),
    ("black", Color::rgb(0x00, 0x00, 0x00)),
    ("orange", Color::rgb(0xff, 0xa5, 0x00)),
    ("gray", Color::rgb(0x80, 0x80, 0x80)),
    ("grey", Color::rgb(0x80, 0x80, 0x80)),
    ("red", Color::rgb(0xff, 0x00, 0x00)),
    ("green", Color::rgb(0x00, 0x80, 0x00)),
    ("blue", Color::rgb(0x00, 0x00, 0xff)),
    ("beige", Color::rgb(0xf5, 0xf5, 0xdc)),
];

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const ORANGE: Color = Color::rgb(0xff, 0xa5, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear-ish float triple for renderers that want `[0, 1]` channels
    pub fn to_f32_array(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    fn parse_hex(digits: &str) -> Option<Self> {
        let nibble = |c: char| c.to_digit(16).map(|d| d as u8);
        let chars: Vec<char> = digits.chars().collect();
        match chars.len() {
            3 => Some(Self::rgb(
                nibble(chars[0])? * 0x11,
                nibble(chars[1])? * 0x11,
                nibble(chars[2])? * 0x11,
            )),
            6 => Some(Self::rgb(
                nibble(chars[0])? << 4 | nibble(chars[1])?,
                nibble(chars[2])? << 4 | nibble(chars[3])?,
                nibble(chars[4])? << 4 | nibble(chars[5])?,
            )),
            _ => None,
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix('#') {
            Some(digits) => Self::parse_hex(digits),
            None => NAMED
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
                .map(|(_, color)| *color),
        };
        parsed.ok_or_else(|| Error::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
