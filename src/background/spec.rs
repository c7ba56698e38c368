use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{HeadshotError, HeadshotResult};

/// An 8-bit RGB color used for background fills.
pub type Rgb = [u8; 3];

pub const WHITE: Rgb = [255, 255, 255];

/// Axis along which a multi-stop gradient runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientDirection {
    /// Top to bottom.
    #[default]
    Down,
    /// Left to right.
    Right,
    /// From the top-left corner towards the bottom-right one.
    Diagonal,
    /// From the center outwards.
    Radial,
}

impl GradientDirection {
    pub const ALL: [GradientDirection; 4] = [
        GradientDirection::Down,
        GradientDirection::Right,
        GradientDirection::Diagonal,
        GradientDirection::Radial,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            GradientDirection::Down => "down",
            GradientDirection::Right => "right",
            GradientDirection::Diagonal => "diagonal",
            GradientDirection::Radial => "radial",
        }
    }

    /// Case-insensitive keyword lookup.
    pub fn from_keyword(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|dir| dir.keyword().eq_ignore_ascii_case(token))
    }
}

/// What to paint behind the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSpec {
    Solid {
        color: Rgb,
    },
    /// Always holds at least two stops.
    Gradient {
        colors: Vec<Rgb>,
        direction: GradientDirection,
    },
    Image {
        path: PathBuf,
    },
    Transparent,
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        BackgroundSpec::Solid { color: WHITE }
    }
}

impl BackgroundSpec {
    /// Build a gradient, degrading to a solid fill when fewer than two stops are given.
    pub fn gradient(colors: Vec<Rgb>, direction: GradientDirection) -> Self {
        match colors.as_slice() {
            [] => BackgroundSpec::default(),
            [only] => BackgroundSpec::Solid { color: *only },
            _ => BackgroundSpec::Gradient { colors, direction },
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, BackgroundSpec::Transparent)
    }
}

/// Parse a background string, falling back to solid white for anything unrecognized.
///
/// Accepted forms, first match wins:
/// `TRANSPARENT` (any case), a path to an existing file, colon-separated hex
/// colors with an optional direction keyword (`#1D4BB7:#DFE7EF:radial`), or a
/// single hex color.
pub fn parse(spec: &str) -> BackgroundSpec {
    resolve(spec).unwrap_or_default()
}

/// Like [`parse`], but reject input the lenient parser would silently replace with white.
///
/// Colon-separated input must consist only of hex colors and direction keywords.
pub fn parse_strict(spec: &str) -> HeadshotResult<BackgroundSpec> {
    let invalid = || HeadshotError::InvalidBackground(spec.to_string());
    let parsed = resolve(spec).ok_or_else(invalid)?;
    if matches!(parsed, BackgroundSpec::Solid { .. } | BackgroundSpec::Gradient { .. }) {
        let all_known = spec
            .split(':')
            .all(|part| is_hex_color(part) || GradientDirection::from_keyword(part).is_some());
        if !all_known {
            return Err(invalid());
        }
    }
    Ok(parsed)
}

fn resolve(spec: &str) -> Option<BackgroundSpec> {
    if spec.eq_ignore_ascii_case("TRANSPARENT") {
        return Some(BackgroundSpec::Transparent);
    }
    if !spec.is_empty() && Path::new(spec).is_file() {
        return Some(BackgroundSpec::Image {
            path: PathBuf::from(spec),
        });
    }

    let parts: Vec<&str> = spec.split(':').collect();
    let colors: Vec<Rgb> = parts.iter().filter_map(|part| hex_to_rgb(part)).collect();
    let direction = parts
        .iter()
        .find_map(|part| GradientDirection::from_keyword(part))
        .unwrap_or_default();

    match colors.len() {
        0 => hex_to_rgb(spec).map(|color| BackgroundSpec::Solid { color }),
        _ => Some(BackgroundSpec::gradient(colors, direction)),
    }
}

/// Three or six hex digits with an optional leading `#`.
pub fn is_hex_color(token: &str) -> bool {
    let digits = token.strip_prefix('#').unwrap_or(token);
    matches!(digits.len(), 3 | 6) && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Decode a hex color; three-digit shorthand is expanded (`#abc` -> `#aabbcc`).
pub fn hex_to_rgb(token: &str) -> Option<Rgb> {
    if !is_hex_color(token) {
        return None;
    }
    let digits = token.strip_prefix('#').unwrap_or(token);
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        6 => Some([
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ]),
        _ => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(digits.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(rgb)
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, [r, g, b]: Rgb) -> fmt::Result {
    write!(f, "#{r:02X}{g:02X}{b:02X}")
}

impl fmt::Display for BackgroundSpec {
    /// Render back into the string grammar accepted by [`parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundSpec::Solid { color } => write_hex(f, *color),
            BackgroundSpec::Gradient { colors, direction } => {
                for color in colors {
                    write_hex(f, *color)?;
                    f.write_str(":")?;
                }
                f.write_str(direction.keyword())
            }
            BackgroundSpec::Image { path } => write!(f, "{}", path.display()),
            BackgroundSpec::Transparent => f.write_str("TRANSPARENT"),
        }
    }
}

impl FromStr for BackgroundSpec {
    type Err = HeadshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_strict(s)
    }
}
