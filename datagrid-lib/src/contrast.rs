//! Color contrast helpers for header and cell backgrounds.
//!
//! Colors are hex strings as users type them into a color picker: `#rgb` or
//! `#rrggbb`, with or without the leading `#`. Anything else yields `None`,
//! which callers treat as "no color applied".

/// Luminance above which dark text is used.
const LUMINANCE_THRESHOLD: f64 = 0.5;
/// Factor applied to light colors on hover.
const DARKEN_FACTOR: f64 = 0.9;
/// Factor applied to dark colors on hover.
const LIGHTEN_FACTOR: f64 = 1.15;

pub const BLACK: &str = "#000000";
pub const WHITE: &str = "#ffffff";

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb` / `#rrggbb` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            3 => {
                let mut channels = digits
                    .chars()
                    .map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::new(channels.next()??, channels.next()??, channels.next()??))
            }
            6 => {
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
                Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
            }
            _ => None,
        }
    }

    /// Relative luminance in `[0, 1]` using `0.299r + 0.587g + 0.114b`.
    pub fn luminance(&self) -> f64 {
        (0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64) / 255.0
    }

    /// Multiplies each channel by `factor`, clamped to `[0, 255]`.
    pub fn scale(&self, factor: f64) -> Self {
        let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Formats as lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Returns the text color that reads best on `background`.
///
/// Black above the luminance threshold, white at or below it.
///
/// ```
/// use datagrid_lib::contrast::contrast_color;
///
/// assert_eq!(contrast_color("#ffffff"), Some("#000000"));
/// assert_eq!(contrast_color("#000000"), Some("#ffffff"));
/// assert_eq!(contrast_color("#12345"), None);
/// ```
pub fn contrast_color(background: &str) -> Option<&'static str> {
    let rgb = Rgb::from_hex(background)?;
    if rgb.luminance() > LUMINANCE_THRESHOLD {
        Some(BLACK)
    } else {
        Some(WHITE)
    }
}

/// Returns the hover shade of `background`: light colors darken, dark colors lighten.
pub fn hover_color(background: &str) -> Option<String> {
    let rgb = Rgb::from_hex(background)?;
    let factor = if rgb.luminance() > LUMINANCE_THRESHOLD {
        DARKEN_FACTOR
    } else {
        LIGHTEN_FACTOR
    };
    Some(rgb.scale(factor).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_extremes() {
        assert_eq!(contrast_color("#ffffff"), Some(BLACK));
        assert_eq!(contrast_color("#000000"), Some(WHITE));
        assert_eq!(contrast_color("fff"), Some(BLACK));
    }

    #[test]
    fn test_contrast_rejects_other_lengths() {
        assert_eq!(contrast_color(""), None);
        assert_eq!(contrast_color("#ffff"), None);
        assert_eq!(contrast_color("#fffffff"), None);
        assert_eq!(contrast_color("#gggggg"), None);
        assert_eq!(None.and_then(contrast_color), None);
    }

    #[test]
    fn test_mid_gray_is_at_threshold() {
        // 0x80 = 128 -> 128/255 = 0.502, just above the threshold.
        assert_eq!(contrast_color("#808080"), Some(BLACK));
        // 0x7f = 127 -> 0.498, at or below the threshold.
        assert_eq!(contrast_color("#7f7f7f"), Some(WHITE));
    }

    #[test]
    fn test_three_digit_expansion() {
        assert_eq!(Rgb::from_hex("#abc"), Some(Rgb::new(0xaa, 0xbb, 0xcc)));
    }

    #[test]
    fn test_hover_color() {
        assert_eq!(hover_color("#ffffff").as_deref(), Some("#e6e6e6"));
        assert_eq!(hover_color("#000000").as_deref(), Some("#000000"));
        assert_eq!(hover_color("#646464").as_deref(), Some("#737373"));
        // Lightening clamps at 255.
        assert_eq!(hover_color("#ff0000").as_deref(), Some("#ff0000"));
        assert_eq!(hover_color("nope"), None);
    }
}
