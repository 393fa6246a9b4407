use crate::ColorError;

/// Color used when no color string is given at all.
pub const DEFAULT_COLOR: u32 = 0x009e_e8;

/// Parses a hex color string into a packed `0xRRGGBB` value.
///
/// Accepted forms are `#rgb`, `#rrggbb` and `#rrggbbaa` (alpha is ignored). `None` and the empty
/// string yield [`DEFAULT_COLOR`]. Anything else is an error; malformed colors are never
/// silently replaced by the default.
pub fn parse_color(color: Option<&str>) -> Result<u32, ColorError> {
    let color = match color {
        Some(c) if !c.is_empty() => c,
        _ => return Ok(DEFAULT_COLOR),
    };

    let expanded;
    let color = if color.len() == 4 {
        expanded = expand_short_hex(color);
        expanded.as_str()
    } else {
        color
    };

    if !color.starts_with('#') || !(color.len() == 7 || color.len() == 9) {
        return Err(ColorError::InvalidFormat(color.to_string()));
    }

    let digits = &color[1..];
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidDigits(color.to_string()));
    }

    u32::from_str_radix(&digits[..6], 16).map_err(|_| ColorError::InvalidDigits(color.to_string()))
}

/// Duplicates every character after the leading `#`: `#abc` becomes `#aabbcc`.
pub fn expand_short_hex(color: &str) -> String {
    let mut out = String::with_capacity(color.len() * 2);
    for ch in color.chars() {
        out.push(ch);
        if ch != '#' {
            out.push(ch);
        }
    }
    out
}

/// Splits a packed `0xRRGGBB` value into its sRGB bytes.
#[inline]
pub const fn rgb_bytes(packed: u32) -> [u8; 3] {
    [
        ((packed >> 16) & 0xff) as u8,
        ((packed >> 8) & 0xff) as u8,
        (packed & 0xff) as u8,
    ]
}

/// RGBA color in linear space with values in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Convert sRGB color (0-255) to linear space
    #[inline]
    pub const fn from_srgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        const fn srgb_to_linear(c: u8) -> f32 {
            let x = c as f32 / 255.0;
            if x <= 0.04045 {
                x / 12.92
            } else {
                // Approximates ((x + 0.055) / 1.055)^2.4
                let t = (x + 0.055) / 1.055;
                t * t * (0.5870 * t + 0.4130)
            }
        }

        Self::new(
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
            a as f32 / 255.0,
        )
    }

    /// Opaque linear color from a packed `0xRRGGBB` value.
    pub const fn from_packed(packed: u32) -> Self {
        let [r, g, b] = rgb_bytes(packed);
        Self::from_srgba(r, g, b, 255)
    }

    /// Parses a hex color string, see [`parse_color`].
    pub fn from_hex(color: &str) -> Result<Self, ColorError> {
        parse_color(Some(color)).map(Self::from_packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex_matches_long_form() {
        assert_eq!(expand_short_hex("#abc"), "#aabbcc");
        assert_eq!(
            parse_color(Some("#abc")).unwrap(),
            parse_color(Some("#aabbcc")).unwrap()
        );
        assert_eq!(parse_color(Some("#abc")).unwrap(), 0xaabbcc);
    }

    #[test]
    fn test_alpha_is_ignored() {
        assert_eq!(parse_color(Some("#00ff0080")).unwrap(), 0x00ff00);
    }

    #[test]
    fn test_missing_color_uses_default() {
        assert_eq!(parse_color(None).unwrap(), DEFAULT_COLOR);
        assert_eq!(parse_color(Some("")).unwrap(), DEFAULT_COLOR);
    }

    #[test]
    fn test_malformed_colors_are_rejected() {
        assert_eq!(
            parse_color(Some("00ff00")),
            Err(ColorError::InvalidFormat("00ff00".to_string()))
        );
        assert!(matches!(
            parse_color(Some("#12345")),
            Err(ColorError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_color(Some("#zzz")),
            Err(ColorError::InvalidDigits(_))
        ));
    }

    #[test]
    fn test_from_hex_goes_through_parse_color() {
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::from_packed(0xffffff));
        assert_eq!(Color::from_hex("#0b0b12").unwrap(), Color::from_packed(0x0b0b12));
        assert!(matches!(
            Color::from_hex("#12"),
            Err(ColorError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_from_packed_extremes() {
        let white = Color::from_packed(0xffffff);
        assert!((white.r - 1.0).abs() < 1e-3);
        assert!((white.b - 1.0).abs() < 1e-3);
        assert_eq!(Color::from_packed(0x000000), Color::rgb(0.0, 0.0, 0.0));
        assert_eq!(rgb_bytes(0x009ee8), [0x00, 0x9e, 0xe8]);
    }
}
