use std::fmt;

use palette::Srgb;

use crate::error::{InspectError, Result};

/// `#RRGGBB`, uppercase, two digits per channel.
pub fn hex_encode(c: Srgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue)
}

/// Parse `RRGGBB` with or without a leading `#`, in either case.
pub fn parse_hex(s: &str) -> Result<Srgb<u8>> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(InspectError::InvalidHex(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| InspectError::InvalidHex(s.to_string()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// CSS functional notation, e.g. `rgb(10, 20, 30)`.
pub fn rgb_string(c: Srgb<u8>) -> String {
    format!("rgb({}, {}, {})", c.red, c.green, c.blue)
}

/// Coarse color-family label for an sRGB triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorFamily {
    DarkShade,
    LightShade,
    DarkGray,
    MediumGray,
    LightGray,
    Orange,
    Magenta,
    Red,
    Yellow,
    Cyan,
    Green,
    Purple,
    Teal,
    Blue,
    Mixed,
}

impl ColorFamily {
    /// Tiered classification: lightness extremes first, then near-grays, then
    /// the strictly dominant channel and the ratio of the other two.
    pub fn classify(c: Srgb<u8>) -> Self {
        let (r, g, b) = (c.red as f32, c.green as f32, c.blue as f32);
        let max_c = r.max(g).max(b);
        let min_c = r.min(g).min(b);
        let diff = max_c - min_c;
        let lightness = (max_c + min_c) / 2.0;

        if lightness < 30.0 {
            return ColorFamily::DarkShade;
        }
        if lightness > 225.0 {
            return ColorFamily::LightShade;
        }
        if diff < 30.0 {
            return if lightness < 85.0 {
                ColorFamily::DarkGray
            } else if lightness < 170.0 {
                ColorFamily::MediumGray
            } else {
                ColorFamily::LightGray
            };
        }

        if r > g && r > b {
            if g > 1.5 * b {
                ColorFamily::Orange
            } else if b > 1.5 * g {
                ColorFamily::Magenta
            } else {
                ColorFamily::Red
            }
        } else if g > r && g > b {
            if r > 1.2 * b {
                ColorFamily::Yellow
            } else if b > 1.2 * r {
                ColorFamily::Cyan
            } else {
                ColorFamily::Green
            }
        } else if b > r && b > g {
            if r > 1.2 * g {
                ColorFamily::Purple
            } else if g > 1.2 * r {
                ColorFamily::Teal
            } else {
                ColorFamily::Blue
            }
        } else {
            ColorFamily::Mixed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorFamily::DarkShade => "Dark Shade",
            ColorFamily::LightShade => "Light Shade",
            ColorFamily::DarkGray => "Dark Gray",
            ColorFamily::MediumGray => "Medium Gray",
            ColorFamily::LightGray => "Light Gray",
            ColorFamily::Orange => "Orange Tone",
            ColorFamily::Magenta => "Magenta Tone",
            ColorFamily::Red => "Red Tone",
            ColorFamily::Yellow => "Yellow Tone",
            ColorFamily::Cyan => "Cyan Tone",
            ColorFamily::Green => "Green Tone",
            ColorFamily::Purple => "Purple Tone",
            ColorFamily::Teal => "Teal Tone",
            ColorFamily::Blue => "Blue Tone",
            ColorFamily::Mixed => "Mixed Tone",
        }
    }
}

impl fmt::Display for ColorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn color_name(c: Srgb<u8>) -> &'static str {
    ColorFamily::classify(c).as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(r: u8, g: u8, b: u8) -> &'static str {
        color_name(Srgb::new(r, g, b))
    }

    #[test]
    fn hex_is_uppercase_and_padded() {
        assert_eq!(hex_encode(Srgb::new(10, 20, 30)), "#0A141E");
        assert_eq!(hex_encode(Srgb::new(0, 0, 0)), "#000000");
        assert_eq!(hex_encode(Srgb::new(255, 171, 1)), "#FFAB01");
    }

    #[test]
    fn hex_round_trips_every_channel_value() {
        for v in 0..=255u8 {
            let c = Srgb::new(v, 255 - v, v / 3);
            let hex = hex_encode(c);
            assert_eq!(hex_encode(parse_hex(&hex).unwrap()), hex);
        }
    }

    #[test]
    fn parse_accepts_bare_and_lowercase() {
        assert_eq!(parse_hex("ff8000").unwrap(), Srgb::new(255, 128, 0));
        assert_eq!(parse_hex(" #Ff8000 ").unwrap(), Srgb::new(255, 128, 0));
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "#FFF", "#GG0000", "#1234567", "#ééé"] {
            assert!(
                matches!(parse_hex(bad), Err(InspectError::InvalidHex(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn rgb_string_format() {
        assert_eq!(rgb_string(Srgb::new(10, 20, 30)), "rgb(10, 20, 30)");
    }

    #[test]
    fn lightness_extremes_and_grays() {
        assert_eq!(name(0, 0, 0), "Dark Shade");
        assert_eq!(name(255, 255, 255), "Light Shade");
        assert_eq!(name(128, 128, 128), "Medium Gray");
        assert_eq!(name(60, 60, 70), "Dark Gray");
        assert_eq!(name(200, 200, 190), "Light Gray");
        // lightness exactly 30 is no longer a dark shade
        assert_eq!(name(30, 30, 30), "Dark Gray");
    }

    #[test]
    fn red_dominant_tones() {
        assert_eq!(name(200, 50, 50), "Red Tone");
        assert_eq!(name(230, 140, 40), "Orange Tone");
        assert_eq!(name(200, 40, 120), "Magenta Tone");
    }

    #[test]
    fn green_dominant_tones() {
        assert_eq!(name(60, 200, 60), "Green Tone");
        assert_eq!(name(150, 200, 40), "Yellow Tone");
        assert_eq!(name(40, 200, 150), "Cyan Tone");
    }

    #[test]
    fn blue_dominant_tones() {
        assert_eq!(name(60, 60, 200), "Blue Tone");
        assert_eq!(name(140, 40, 200), "Purple Tone");
        assert_eq!(name(40, 140, 200), "Teal Tone");
    }

    #[test]
    fn tied_maximum_is_mixed() {
        assert_eq!(name(200, 200, 50), "Mixed Tone");
        assert_eq!(name(50, 180, 180), "Mixed Tone");
    }

    #[test]
    fn display_matches_label() {
        assert_eq!(ColorFamily::Teal.to_string(), "Teal Tone");
    }
}
