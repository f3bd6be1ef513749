use serde::Deserialize;

/// Opaque RGBA color parsed from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ColorSpec")]
pub struct Color(pub [u8; 4]);

/// Raw config representation of a [`Color`].
#[derive(Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Name(String),
    Rgb([u8; 3]),
}

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);

    pub fn rgba(&self) -> [u8; 4] {
        self.0
    }

    /// Accepts a small set of color names or `#rrggbb`.
    pub fn parse(s: &str) -> Option<Color> {
        let s = s.trim().to_ascii_lowercase();
        let rgb = match s.as_str() {
            "black" => [0, 0, 0],
            "white" => [255, 255, 255],
            "grey" | "gray" => [128, 128, 128],
            "red" => [255, 0, 0],
            "green" => [0, 128, 0],
            "blue" => [0, 0, 255],
            "yellow" => [255, 255, 0],
            hex => {
                let hex = hex.strip_prefix('#')?;
                if hex.len() != 6 {
                    return None;
                }
                let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
                [channel(0)?, channel(2)?, channel(4)?]
            }
        };
        Some(Color([rgb[0], rgb[1], rgb[2], 255]))
    }
}

impl TryFrom<ColorSpec> for Color {
    type Error = String;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Rgb([r, g, b]) => Ok(Color([r, g, b, 255])),
            ColorSpec::Name(name) => {
                Color::parse(&name).ok_or_else(|| format!("unrecognized color {name:?}"))
            }
        }
    }
}
