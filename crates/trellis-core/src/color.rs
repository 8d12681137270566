#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0, 255);

    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(r, g, b, a)
    }

    /// `#RRGGBB` or `#RRGGBBAA`; anything else is opaque black.
    pub fn from_hex(hex: &str) -> Self {
        let s = hex.trim_start_matches('#');
        let Ok(v) = u32::from_str_radix(s, 16) else {
            return Color::BLACK;
        };
        match s.len() {
            6 => Color((v >> 16) as u8, (v >> 8) as u8, v as u8, 255),
            8 => Color((v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, v as u8),
            _ => Color::BLACK,
        }
    }

    /// `#rrggbb`, alpha dropped. The surface animates alpha separately.
    pub fn to_css_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Alpha as a 0..=1 fraction.
    pub fn alpha_fraction(self) -> f64 {
        self.3 as f64 / 255.0
    }

    /// Euclidean distance over the four channels, used for paced key times.
    pub fn distance(self, other: Color) -> f64 {
        let d = |a: u8, b: u8| (a as f64 - b as f64).powi(2);
        (d(self.0, other.0) + d(self.1, other.1) + d(self.2, other.2) + d(self.3, other.3)).sqrt()
    }
}
