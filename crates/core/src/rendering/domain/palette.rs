use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette must contain at least one color")]
    Empty,
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidHex(String),
}

/// 8-bit RGB color. Serialized as a `#rrggbb` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Color {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || PaletteError::InvalidHex(s.to_string());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = PaletteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Where cluster colors come from.
#[derive(Clone, Debug, PartialEq)]
pub enum PalettePolicy {
    /// `size` colors with every channel drawn uniformly from `0..=255`.
    Random { size: usize },
    /// Caller-supplied colors, used in order.
    Fixed(Vec<Color>),
}

/// Maps cluster labels to colors: `palette[label mod palette.len()]`.
///
/// A label always gets the same color from one assigner, so every face in
/// a cluster is drawn alike.
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteAssigner {
    colors: Vec<Color>,
}

impl PaletteAssigner {
    /// `rng` is only consulted by [`PalettePolicy::Random`]. Pass a
    /// generator separate from the clustering one.
    pub fn new(policy: PalettePolicy, rng: &mut dyn RngCore) -> Result<Self, PaletteError> {
        match policy {
            PalettePolicy::Random { size } => Self::random(size, rng),
            PalettePolicy::Fixed(colors) => Self::fixed(colors),
        }
    }

    pub fn random(size: usize, rng: &mut dyn RngCore) -> Result<Self, PaletteError> {
        if size == 0 {
            return Err(PaletteError::Empty);
        }
        let colors = (0..size)
            .map(|_| {
                let r: u8 = rng.gen();
                let g: u8 = rng.gen();
                let b: u8 = rng.gen();
                Color::new(r, g, b)
            })
            .collect();
        Ok(Self { colors })
    }

    pub fn fixed(colors: Vec<Color>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn color_for(&self, label: u32) -> Color {
        self.colors[label as usize % self.colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    const RED: Color = Color::new(255, 0, 0);
    const GREEN: Color = Color::new(0, 255, 0);
    const BLUE: Color = Color::new(0, 0, 255);

    #[test]
    fn test_fixed_palette_wraps_by_modulo() {
        let palette = PaletteAssigner::fixed(vec![RED, GREEN, BLUE]).unwrap();
        let colors: Vec<Color> = (0..5).map(|label| palette.color_for(label)).collect();
        assert_eq!(colors, vec![RED, GREEN, BLUE, RED, GREEN]);
    }

    #[test]
    fn test_sparse_labels_use_modulo() {
        let palette = PaletteAssigner::fixed(vec![RED, GREEN, BLUE]).unwrap();
        assert_eq!(palette.color_for(3_000_001), GREEN);
    }

    #[test]
    fn test_empty_palettes_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(PaletteAssigner::fixed(vec![]), Err(PaletteError::Empty));
        assert_eq!(PaletteAssigner::random(0, &mut rng), Err(PaletteError::Empty));
    }

    #[test]
    fn test_random_palette_size_and_stability() {
        let mut rng = StdRng::seed_from_u64(8);
        let palette = PaletteAssigner::new(PalettePolicy::Random { size: 50 }, &mut rng).unwrap();
        assert_eq!(palette.colors().len(), 50);
        assert_eq!(palette.color_for(7), palette.color_for(7));
        assert_eq!(palette.color_for(7), palette.color_for(57));
    }

    #[test]
    fn test_random_palette_reproducible_under_seed() {
        let build = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            PaletteAssigner::random(10, &mut rng).unwrap()
        };
        assert_eq!(build(4), build(4));
        assert_ne!(build(4), build(5));
    }

    #[test]
    fn test_fixed_policy_ignores_rng() {
        let mut rng = StdRng::seed_from_u64(0);
        let palette = PaletteAssigner::new(PalettePolicy::Fixed(vec![BLUE]), &mut rng).unwrap();
        assert_eq!(palette.colors(), &[BLUE]);
    }

    #[rstest]
    #[case("#ff0000", RED)]
    #[case("00ff00", GREEN)]
    #[case(" #0000FF ", BLUE)]
    fn test_parse_hex(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(input.parse::<Color>(), Ok(expected));
    }

    #[rstest]
    #[case("#ff00")]
    #[case("#gg0000")]
    #[case("")]
    #[case("#ff00000")]
    fn test_parse_hex_rejects(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Color>(),
            Err(PaletteError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&Color::new(1, 2, 171)).unwrap();
        assert_eq!(json, "\"#0102ab\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::new(1, 2, 171));
    }
}
