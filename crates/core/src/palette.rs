use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgba_css(&self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

pub const PALETTE: [Rgb; 6] = [
    Rgb::new(255, 99, 132),
    Rgb::new(54, 162, 235),
    Rgb::new(255, 206, 86),
    Rgb::new(75, 192, 192),
    Rgb::new(153, 102, 255),
    Rgb::new(255, 159, 64),
];

/// Index into [`PALETTE`]: sum of the key's UTF-16 code units modulo the
/// palette size.
pub fn color_index(key: &str) -> usize {
    let sum: u64 = key.encode_utf16().map(u64::from).sum();
    (sum % PALETTE.len() as u64) as usize
}

/// Colour for a series key. Same key, same colour, across polls and runs.
pub fn color_for(key: &str) -> Rgb {
    PALETTE[color_index(key)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_code_unit_sum_mod_palette() {
        // 'u' = 117, 'p' = 112, '_' = 95, 'a' = 97 → 421 % 6 = 1
        assert_eq!(color_index("up_a"), 1);
        assert_eq!(color_for("up_a"), Rgb::new(54, 162, 235));
        assert_eq!(color_index(""), 0);
    }

    #[test]
    fn colour_is_stable_for_a_key() {
        let keys = ["up_a", "node_load1_host:9100", "ünïcode_x", "go_gc_duration_seconds_vm"];
        for key in keys {
            let first = color_for(key);
            for _ in 0..10 {
                assert_eq!(color_for(key), first);
            }
        }
    }

    #[test]
    fn css_rendering() {
        assert_eq!(PALETTE[0].rgba_css(0.1), "rgba(255, 99, 132, 0.1)");
    }
}
