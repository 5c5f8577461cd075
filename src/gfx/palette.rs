/// Color attribute to RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<(u8, u8, u8)>,
}

const EGA: [u32; 16] = [
    0x000000, 0x0000AA, 0x00AA00, 0x00AAAA, 0xAA0000, 0xAA00AA, 0xAA5500, 0xAAAAAA, 0x555555,
    0x5555FF, 0x55FF55, 0x55FFFF, 0xFF5555, 0xFF55FF, 0xFFFF55, 0xFFFFFF,
];

impl Default for Palette {
    fn default() -> Self {
        let mut entries = Vec::with_capacity(256);
        entries.extend(
            EGA.iter()
                .map(|c| ((c >> 16) as u8, (c >> 8) as u8, *c as u8)),
        );
        entries.extend((0..16).map(|i| (i * 17, i * 17, i * 17)));
        for r in 0..6u8 {
            for g in 0..6u8 {
                for b in 0..6u8 {
                    entries.push((r * 51, g * 51, b * 51));
                }
            }
        }
        entries.resize(256, (0, 0, 0));
        Palette { entries }
    }
}

impl Palette {
    pub fn new() -> Palette {
        Palette::default()
    }

    pub fn get(&self, attribute: u8) -> (u8, u8, u8) {
        self.entries[attribute as usize]
    }

    /// Color is `65536 * blue + 256 * green + red` with 0..=63 channels.
    pub fn set(&mut self, attribute: u8, color: u32) {
        let channel = |shift: u32| (((color >> shift) & 0x3F) * 255 / 63) as u8;
        self.entries[attribute as usize] = (channel(0), channel(8), channel(16));
    }

    pub fn reset(&mut self) {
        *self = Palette::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Palette::new();
        assert_eq!(p.get(0), (0, 0, 0));
        assert_eq!(p.get(4), (0xAA, 0, 0));
        assert_eq!(p.get(14), (0xFF, 0xFF, 0x55));
        assert_eq!(p.get(15), (0xFF, 0xFF, 0xFF));
        assert_eq!(p.get(31), (255, 255, 255));
        assert_eq!(p.get(32), (0, 0, 0));
        assert_eq!(p.get(247), (255, 255, 255));
        assert_eq!(p.get(255), (0, 0, 0));
    }

    #[test]
    fn test_set_and_reset() {
        let mut p = Palette::new();
        p.set(1, 63);
        assert_eq!(p.get(1), (255, 0, 0));
        p.set(2, 65536 * 63 + 256 * 21);
        assert_eq!(p.get(2), (0, 85, 255));
        p.reset();
        assert_eq!(p.get(1), (0, 0, 0xAA));
    }
}
