use std::collections::HashMap;

/// How each semitone of an octave lands on a seven-letter key row:
/// the index of the natural it rides on and the modifier prefix, if any.
/// Semitones 0,2,4,5,7,9,11 are the naturals; 1,6,8 are sharps played as
/// `shift+` on the natural below; 3,10 are flats played as `ctrl+` on the
/// natural above.
const SEMITONE_SLOTS: [(usize, &str); 12] = [
    (0, ""),       // do
    (0, "shift+"), // do sharp
    (1, ""),       // re
    (2, "ctrl+"),  // mi flat
    (2, ""),       // mi
    (3, ""),       // fa
    (3, "shift+"), // fa sharp
    (4, ""),       // so
    (4, "shift+"), // so sharp
    (5, ""),       // la
    (6, "ctrl+"),  // ti flat
    (6, ""),       // ti
];

/// Key rows for the low, middle, and high octaves.
const ROWS: [[&str; 7]; 3] = [
    ["z", "x", "c", "v", "b", "n", "m"],
    ["a", "s", "d", "f", "g", "h", "j"],
    ["q", "w", "e", "r", "t", "y", "u"],
];

/// Fixed pitch → input-combination table for the three-octave instrument.
///
/// Covers exactly 36 pitches (12 per row base). Everything else resolves to
/// `None`, which callers treat as "skip the note", never as an error.
#[derive(Debug, Clone)]
pub struct KeyLayout {
    table: HashMap<u8, String>,
}

impl KeyLayout {
    /// Build the table from the base pitch of each row, low to high.
    pub fn new(row_bases: [u8; 3]) -> Self {
        let mut table = HashMap::with_capacity(36);
        for (row, base) in ROWS.iter().zip(row_bases) {
            for (semitone, (natural, prefix)) in SEMITONE_SLOTS.iter().enumerate() {
                let pitch = base + semitone as u8;
                table.insert(pitch, format!("{}{}", prefix, row[*natural]));
            }
        }
        Self { table }
    }

    pub fn resolve(&self, pitch: u8) -> Option<&str> {
        self.table.get(&pitch).map(String::as_str)
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new([48, 60, 72])
    }
}
