use std::collections::HashMap;

use once_cell::sync::Lazy;

const DIGIT_HEIGHT: usize = 5;
const BLANK: Glyph = ["    "; DIGIT_HEIGHT];

type Glyph = [&'static str; DIGIT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('0', [" ── ", "│  │", "│  │", "│  │", " ── "]),
        ('1', ["    ", "   │", "   │", "   │", "    "]),
        ('2', [" ── ", "   │", " ── ", "│   ", " ── "]),
        ('3', [" ── ", "   │", " ── ", "   │", " ── "]),
        ('4', ["    ", "│  │", " ── ", "   │", "    "]),
        ('5', [" ── ", "│   ", " ── ", "   │", " ── "]),
        ('6', [" ── ", "│   ", " ── ", "│  │", " ── "]),
        ('7', [" ── ", "   │", "    ", "   │", "    "]),
        ('8', [" ── ", "│  │", " ── ", "│  │", " ── "]),
        ('9', [" ── ", "│  │", " ── ", "   │", " ── "]),
        (':', ["    ", " ·  ", "    ", " ·  ", "    "]),
    ])
});

/// Render the text as seven-segment style rows for the countdown display.
pub fn render(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); DIGIT_HEIGHT];
    for (index, ch) in text.chars().enumerate() {
        let glyph = GLYPHS.get(&ch).copied().unwrap_or(BLANK);
        for (row, segment) in rows.iter_mut().zip(glyph.iter()) {
            if index > 0 {
                row.push_str("  ");
            }
            row.push_str(segment);
        }
    }
    rows
}

/// Height in terminal rows of the rendered digits.
pub fn height() -> u16 {
    DIGIT_HEIGHT as u16
}
