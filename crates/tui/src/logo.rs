//! Block-letter wordmark for the loading screen.

const ROWS: usize = 5;
const SOLID: char = '█';

type Glyph = [&'static str; ROWS];

fn glyph(ch: char) -> Option<Glyph> {
    let glyph = match ch.to_ascii_uppercase() {
        'A' => [" ## ", "#  #", "####", "#  #", "#  #"],
        'D' => ["### ", "#  #", "#  #", "#  #", "### "],
        'E' => ["####", "#   ", "### ", "#   ", "####"],
        'I' => ["###", " # ", " # ", " # ", "###"],
        'L' => ["#   ", "#   ", "#   ", "#   ", "####"],
        'R' => ["### ", "#  #", "### ", "# # ", "#  #"],
        'T' => ["#####", "  #  ", "  #  ", "  #  ", "  #  "],
        'V' => ["#   #", "#   #", "#   #", " # # ", "  #  "],
        'W' => ["#   #", "#   #", "# # #", "## ##", "#   #"],
        'X' => ["#   #", " # # ", "  #  ", " # # ", "#   #"],
        ' ' => ["  ", "  ", "  ", "  ", "  "],
        _ => return None,
    };
    Some(glyph)
}

/// Render `text` as rows of block characters. Unknown characters are skipped.
pub fn render(text: &str) -> Vec<String> {
    let glyphs: Vec<Glyph> = text.chars().filter_map(glyph).collect();
    (0..ROWS)
        .map(|row| {
            glyphs
                .iter()
                .map(|glyph| glyph[row].replace('#', &SOLID.to_string()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Width in columns of the rendered wordmark.
pub fn width(text: &str) -> usize {
    render(text)
        .first()
        .map(|row| row.chars().count())
        .unwrap_or(0)
}
