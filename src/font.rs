// src/font.rs - 5x7 bitmap glyphs for annotation labels

/// Glyph rows for ASCII 32 (space) through 90 ('Z'), top row first.
/// Each row uses the five high bits, leftmost column in bit 7.
pub const FONT_BITMAP: [[u8; 7]; 59] = [
    [0b00000000, 0b00000000, 0b00000000, 0b00000000, 0b00000000, 0b00000000, 0b00000000], // ' '
    [0b00100000, 0b00100000, 0b00100000, 0b00100000, 0b00100000, 0b00000000, 0b00100000], // '!'
    [0b01010000, 0b01010000, 0b01010000, 0b00000000, 0b00000000, 0b00000000, 0b00000000], // '"'
    [0b01010000, 0b01010000, 0b11111000, 0b01010000, 0b11111000, 0b01010000, 0b01010000], // '#'
    [0b00100000, 0b01111000, 0b10100000, 0b01110000, 0b00101000, 0b11110000, 0b00100000], // '$'
    [0b11000000, 0b11001000, 0b00010000, 0b00100000, 0b01000000, 0b10011000, 0b00011000], // '%'
    [0b01000000, 0b10100000, 0b10100000, 0b01000000, 0b10101000, 0b10010000, 0b01101000], // '&'
    [0b00110000, 0b00110000, 0b00100000, 0b01000000, 0b00000000, 0b00000000, 0b00000000], // '\''
    [0b00010000, 0b00100000, 0b01000000, 0b01000000, 0b01000000, 0b00100000, 0b00010000], // '('
    [0b01000000, 0b00100000, 0b00010000, 0b00010000, 0b00010000, 0b00100000, 0b01000000], // ')'
    [0b00100000, 0b10101000, 0b01110000, 0b11111000, 0b01110000, 0b10101000, 0b00100000], // '*'
    [0b00000000, 0b00100000, 0b00100000, 0b11111000, 0b00100000, 0b00100000, 0b00000000], // '+'
    [0b00000000, 0b00000000, 0b00000000, 0b00000000, 0b00110000, 0b00110000, 0b00100000], // ','
    [0b00000000, 0b00000000, 0b00000000, 0b11111000, 0b00000000, 0b00000000, 0b00000000], // '-'
    [0b00000000, 0b00000000, 0b00000000, 0b00000000, 0b00000000, 0b00110000, 0b00110000], // '.'
    [0b00000000, 0b00001000, 0b00010000, 0b00100000, 0b01000000, 0b10000000, 0b00000000], // '/'
    [0b01110000, 0b10001000, 0b10011000, 0b10101000, 0b11001000, 0b10001000, 0b01110000], // '0'
    [0b00100000, 0b01100000, 0b00100000, 0b00100000, 0b00100000, 0b00100000, 0b01110000], // '1'
    [0b01110000, 0b10001000, 0b00001000, 0b01110000, 0b10000000, 0b10000000, 0b11111000], // '2'
    [0b11111000, 0b00001000, 0b00010000, 0b00110000, 0b00001000, 0b10001000, 0b01110000], // '3'
    [0b00010000, 0b00110000, 0b01010000, 0b10010000, 0b11111000, 0b00010000, 0b00010000], // '4'
    [0b11111000, 0b10000000, 0b11110000, 0b00001000, 0b00001000, 0b10001000, 0b01110000], // '5'
    [0b00111000, 0b01000000, 0b10000000, 0b11110000, 0b10001000, 0b10001000, 0b01110000], // '6'
    [0b11111000, 0b00001000, 0b00001000, 0b00010000, 0b00100000, 0b01000000, 0b10000000], // '7'
    [0b01110000, 0b10001000, 0b10001000, 0b01110000, 0b10001000, 0b10001000, 0b01110000], // '8'
    [0b01110000, 0b10001000, 0b10001000, 0b01111000, 0b00001000, 0b00010000, 0b11100000], // '9'
    [0b00000000, 0b00000000, 0b00100000, 0b00000000, 0b00100000, 0b00000000, 0b00000000], // ':'
    [0b00000000, 0b00000000, 0b00100000, 0b00000000, 0b00100000, 0b00100000, 0b01000000], // ';'
    [0b00001000, 0b00010000, 0b00100000, 0b01000000, 0b00100000, 0b00010000, 0b00001000], // '<'
    [0b00000000, 0b00000000, 0b11111000, 0b00000000, 0b11111000, 0b00000000, 0b00000000], // '='
    [0b01000000, 0b00100000, 0b00010000, 0b00001000, 0b00010000, 0b00100000, 0b01000000], // '>'
    [0b01110000, 0b10001000, 0b00001000, 0b00110000, 0b00100000, 0b00000000, 0b00100000], // '?'
    [0b01110000, 0b10001000, 0b10101000, 0b10111000, 0b10110000, 0b10000000, 0b01111000], // '@'
    [0b00100000, 0b01010000, 0b10001000, 0b10001000, 0b11111000, 0b10001000, 0b10001000], // 'A'
    [0b11110000, 0b10001000, 0b10001000, 0b11110000, 0b10001000, 0b10001000, 0b11110000], // 'B'
    [0b01110000, 0b10001000, 0b10000000, 0b10000000, 0b10000000, 0b10001000, 0b01110000], // 'C'
    [0b11110000, 0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b11110000], // 'D'
    [0b11111000, 0b10000000, 0b10000000, 0b11110000, 0b10000000, 0b10000000, 0b11111000], // 'E'
    [0b11111000, 0b10000000, 0b10000000, 0b11110000, 0b10000000, 0b10000000, 0b10000000], // 'F'
    [0b01111000, 0b10001000, 0b10000000, 0b10000000, 0b10011000, 0b10001000, 0b01111000], // 'G'
    [0b10001000, 0b10001000, 0b10001000, 0b11111000, 0b10001000, 0b10001000, 0b10001000], // 'H'
    [0b01110000, 0b00100000, 0b00100000, 0b00100000, 0b00100000, 0b00100000, 0b01110000], // 'I'
    [0b00111000, 0b00010000, 0b00010000, 0b00010000, 0b00010000, 0b10010000, 0b01100000], // 'J'
    [0b10001000, 0b10010000, 0b10100000, 0b11000000, 0b10100000, 0b10010000, 0b10001000], // 'K'
    [0b10000000, 0b10000000, 0b10000000, 0b10000000, 0b10000000, 0b10000000, 0b11111000], // 'L'
    [0b10001000, 0b11011000, 0b10101000, 0b10101000, 0b10101000, 0b10001000, 0b10001000], // 'M'
    [0b10001000, 0b10001000, 0b11001000, 0b10101000, 0b10011000, 0b10001000, 0b10001000], // 'N'
    [0b01110000, 0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b01110000], // 'O'
    [0b11110000, 0b10001000, 0b10001000, 0b11110000, 0b10000000, 0b10000000, 0b10000000], // 'P'
    [0b01110000, 0b10001000, 0b10001000, 0b10001000, 0b10101000, 0b10010000, 0b01101000], // 'Q'
    [0b11110000, 0b10001000, 0b10001000, 0b11110000, 0b10100000, 0b10010000, 0b10001000], // 'R'
    [0b01110000, 0b10001000, 0b10000000, 0b01110000, 0b00001000, 0b10001000, 0b01110000], // 'S'
    [0b11111000, 0b10101000, 0b00100000, 0b00100000, 0b00100000, 0b00100000, 0b00100000], // 'T'
    [0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b01110000], // 'U'
    [0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b10001000, 0b01010000, 0b00100000], // 'V'
    [0b10001000, 0b10001000, 0b10001000, 0b10101000, 0b10101000, 0b10101000, 0b01010000], // 'W'
    [0b10001000, 0b10001000, 0b01010000, 0b00100000, 0b01010000, 0b10001000, 0b10001000], // 'X'
    [0b10001000, 0b10001000, 0b01010000, 0b00100000, 0b00100000, 0b00100000, 0b00100000], // 'Y'
    [0b11111000, 0b00001000, 0b00010000, 0b01110000, 0b01000000, 0b10000000, 0b11111000], // 'Z'
];

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per character
pub const GLYPH_ADVANCE: u32 = 6;

/// Glyph for a character; lowercase letters use the uppercase shapes
pub fn glyph(c: char) -> Option<&'static [u8; 7]> {
    let c = c.to_ascii_uppercase();
    if c < ' ' {
        return None;
    }
    FONT_BITMAP.get(c as usize - 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_is_blank_and_letters_are_not() {
        assert!(glyph(' ').expect("space").iter().all(|&row| row == 0));
        for c in ['A', 'g', 'Z', '7'] {
            assert!(glyph(c).expect("known glyph").iter().any(|&row| row != 0), "{}", c);
        }
        assert!(glyph('~').is_none());
    }

    #[test]
    fn glyphs_fit_five_columns() {
        for rows in FONT_BITMAP.iter() {
            assert!(rows.iter().all(|&row| row & 0b0000_0111 == 0));
        }
    }
}
