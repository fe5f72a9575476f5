//! Advance-width metrics for the two builtin faces used on certificates.
//!
//! Widths are the standard Adobe AFM values (1000 units per em) for the
//! printable ASCII range, scaled by font size at measurement time. Centering
//! and word-wrapping are computed from these measured widths rather than
//! character counts, so names of very different density ("Ian Li" vs
//! "Wilhelmina Oyelaran-Montgomery") still center visually.

/// Faces available on the certificate template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Helvetica,
    HelveticaBold,
}

/// AFM units for characters the tables don't cover (non-ASCII, controls).
const FALLBACK_WIDTH: u16 = 556;

const ASCII_START: usize = 0x20;

/// Helvetica advance widths for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Advance of a single character in AFM units.
pub fn advance_units(face: Face, ch: char) -> u16 {
    let table = match face {
        Face::Helvetica => &HELVETICA,
        Face::HelveticaBold => &HELVETICA_BOLD,
    };
    let code = ch as usize;
    if (ASCII_START..ASCII_START + table.len()).contains(&code) {
        table[code - ASCII_START]
    } else {
        FALLBACK_WIDTH
    }
}

/// Rendered width of `text` at `size` points.
pub fn text_width(face: Face, text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(advance_units(face, ch))).sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_and_digits_match_afm() {
        assert_eq!(advance_units(Face::Helvetica, ' '), 278);
        assert_eq!(advance_units(Face::HelveticaBold, ' '), 278);
        for digit in '0'..='9' {
            assert_eq!(advance_units(Face::Helvetica, digit), 556);
            assert_eq!(advance_units(Face::HelveticaBold, digit), 556);
        }
    }

    #[test]
    fn bold_face_is_at_least_as_wide_for_letters() {
        for ch in 'a'..='z' {
            assert!(
                advance_units(Face::HelveticaBold, ch) >= advance_units(Face::Helvetica, ch),
                "bold {ch:?} narrower than regular"
            );
        }
    }

    #[test]
    fn width_scales_linearly_with_size() {
        let at_12 = text_width(Face::Helvetica, "Lauren Burrell", 12.0);
        let at_24 = text_width(Face::Helvetica, "Lauren Burrell", 24.0);
        assert!((at_24 - 2.0 * at_12).abs() < 1e-4);
    }

    #[test]
    fn unknown_characters_use_fallback_width() {
        let width = text_width(Face::Helvetica, "é", 10.0);
        assert!((width - f32::from(FALLBACK_WIDTH) / 100.0).abs() < 1e-4);
    }

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(text_width(Face::HelveticaBold, "", 28.0), 0.0);
    }
}
