//! Visible length and wrap accounting that ignore ANSI control sequences.

use super::ansi::extract_ansi_code;

/// Number of characters a terminal would print for `input`.
///
/// Escape sequences (SGR colors, cursor moves, OSC 8 hyperlinks) contribute
/// nothing; every other `char` counts as one column.
pub fn visible_length(input: &str) -> usize {
    if input.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(code) = extract_ansi_code(input, idx) {
            idx += code.length;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        count += 1;
        idx += ch.len_utf8();
    }
    count
}

/// Extra rows a terminal of `width` columns adds when soft-wrapping `content`.
///
/// Each `\n`-separated segment wraps independently; a segment that exactly
/// fills the width does not wrap. A width of zero means the terminal width is
/// unknown and no wrapping is assumed.
pub fn count_line_breaks(content: &str, width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    content
        .split('\n')
        .map(|segment| wrap_rows(visible_length(segment), width))
        .sum()
}

pub(crate) fn wrap_rows(visible: usize, width: usize) -> usize {
    if width == 0 || visible == 0 {
        return 0;
    }
    visible.div_ceil(width) - 1
}
