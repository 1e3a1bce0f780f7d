//! ANSI escape-sequence scanning.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiCodeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

/// A recognized escape sequence starting at some byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnsiCode {
    pub length: usize,
    pub kind: AnsiCodeKind,
}

/// Recognizes the escape sequence starting at byte `pos`, if any.
///
/// Unterminated sequences are not recognized; the caller treats their bytes as
/// ordinary text.
pub fn extract_ansi_code(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    if pos >= bytes.len() || bytes[pos] != 0x1b {
        return None;
    }
    if pos + 1 >= bytes.len() {
        return None;
    }

    match bytes[pos + 1] {
        b'[' => extract_csi(bytes, pos),
        b']' => extract_string_terminated(bytes, pos, AnsiCodeKind::Osc),
        b'_' => extract_string_terminated(bytes, pos, AnsiCodeKind::Apc),
        b'P' => extract_string_terminated(bytes, pos, AnsiCodeKind::Dcs),
        b'O' => extract_ss3(bytes, pos),
        _ => None,
    }
}

fn extract_csi(bytes: &[u8], pos: usize) -> Option<AnsiCode> {
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if (0x40..=0x7e).contains(&bytes[idx]) {
            return Some(AnsiCode {
                length: idx + 1 - pos,
                kind: AnsiCodeKind::Csi,
            });
        }
        idx += 1;
    }
    None
}

fn extract_ss3(bytes: &[u8], pos: usize) -> Option<AnsiCode> {
    if pos + 2 >= bytes.len() || !bytes[pos + 2].is_ascii() {
        return None;
    }
    Some(AnsiCode {
        length: 3,
        kind: AnsiCodeKind::Ss3,
    })
}

fn extract_string_terminated(bytes: &[u8], pos: usize, kind: AnsiCodeKind) -> Option<AnsiCode> {
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            return Some(AnsiCode {
                length: idx + 1 - pos,
                kind,
            });
        }
        if bytes[idx] == 0x1b && idx + 1 < bytes.len() && bytes[idx + 1] == b'\\' {
            return Some(AnsiCode {
                length: idx + 2 - pos,
                kind,
            });
        }
        idx += 1;
    }
    None
}

/// Removes every recognized escape sequence from `input`.
pub fn strip_ansi(input: &str) -> String {
    if !input.contains('\x1b') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(code) = extract_ansi_code(input, idx) {
            idx += code.length;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{extract_ansi_code, strip_ansi, AnsiCodeKind};

    #[test]
    fn recognizes_sgr_sequences() {
        let input = "\x1b[1;36mhi";
        let code = extract_ansi_code(input, 0).expect("csi");
        assert_eq!(code.kind, AnsiCodeKind::Csi);
        assert_eq!(code.length, 7);
    }

    #[test]
    fn cursor_moves_are_csi() {
        let input = "\x1b[3Atail";
        let code = extract_ansi_code(input, 0).expect("csi");
        assert_eq!(code.kind, AnsiCodeKind::Csi);
        assert_eq!(code.length, 4);
    }

    #[test]
    fn osc8_with_st_terminator() {
        let input = "\x1b]8;;https://example.com\x1b\\link\x1b]8;;\x1b\\";
        assert_eq!(strip_ansi(input), "link");
    }

    #[test]
    fn unterminated_sequence_is_kept_as_text() {
        assert_eq!(strip_ansi("a\x1b[12"), "a\x1b[12");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_ansi("héllo"), "héllo");
    }
}
