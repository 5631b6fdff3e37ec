//! The cross-TU dedup key: a hash over a function's span with comments stripped and whitespace
//! collapsed. No token rewriting, no constant folding — purely lexical normalization.

use reforge_common::Sha256Hex;

/// Strips `//` and `/* */` comments (ignoring them inside string/char literals) and collapses
/// any run of whitespace to a single space.
fn normalize(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut i = 0;
    let mut in_string: Option<u8> = None;
    let mut prev_was_space = false;

    while i < text.len() {
        let b = text[i];

        if let Some(quote) = in_string {
            out.push(b);
            if b == b'\\' && i + 1 < text.len() {
                out.push(text[i + 1]);
                i += 2;
                continue;
            }
            if b == quote {
                in_string = None;
            }
            i += 1;
            prev_was_space = false;
            continue;
        }

        match b {
            b'"' | b'\'' => {
                in_string = Some(b);
                out.push(b);
                i += 1;
                prev_was_space = false;
            }
            b'/' if text.get(i + 1) == Some(&b'/') => {
                while i < text.len() && text[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if text.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < text.len() && !(text[i] == b'*' && text[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(text.len());
            }
            b if b.is_ascii_whitespace() => {
                if !prev_was_space {
                    out.push(b' ');
                    prev_was_space = true;
                }
                i += 1;
            }
            _ => {
                out.push(b);
                prev_was_space = false;
                i += 1;
            }
        }
    }

    while out.last() == Some(&b' ') {
        out.pop();
    }
    while out.first() == Some(&b' ') {
        out.remove(0);
    }

    out
}

pub fn context_hash(raw_text: &[u8]) -> Sha256Hex {
    Sha256Hex::of_bytes(&normalize(raw_text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_after_comment_stripping_yields_same_hash() {
        let a = b"int f(void) {\n  // comment\n  return 1;\n}";
        let b = b"int f(void) { return 1; }";
        assert_eq!(context_hash(a), context_hash(b));
    }

    #[test]
    fn block_comment_is_stripped() {
        let a = b"int f() { /* hi */ return 1; }";
        let b = b"int f() {  return 1; }";
        assert_eq!(context_hash(a), context_hash(b));
    }

    #[test]
    fn string_literal_contents_are_preserved() {
        let a = b"char *f() { return \"// not a comment\"; }";
        let normalized = normalize(a);
        assert!(std::str::from_utf8(&normalized)
            .unwrap()
            .contains("// not a comment"));
    }

    #[test]
    fn differing_code_yields_different_hash() {
        assert_ne!(context_hash(b"return 1;"), context_hash(b"return 2;"));
    }
}
