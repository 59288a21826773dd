//! Splitting property strings into literal text and `{{ … }}` fragments.

pub const OPEN: &str = "{{";
pub const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// Source of an embedded expression, without the delimiters.
    Fragment(&'a str),
}

/// Split a property string into segments.
///
/// Fragment ends are found by brace depth, skipping string literals, so
/// object literals such as `{{ {a: {b: 1}} }}` stay intact. An unterminated
/// `{{` is treated as literal text.
pub fn split(source: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find(OPEN) {
        let body_start = start + OPEN.len();
        let Some(body_len) = fragment_len(&rest[body_start..]) else {
            break;
        };
        if start > 0 {
            segments.push(Segment::Text(&rest[..start]));
        }
        segments.push(Segment::Fragment(&rest[body_start..body_start + body_len]));
        rest = &rest[body_start + body_len + CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

/// Length of the fragment body up to its matching `}}`, if any.
fn fragment_len(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'{' => depth += 1,
            b'}' if depth == 0 => {
                if bytes.get(i + 1) == Some(&b'}') {
                    return Some(i);
                }
                return None;
            }
            b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Whether the string contains at least one complete fragment.
pub fn is_dynamic(source: &str) -> bool {
    split(source)
        .iter()
        .any(|segment| matches!(segment, Segment::Fragment(_)))
}

/// Fragment sources in order of appearance.
pub fn fragments(source: &str) -> Vec<&str> {
    split(source)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Fragment(body) => Some(body),
            Segment::Text(_) => None,
        })
        .collect()
}

/// If the whole (trimmed) string is exactly one fragment, return its body.
pub fn sole_fragment(source: &str) -> Option<&str> {
    match split(source.trim()).as_slice() {
        [Segment::Fragment(body)] => Some(body),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_no_fragments() {
        assert_eq!(split("hello"), vec![Segment::Text("hello")]);
        assert!(!is_dynamic("hello"));
    }

    #[test]
    fn mixed_text_and_fragments() {
        assert_eq!(
            split("Hi {{Input1.text}}!"),
            vec![
                Segment::Text("Hi "),
                Segment::Fragment("Input1.text"),
                Segment::Text("!"),
            ]
        );
    }

    #[test]
    fn nested_braces_stay_in_fragment() {
        assert_eq!(
            fragments("{{ {a: {b: 1}} }}"),
            vec![" {a: {b: 1}} "]
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        assert_eq!(fragments("{{ '}}' + A.b }}"), vec![" '}}' + A.b "]);
    }

    #[test]
    fn unterminated_open_is_literal() {
        assert_eq!(split("a {{ b"), vec![Segment::Text("a {{ b")]);
    }

    #[test]
    fn sole_fragment_ignores_surrounding_whitespace() {
        assert_eq!(sole_fragment("  {{ 1 + 1 }} "), Some(" 1 + 1 "));
        assert_eq!(sole_fragment("x{{1}}"), None);
    }
}
