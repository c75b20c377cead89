//! Relaxed JSON support.
//!
//! Editor project files are "JSON with comments": `//` and `/* */` comments
//! and trailing commas are allowed. [`strip_jsonc`] rewrites such text into
//! strict JSON that `serde_json` accepts. String contents are never touched.

/// Remove comments and trailing commas from `input`.
///
/// Line structure is preserved (comments are dropped but their newlines are
/// kept) so `serde_json` error positions still point at the right line.
#[must_use]
pub fn strip_jsonc(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                i += 1;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse(input: &str) -> Value {
        serde_json::from_str(&strip_jsonc(input)).unwrap()
    }

    #[test]
    fn test_strict_json_unchanged() {
        let input = r#"{"folders": [{"path": "/a"}]}"#;
        assert_eq!(strip_jsonc(input), input);
    }

    #[test]
    fn test_line_comments() {
        let input = "{\n  // the folders\n  \"folders\": [] // none yet\n}";
        assert_eq!(parse(input), json!({"folders": []}));
    }

    #[test]
    fn test_block_comments() {
        let input = "{ /* multi\n line */ \"a\": 1 }";
        assert_eq!(parse(input), json!({"a": 1}));
    }

    #[test]
    fn test_trailing_commas() {
        let input = r#"{"folders": [{"path": "a",}, {"path": "b"},],}"#;
        assert_eq!(
            parse(input),
            json!({"folders": [{"path": "a"}, {"path": "b"}]})
        );
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let input = r#"{"url": "http://example.com/*x*/", "s": "a,]"}"#;
        assert_eq!(
            parse(input),
            json!({"url": "http://example.com/*x*/", "s": "a,]"})
        );
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let input = r#"{"q": "say \"hi\" // not a comment",}"#;
        assert_eq!(parse(input), json!({"q": "say \"hi\" // not a comment"}));
    }

    #[test]
    fn test_line_numbers_preserved() {
        let input = "// one\n// two\n{}";
        assert_eq!(strip_jsonc(input).lines().count(), 3);
    }
}
