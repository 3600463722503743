//! Mechanical JSON repair shared by the translation chunker and the
//! quality evaluator.
//!
//! Three bounded fixes, applied in order: close an unterminated string,
//! close unterminated objects/arrays by brace-depth counting, trim
//! trailing commas. Each fix is tried independently against the original
//! input; the first candidate that parses wins.

pub fn try_repair(raw: &str) -> Option<String> {
    let candidates = [
        close_unterminated_string(raw),
        close_unbalanced_braces(raw),
        trim_trailing_commas(raw),
    ];
    for candidate in candidates.into_iter().flatten() {
        if serde_json::from_str::<serde_json::Value>(&candidate).is_ok() {
            return Some(candidate);
        }
    }
    None
}

fn close_unterminated_string(raw: &str) -> Option<String> {
    let mut in_string = false;
    let mut escaped = false;
    for c in raw.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        }
    }
    if in_string {
        Some(format!("{raw}\""))
    } else {
        None
    }
}

fn close_unbalanced_braces(raw: &str) -> Option<String> {
    let mut depth_brace = 0i32;
    let mut depth_bracket = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for c in raw.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth_brace += 1,
            '}' => depth_brace -= 1,
            '[' => depth_bracket += 1,
            ']' => depth_bracket -= 1,
            _ => {}
        }
    }
    if depth_brace <= 0 && depth_bracket <= 0 {
        return None;
    }
    let mut repaired = raw.to_string();
    for _ in 0..depth_bracket.max(0) {
        repaired.push(']');
    }
    for _ in 0..depth_brace.max(0) {
        repaired.push('}');
    }
    Some(repaired)
}

fn trim_trailing_commas(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let bytes: Vec<char> = raw.chars().collect();
    let mut changed = false;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == ',' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_whitespace() {
                j += 1;
            }
            if j < bytes.len() && (bytes[j] == '}' || bytes[j] == ']') {
                changed = true;
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    if changed {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_unterminated_string() {
        let raw = r#"["hello, "world"#;
        let repaired = close_unterminated_string(raw).unwrap();
        assert!(repaired.ends_with('"'));
    }

    #[test]
    fn closes_unbalanced_array() {
        let raw = r#"["a", "b""#;
        let repaired = try_repair(raw).expect("should repair");
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn trims_trailing_comma() {
        let raw = r#"["a", "b",]"#;
        let repaired = trim_trailing_commas(raw).unwrap();
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn gives_up_on_hopeless_input() {
        assert!(try_repair("not json at all {{{").is_none());
    }
}
