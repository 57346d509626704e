//! Literal decoding and JSON-to-source rendering.

use serde_json::Value;

/// Decode a quoted JavaScript string literal (quotes included) to its value.
pub fn decode_string(raw: &str) -> String {
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { raw };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    let mut pending_high: Option<u32> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            break;
        };
        let code = match esc {
            'n' => Some('\n' as u32),
            't' => Some('\t' as u32),
            'r' => Some('\r' as u32),
            'b' => Some(0x08),
            'f' => Some(0x0c),
            'v' => Some(0x0b),
            'x' => read_hex(&mut chars, 2),
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut digits = String::new();
                    for d in chars.by_ref() {
                        if d == '}' {
                            break;
                        }
                        digits.push(d);
                    }
                    u32::from_str_radix(&digits, 16).ok()
                } else {
                    read_hex(&mut chars, 4)
                }
            }
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                let limit = if esc <= '3' { 2 } else { 1 };
                for _ in 0..limit {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                Some(value)
            }
            // Line continuations contribute nothing.
            '\n' | '\u{2028}' | '\u{2029}' => None,
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                None
            }
            other => Some(other as u32),
        };
        if let Some(code) = code {
            push_code_unit(&mut out, &mut pending_high, code);
        }
    }
    flush_surrogate(&mut out, &mut pending_high);
    out
}

fn read_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars.peek().and_then(|c| c.to_digit(16))?;
        chars.next();
        value = value * 16 + digit;
    }
    Some(value)
}

fn push_code_unit(out: &mut String, pending_high: &mut Option<u32>, code: u32) {
    if (0xD800..0xDC00).contains(&code) {
        flush_surrogate(out, pending_high);
        *pending_high = Some(code);
        return;
    }
    if (0xDC00..0xE000).contains(&code) {
        if let Some(high) = pending_high.take() {
            let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
            out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
        } else {
            out.push(char::REPLACEMENT_CHARACTER);
        }
        return;
    }
    flush_surrogate(out, pending_high);
    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u32>) {
    if pending_high.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

/// Decode a numeric literal. Returns `None` for BigInt literals.
pub fn decode_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    if cleaned.ends_with('n') {
        return None;
    }
    let lower = cleaned.to_ascii_lowercase();
    if let Some(digits) = lower.strip_prefix("0x") {
        return parse_radix(digits, 16);
    }
    if let Some(digits) = lower.strip_prefix("0o") {
        return parse_radix(digits, 8);
    }
    if let Some(digits) = lower.strip_prefix("0b") {
        return parse_radix(digits, 2);
    }
    if lower.len() > 1 && lower.starts_with('0') && lower.chars().all(|c| c.is_ascii_digit()) {
        // Legacy octal, unless a digit rules it out.
        if lower.chars().all(|c| c < '8') {
            return parse_radix(&lower[1..], 8);
        }
    }
    lower.parse::<f64>().ok()
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0f64;
    for c in digits.chars() {
        value = value * f64::from(radix) + f64::from(c.to_digit(radix)?);
    }
    Some(value)
}

/// True when `name` can be written as a bare property key.
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '$' || c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '$' || c == '_' || c.is_alphanumeric())
}

/// Render a JSON value as a JavaScript expression.
///
/// Object keys are written bare when they are valid identifier names so the
/// output reads like hand-written source.
pub fn json_to_js(value: &Value) -> String {
    let mut out = String::new();
    write_json(&mut out, value);
    out
}

fn write_json(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&quote(s)),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_json(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push(' ');
                if is_identifier_name(key) {
                    out.push_str(key);
                } else {
                    out.push_str(&quote(key));
                }
                out.push_str(": ");
                write_json(out, item);
            }
            out.push_str(" }");
        }
    }
}

/// Double-quoted string literal for `s`.
pub fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}
