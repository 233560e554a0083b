//! Submission validation.
//!
//! Checks run in order: emptiness, size, then the entry point. The entry
//! point check is structural: string literals and comments are blanked out,
//! then unindented `def main(...)` and `main = lambda ...:` bindings are
//! located and their parameter lists parsed. The last binding wins, as it
//! does at runtime.

use crate::error::ValidationError;

/// Maximum script length in characters.
pub const MAX_SCRIPT_CHARS: usize = 50_000;

/// Name of the function whose return value becomes the result.
pub const ENTRY_POINT: &str = "main";

/// Validate a submission without running it.
pub fn validate(script: &str) -> Result<(), ValidationError> {
    if script.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let len = script.chars().count();
    if len > MAX_SCRIPT_CHARS {
        return Err(ValidationError::TooLarge {
            len,
            max: MAX_SCRIPT_CHARS,
        });
    }

    match find_entry_point(script) {
        None => Err(ValidationError::MissingEntryPoint),
        Some(binding) if !binding.zero_arg => Err(ValidationError::EntryPointTakesArguments),
        Some(_) => Ok(()),
    }
}

/// A top-level binding of the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryBinding {
    /// Callable with no arguments.
    zero_arg: bool,
}

fn find_entry_point(script: &str) -> Option<EntryBinding> {
    let code = blank_literals(script);
    let mut found = None;

    let mut offset = 0;
    for line in code.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        if line.starts_with(|c: char| c.is_whitespace()) {
            continue;
        }

        if let Some(rest) = def_params_start(line) {
            let open = start + (line.len() - rest.len());
            if let Some(close) = matching_paren(&code, open) {
                found = Some(EntryBinding {
                    zero_arg: params_are_optional(&code[open + 1..close]),
                });
            }
        } else if let Some(rest) = lambda_params_start(line) {
            let params_start = start + (line.len() - rest.len());
            if let Some(colon) = find_top_level(&code[params_start..], ':') {
                found = Some(EntryBinding {
                    zero_arg: params_are_optional(&code[params_start..params_start + colon]),
                });
            }
        }
    }

    found
}

/// For `def main (`, returns the line from the `(` onwards.
fn def_params_start(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("def")?;
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let rest = after_identifier(rest.trim_start(), ENTRY_POINT)?;
    let rest = rest.trim_start();
    rest.starts_with('(').then_some(rest)
}

/// For `main = lambda`, returns the line after the `lambda` keyword.
fn lambda_params_start(line: &str) -> Option<&str> {
    let rest = after_identifier(line, ENTRY_POINT)?.trim_start();
    let rest = rest.strip_prefix('=')?;
    if rest.starts_with('=') {
        return None;
    }
    after_identifier(rest.trim_start(), "lambda")
}

/// Strip `ident` from the front of `text` if it is a whole identifier.
fn after_identifier<'a>(text: &'a str, ident: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(ident)?;
    if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(rest)
}

/// Index of the bracket closing the `(` at `open`.
fn matching_paren(code: &str, open: usize) -> Option<usize> {
    find_top_level(&code[open + 1..], ')').map(|idx| open + 1 + idx)
}

/// First occurrence of `target` outside nested brackets.
fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        if depth == 0 && c == target {
            return Some(idx);
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Whether every parameter in a (blanked) parameter list has a default.
fn params_are_optional(params: &str) -> bool {
    split_top_level(params, ',').into_iter().all(|param| {
        let param = param.trim();
        param.is_empty()
            || param == "/"
            || param.starts_with('*')
            || find_top_level(param, '=').is_some()
    })
}

fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(idx) = find_top_level(rest, sep) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// Replace the contents of string literals and comments with spaces.
///
/// Quotes and newlines are kept, so line structure and byte offsets of code
/// outside literals are preserved relative to each other.
fn blank_literals(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let blank = |c: char| if c == '\n' { '\n' } else { ' ' };

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(' ');
                    i += 1;
                }
            }
            '\'' | '"' => {
                let triple = i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c;
                let quote_len = if triple { 3 } else { 1 };
                for _ in 0..quote_len {
                    out.push(c);
                }
                i += quote_len;

                while i < chars.len() {
                    let d = chars[i];
                    if d == '\\' {
                        out.push(' ');
                        i += 1;
                        if i < chars.len() {
                            out.push(blank(chars[i]));
                            i += 1;
                        }
                        continue;
                    }
                    if triple {
                        if d == c && i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c
                        {
                            out.push_str(&c.to_string().repeat(3));
                            i += 3;
                            break;
                        }
                    } else if d == c {
                        out.push(c);
                        i += 1;
                        break;
                    } else if d == '\n' {
                        // Unterminated single-line string; let the interpreter report it.
                        break;
                    }
                    out.push(blank(d));
                    i += 1;
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}
