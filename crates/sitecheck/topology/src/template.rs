//! Placeholder substitution for literal strings.
//!
//! Placeholders are `{name}`; `{{` and `}}` stand for literal braces.

use crate::params::TopologyParams;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TemplateError {
    Unresolved(String),
    Unterminated,
}

pub(crate) fn substitute(template: &str, params: &TopologyParams) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(TemplateError::Unterminated);
                }
                match params.lookup(&name) {
                    Some(value) => out.push_str(&value),
                    None => return Err(TemplateError::Unresolved(name)),
                }
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
