use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::lexer::{is_variable_name, tokenize, Token};

/// Lexical problems found in a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpintextError {
    #[error("Closing brace '}}' without a matching opening brace")]
    ExtraClosingBrace,

    #[error("Unbalanced braces: missing closing brace '}}'")]
    UnbalancedBraces,

    #[error("Variables must use double braces: {}", suggest_double_braces(.0))]
    SingleBraceVariables(Vec<String>),

    #[error("Spin groups need at least two options separated by '|': {}", wrap_groups(.0))]
    SingleOptionGroups(Vec<String>),
}

fn suggest_double_braces(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("{{{name}}} → {{{{{name}}}}}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn wrap_groups(bodies: &[String]) -> String {
    bodies
        .iter()
        .map(|body| format!("{{{body}}}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of [`validate`], in the shape the template editor consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), SpintextError>> for ValidationResult {
    fn from(result: Result<(), SpintextError>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                error: None,
            },
            Err(e) => Self {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Static syntax check of a template. Does not look at any render context.
pub fn validate(text: &str) -> ValidationResult {
    check(text).into()
}

/// Run the checks in order and stop at the first failing one.
pub fn check(text: &str) -> Result<(), SpintextError> {
    check_brace_balance(text)?;

    let mut single_brace_vars = Vec::new();
    let mut single_option_groups = Vec::new();

    for token in tokenize(text) {
        let Token::Spin { choices, span } = token else {
            continue;
        };
        if choices.len() > 1 {
            continue;
        }

        let body = choices[0];
        let doubled = text[..span.start].ends_with('{') || text[span.end..].starts_with('}');
        if is_variable_name(body) {
            // `{{name}` / `{name}}` are caught by the balance check above
            if !doubled {
                single_brace_vars.push(body.to_string());
            }
        } else {
            single_option_groups.push(body.to_string());
        }
    }

    if !single_brace_vars.is_empty() {
        return Err(SpintextError::SingleBraceVariables(single_brace_vars));
    }
    if !single_option_groups.is_empty() {
        return Err(SpintextError::SingleOptionGroups(single_option_groups));
    }
    Ok(())
}

fn check_brace_balance(text: &str) -> Result<(), SpintextError> {
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(SpintextError::ExtraClosingBrace);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SpintextError::UnbalancedBraces);
    }
    Ok(())
}
