use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::trace;

use super::lexer::{is_variable_name, tokenize, Token};

/// Per-render variable values, keyed by case-sensitive variable name.
pub type RenderContext = HashMap<String, String>;

/// Render a template using the thread-local RNG for spin selection.
///
/// Spin groups are resolved first, then `{{name}}` tokens in the resulting
/// text are replaced from `context`. Unknown variables and malformed tokens
/// are left in the output verbatim, so an in-progress edit always previews.
pub fn render(text: &str, context: &RenderContext) -> String {
    render_with_rng(text, context, &mut rand::thread_rng())
}

/// Same as [`render`], drawing spin choices from `rng`.
pub fn render_with_rng<R: Rng>(text: &str, context: &RenderContext, rng: &mut R) -> String {
    let spun = resolve_spin_groups(text, rng);
    substitute_variables(&spun, context)
}

/// Replace every spin group with one of its choices, picked uniformly.
/// Variable tokens are copied through untouched.
pub fn resolve_spin_groups<R: Rng>(text: &str, rng: &mut R) -> String {
    let mut out = String::with_capacity(text.len());
    for token in tokenize(text) {
        match token {
            Token::Literal(literal) => out.push_str(literal),
            Token::Spin { choices, .. } => {
                let index = rng.gen_range(0..choices.len());
                out.push_str(choices[index]);
            }
            Token::Variable { span, .. } => out.push_str(&text[span]),
        }
    }
    out
}

/// Replace `{{name}}` tokens whose name is present in `context`.
///
/// Spin groups are not resolved here; they pass through as written.
pub fn substitute_variables(text: &str, context: &RenderContext) -> String {
    let mut out = String::with_capacity(text.len());
    for token in tokenize(text) {
        match token {
            Token::Literal(literal) => out.push_str(literal),
            Token::Variable { name, span } => {
                match context.get(name).filter(|_| is_variable_name(name)) {
                    Some(value) => out.push_str(value),
                    None => {
                        trace!(variable = %name, "Leaving unresolved variable in place");
                        out.push_str(&text[span]);
                    }
                }
            }
            Token::Spin { span, .. } => out.push_str(&text[span]),
        }
    }
    out
}

/// Distinct variable names referenced as `{{name}}`, in first-seen order.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Variable { name, .. } if is_variable_name(name) => Some(name),
            _ => None,
        })
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Choice lists of every spin group with at least two options, left to right.
///
/// Choice order and duplicates are preserved since authors weight variants
/// by repeating them.
pub fn extract_spintext_options(text: &str) -> Vec<Vec<String>> {
    tokenize(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Spin { choices, .. } if choices.len() > 1 => {
                Some(choices.into_iter().map(str::to_string).collect())
            }
            _ => None,
        })
        .collect()
}
