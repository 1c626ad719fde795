//! Spintext template engine.
//!
//! Templates mix literal text, spin groups (`{Olá|Oi}`, one choice picked at
//! random per render) and variables (`{{nome}}`, filled from a per-recipient
//! context). Everything here is pure text processing; nothing touches the
//! network or the relay.

pub mod engine;
pub mod lexer;
pub mod validation;

pub use engine::{
    extract_spintext_options, extract_variables, render, render_with_rng, RenderContext,
};
pub use validation::{validate, SpintextError, ValidationResult};
