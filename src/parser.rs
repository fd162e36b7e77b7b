use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::GeneratedRecipe;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model output is not a recipe object: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("recipe has an empty title")]
    EmptyTitle,

    #[error("recipe has no steps")]
    NoSteps,

    #[error("step {position} is numbered {found}, expected {expected}")]
    StepNumbering {
        position: usize,
        found: u32,
        expected: u32,
    },
}

/// Strip a ```` ``` ```` / ```` ```json ```` wrapper if present.
/// An opening fence with no closing fence yields everything after the opening
/// one; the JSON decoder then has the final word.
#[must_use]
pub fn strip_code_fence(s: &str) -> &str {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        // body stops at the first closing fence or at end of input
        Regex::new(r"(?is)^```(?:json)?(.*?)(?:```|\z)").expect("static fence regex")
    });

    let trimmed = s.trim();
    FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str().trim())
}

/// Decode raw completion text into a validated recipe.
///
/// # Errors
///
/// Returns [`ParseError`] when the text is not the expected JSON object, a
/// required key is missing, a number is negative, or the steps are not
/// numbered `1..=n` in order.
pub fn parse_recipe(raw: &str) -> Result<GeneratedRecipe, ParseError> {
    let body = strip_code_fence(raw);
    let recipe: GeneratedRecipe = serde_json::from_str(body)?;
    validate(&recipe)?;
    Ok(recipe)
}

fn validate(recipe: &GeneratedRecipe) -> Result<(), ParseError> {
    if recipe.title.trim().is_empty() {
        return Err(ParseError::EmptyTitle);
    }
    if recipe.steps.is_empty() {
        return Err(ParseError::NoSteps);
    }
    for (position, (step, expected)) in recipe.steps.iter().zip(1u32..).enumerate() {
        if step.step_number != expected {
            return Err(ParseError::StepNumbering {
                position,
                found: step.step_number,
                expected,
            });
        }
    }
    Ok(())
}
