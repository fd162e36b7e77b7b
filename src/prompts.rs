use serde_json::Value as JsonValue;

/// Sampling temperature for fresh recipes; favours variety.
pub const GENERATE_TEMPERATURE: f32 = 0.9;
/// Sampling temperature for edits; stays closer to the original.
pub const MODIFY_TEMPERATURE: f32 = 0.7;
/// Enough room for one full recipe object.
pub const MAX_TOKENS: u32 = 2000;

/// Caller-side cap on how many past titles go into the anti-duplication block.
pub const MAX_EXISTING_TITLES: usize = 10;

const RECIPE_SCHEMA: &str = r#"{
  "title": "Recipe Name/Name of Dish",
  "description": "A one sentence description",
  "cook_time": (int) total cook time in minutes,
  "tags": ["relevant tags (max 3)", ...],
  "ingredients": ["ingredient with quantity", ...],
  "steps": [
    {"step_number": 1, "instruction": "First step..."},
    {"step_number": 2, "instruction": "Second step..."}
  ],
  "macros": {
    "calories": (int) total calories,
    "protein": (int) grams of protein,
    "carbs": (int) grams of carbs,
    "fat": (int) grams of fat
  }
}"#;

fn avoid_block(existing_titles: &[String]) -> Option<String> {
    if existing_titles.is_empty() {
        return None;
    }
    let listed = existing_titles
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!(
        "IMPORTANT: The user has already generated these recipes:\n{listed}\n\n\
         You MUST generate something completely different from these recipes.\n\
         Do NOT create variations or similar dishes to the ones listed above.\n\
         Choose a different cuisine, cooking method, or main ingredient.\n\n"
    ))
}

/// Prompt for a brand-new recipe. The avoid-list block is left out entirely
/// when there are no previous titles.
#[must_use]
pub fn build_generate_prompt(preferences_text: &str, existing_titles: &[String]) -> String {
    let avoid = avoid_block(existing_titles).unwrap_or_default();
    format!(
        "{avoid}Generate a unique recipe based on these preferences:\n\
         {preferences_text}\n\n\
         Return ONLY valid JSON with this exact structure (no markdown, no extra text):\n\
         {RECIPE_SCHEMA}\n\n\
         Steps must be numbered consecutively starting at 1. All numbers must be non-negative integers.\n\
         Make the recipe realistic, achievable, and aligned with the preferences above.\n\
         Return ONLY the JSON object."
    )
}

/// Prompt for editing an existing recipe according to a free-text request.
#[must_use]
pub fn build_modify_prompt(original_recipe: &JsonValue, modification: &str) -> String {
    let original =
        serde_json::to_string_pretty(original_recipe).unwrap_or_else(|_| original_recipe.to_string());
    format!(
        "Here's a recipe:\n{original}\n\n\
         User wants to modify it: \"{modification}\"\n\n\
         Return ONLY the updated recipe as JSON with this exact structure, incorporating their changes:\n\
         {RECIPE_SCHEMA}\n\n\
         No markdown, just the JSON object."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generate_without_titles_has_no_avoid_block() {
        let p = build_generate_prompt("Effort: quick & easy", &[]);
        assert!(!p.contains("already generated"));
        assert!(!p.contains("IMPORTANT"));
        assert!(p.starts_with("Generate a unique recipe"));
        assert!(p.contains("Effort: quick & easy"));
        assert!(p.contains("\"step_number\""));
    }

    #[test]
    fn generate_lists_every_title_before_instructions() {
        let titles = vec![
            "Lemon Garlic Pasta".to_string(),
            "Thai Basil Chicken".to_string(),
            "Shakshuka".to_string(),
        ];
        let p = build_generate_prompt("Spice: very spicy", &titles);
        assert!(p.contains("already generated"));
        for t in &titles {
            assert!(p.contains(t.as_str()), "missing {t}");
        }
        let avoid_at = p.find("already generated").unwrap();
        let gen_at = p.find("Generate a unique recipe").unwrap();
        assert!(avoid_at < gen_at);
    }

    #[test]
    fn modify_embeds_original_and_instruction() {
        let original = json!({"title": "Beef Stew", "cook_time": 120});
        let p = build_modify_prompt(&original, "make it vegetarian");
        assert!(p.contains("\"title\": \"Beef Stew\""));
        assert!(p.contains("\"make it vegetarian\""));
        assert!(p.contains("\"macros\""));
        assert!(p.find("Beef Stew").unwrap() < p.find("make it vegetarian").unwrap());
    }
}
