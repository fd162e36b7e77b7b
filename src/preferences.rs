use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const fn default_level() -> i64 {
    2
}

/// The five 1–3 sliders the app exposes. Anything outside 1..=3 is kept as-is
/// and described with the level-2 phrase.
#[derive(Serialize, Deserialize, FromRow, Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserPreferences {
    #[serde(default = "default_level")]
    pub effort_level: i64,
    #[serde(default = "default_level")]
    pub skill_level: i64,
    #[serde(default = "default_level")]
    pub calorie_consciousness: i64,
    #[serde(default = "default_level")]
    pub protein_preference: i64,
    #[serde(default = "default_level")]
    pub spice_level: i64,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            effort_level: 2,
            skill_level: 2,
            calorie_consciousness: 2,
            protein_preference: 2,
            spice_level: 2,
        }
    }
}

const EFFORT: [&str; 3] = ["quick & easy", "moderate effort", "intricate dish"];
const SKILL: [&str; 3] = ["beginner-friendly", "intermediate", "advanced"];
const CALORIES: [&str; 3] = ["low-calorie", "moderate calories", "high-calorie"];
const PROTEIN: [&str; 3] = ["low-protein", "moderate protein", "high-protein"];
const SPICE: [&str; 3] = ["not spicy", "mildly spicy", "very spicy"];

const fn phrase(table: &[&'static str; 3], level: i64) -> &'static str {
    match level {
        1 => table[0],
        3 => table[2],
        _ => table[1],
    }
}

impl UserPreferences {
    /// Render the descriptor block fed into the generation prompt, one
    /// `Attribute: phrase` line per slider in a fixed order.
    #[must_use]
    pub fn to_prompt_string(&self) -> String {
        format!(
            "Effort: {}\nSkill: {}\nCalories: {}\nProtein: {}\nSpice: {}",
            phrase(&EFFORT, self.effort_level),
            phrase(&SKILL, self.skill_level),
            phrase(&CALORIES, self.calorie_consciousness),
            phrase(&PROTEIN, self.protein_preference),
            phrase(&SPICE, self.spice_level),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(level: i64) -> UserPreferences {
        UserPreferences {
            effort_level: level,
            skill_level: level,
            calorie_consciousness: level,
            protein_preference: level,
            spice_level: level,
        }
    }

    #[test]
    fn each_level_maps_to_its_phrase() {
        let low = uniform(1).to_prompt_string();
        assert_eq!(
            low,
            "Effort: quick & easy\nSkill: beginner-friendly\nCalories: low-calorie\nProtein: low-protein\nSpice: not spicy"
        );

        let mid = uniform(2).to_prompt_string();
        assert!(mid.contains("Effort: moderate effort"));
        assert!(mid.contains("Skill: intermediate"));
        assert!(mid.contains("Calories: moderate calories"));
        assert!(mid.contains("Protein: moderate protein"));
        assert!(mid.contains("Spice: mildly spicy"));

        let high = uniform(3).to_prompt_string();
        assert!(high.contains("Effort: intricate dish"));
        assert!(high.contains("Skill: advanced"));
        assert!(high.contains("Calories: high-calorie"));
        assert!(high.contains("Protein: high-protein"));
        assert!(high.contains("Spice: very spicy"));
    }

    #[test]
    fn out_of_range_falls_back_to_moderate() {
        let expected = uniform(2).to_prompt_string();
        for level in [0, -1, 4, 99, i64::MAX] {
            assert_eq!(uniform(level).to_prompt_string(), expected, "level {level}");
        }
    }

    #[test]
    fn lines_are_in_fixed_order() {
        let text = UserPreferences::default().to_prompt_string();
        let keys: Vec<&str> = text
            .lines()
            .map(|l| l.split(':').next().unwrap_or_default())
            .collect();
        assert_eq!(keys, ["Effort", "Skill", "Calories", "Protein", "Spice"]);
    }

    #[test]
    fn missing_fields_deserialize_to_level_two() {
        let p: UserPreferences = serde_json::from_str(r#"{"spice_level":3}"#).unwrap();
        assert_eq!(p.effort_level, 2);
        assert_eq!(p.spice_level, 3);
    }
}
