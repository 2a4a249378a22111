use serde::{Deserialize, Serialize};

const FRAMING_CLAUSE: &str =
    "A chibi-style illustration of a young female character, 2–2.5 heads tall.";
const IDENTITY_LABEL: &str = "Character Identity:";
const FEATURES_LABEL: &str = "Unique Features:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptMode {
    #[serde(rename = "freeform")]
    Freeform,
    #[serde(rename = "chibi", alias = "structured")]
    Structured,
}

/// Inputs of the structured character builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterFields {
    pub identity: String,
    pub features: String,
    pub expression: String,
    pub action: String,
    pub appearance: String,
    pub outfit: String,
    pub style: String,
}

impl Default for CharacterFields {
    fn default() -> Self {
        Self {
            identity: String::new(),
            features: String::new(),
            expression: "嘴角微揚 / 溫柔自信的微笑".to_string(),
            action: "站立，稍微面向觀眾，雙手自然垂在身側".to_string(),
            appearance: "白皙皮膚，金色大眼，長長的銀色波浪捲髮，戴著草帽，上面有淺藍色緞帶和小藍花。"
                .to_string(),
            outfit: "白色V領細肩帶夏日洋裝，淺藍色扇形裙擺，搭配淺藍色護腕和鞋子。".to_string(),
            style: "柔和可愛的氛圍，粉嫩色調，柔和均勻的光線，乾淨的白色背景，極簡陰影。"
                .to_string(),
        }
    }
}

/// Produces the prompt text sent to the model. Pure; emptiness is checked by the caller.
pub fn compose_prompt(mode: PromptMode, freeform_text: &str, fields: &CharacterFields) -> String {
    match mode {
        PromptMode::Freeform => freeform_text.to_string(),
        PromptMode::Structured => compose_character_prompt(fields),
    }
}

pub fn compose_character_prompt(fields: &CharacterFields) -> String {
    let mut lines: Vec<String> = vec![
        FRAMING_CLAUSE.to_string(),
        format!("Pose: {}.", fields.action.trim()),
        format!("Expression: {}.", fields.expression.trim()),
        String::new(),
        format!("Appearance: {}", fields.appearance.trim()),
        format!("Outfit: {}", fields.outfit.trim()),
        String::new(),
    ];

    if let Some(identity) = non_blank(&fields.identity) {
        lines.push(format!("{IDENTITY_LABEL} {identity}"));
    }
    if let Some(features) = non_blank(&fields.features) {
        lines.push(format!("{FEATURES_LABEL} {features}"));
    }
    lines.push(fields.style.trim().to_string());

    lines.join("\n").trim().to_string()
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
