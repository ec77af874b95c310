//! Prompt assembly for suggestion and preview requests.
//!
//! Both providers share these templates; provider-specific bits (image
//! attachment encoding, response format plumbing) stay in the clients.

use std::fmt::Write as _;

use serde_json::Value;

use crate::domain::models::{BodyMeasurements, Clothing, MatchRecord, Member, OutputLanguage};

/// Size-data keys surfaced to the model, in a stable order.
const SIZE_FIELDS: [&str; 9] = [
    "shoulderWidthCm",
    "bustCm",
    "waistCm",
    "hipCm",
    "lengthCm",
    "sleeveLengthCm",
    "inseamCm",
    "topSize",
    "bottomSize",
];

/// How many history entries are embedded for context.
pub const HISTORY_PROMPT_LIMIT: usize = 10;

/// Build the outfit-suggestion prompt.
pub fn build_suggestion_prompt(
    member: &Member,
    candidates: &[Clothing],
    history: &[MatchRecord],
    scene: Option<&str>,
    language: OutputLanguage,
) -> String {
    let m = member.measurements();

    let mut clothing_lines = String::new();
    for clothing in candidates {
        clothing_lines.push_str(&clothing_line(clothing));
        clothing_lines.push('\n');
    }

    let history_lines = if history.is_empty() {
        "- none".to_string()
    } else {
        history
            .iter()
            .take(HISTORY_PROMPT_LIMIT)
            .map(|record| {
                format!(
                    "- {{clothingId:{}, score:{}}}",
                    record.clothing_id,
                    opt_i32(record.performance_score)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a fashion recommendation assistant for livestream styling.\n\
         Output JSON object only, no markdown.\n\
         JSON object must contain field:\n\
         - outfits(array of recommendation items)\n\
         Each recommendation item must have fields:\n\
         - topClothingId(number)\n\
         - bottomClothingId(number)\n\
         - score(number 0-100)\n\
         - reason(string)\n\
         \n\
         Member profile:\n\
         - name: {name}\n\
         - heightCm: {height}, weightKg: {weight}, bodyShape: {shape}\n\
         - shoulderWidthCm: {shoulder}, bustCm: {bust}, waistCm: {waist}, hipCm: {hip}\n\
         - memberTopSize: {top_size}, memberBottomSize: {bottom_size}\n\
         - styleTags: {style_tags}\n\
         - scene: {scene}\n\
         \n\
         Candidate clothing (evaluate style and size fitness against member measurements):\n\
         {clothing_lines}\
         \n\
         Recent history:\n\
         {history_lines}\n\
         \n\
         Rules:\n\
         1) Use candidate IDs listed above only.\n\
         2) Every recommendation must be a valid TOP + BOTTOM pair.\n\
         3) Return up to 8 valid outfits, ranked by score descending.\n\
         4) Clothing items can be reused across different outfits to provide more options.\n\
         5) Keep score in [0, 100].\n\
         6) Prioritize diverse style combinations and good size fit.\n\
         7) Consider size compatibility: compare clothing measurements with member body measurements.\n\
         8) In reason field, mention size fit assessment (e.g., \"Shoulder width 38cm fits member 39cm well\").\n\
         9) The reason field must be written in {language}.\n",
        name = member.name,
        height = opt_f64(m.height_cm),
        weight = opt_f64(m.weight_kg),
        shape = opt_str(m.body_shape.as_deref()),
        shoulder = opt_f64(m.shoulder_width_cm),
        bust = opt_f64(m.bust_cm),
        waist = opt_f64(m.waist_cm),
        hip = opt_f64(m.hip_cm),
        top_size = opt_str(m.top_size.as_deref()),
        bottom_size = opt_str(m.bottom_size.as_deref()),
        style_tags = opt_str(member.style_tags.as_deref()),
        scene = opt_str(scene),
        clothing_lines = clothing_lines,
        history_lines = history_lines,
        language = language.prompt_label(),
    )
}

/// Build the styled-preview prompt for a selected outfit.
pub fn build_preview_prompt(
    member: &Member,
    selected: &[Clothing],
    scene: Option<&str>,
    language: OutputLanguage,
) -> String {
    let m = member.measurements();

    let mut clothing_lines = String::new();
    for clothing in selected {
        let _ = writeln!(
            clothing_lines,
            "- {{name:\"{}\", imageUrl:\"{}\", styleTags:\"{}\", clothingType:{}}}",
            clothing.name,
            opt_str(clothing.image_url.as_deref()),
            opt_str(clothing.style_tags.as_deref()),
            clothing.clothing_type.as_str(),
        );
    }

    format!(
        "You are a livestream fashion stylist.\n\
         Generate an outfit preview as JSON object only with fields:\n\
         title, outfitDescription, imagePrompt.\n\
         \n\
         Member:\n\
         - name: {name}\n\
         - bodyProfile: {{heightCm:{height}, weightKg:{weight}, bodyShape:{shape}}}\n\
         - memberTopSize: {top_size}\n\
         - memberBottomSize: {bottom_size}\n\
         - styleTags: {style_tags}\n\
         - scene: {scene}\n\
         \n\
         Selected outfit pieces metadata:\n\
         {clothing_lines}\
         \n\
         Constraints:\n\
         1) Keep title within 10 words.\n\
         2) outfitDescription should be 1-2 sentences.\n\
         3) Use the attached member and clothing reference images as the visual ground truth.\n\
         4) imagePrompt must describe a realistic virtual try-on composite showing the member wearing the selected outfit.\n\
         5) Output strict JSON only, without markdown.\n\
         6) title, outfitDescription, and imagePrompt must all be written in {language}.\n",
        name = member.name,
        height = opt_f64(m.height_cm),
        weight = opt_f64(m.weight_kg),
        shape = opt_str(m.body_shape.as_deref()),
        top_size = opt_str(m.top_size.as_deref()),
        bottom_size = opt_str(m.bottom_size.as_deref()),
        style_tags = opt_str(member.style_tags.as_deref()),
        scene = opt_str(scene),
        clothing_lines = clothing_lines,
        language = language.prompt_label(),
    )
}

fn clothing_line(clothing: &Clothing) -> String {
    let mut line = format!(
        "- {{id:{}, name:\"{}\", type:{}, styleTags:\"{}\"",
        clothing.id,
        clothing.name,
        clothing.clothing_type.as_str(),
        opt_str(clothing.style_tags.as_deref()),
    );

    if let Some(size_map) = parse_size_data(clothing.size_data.as_deref()) {
        let mut fields = Vec::new();
        for key in SIZE_FIELDS {
            if let Some(value) = size_map.get(key) {
                fields.push(format!("{key}:{}", render_value(value)));
            }
        }
        if !fields.is_empty() {
            let _ = write!(line, ", size:{{{}}}", fields.join(", "));
        }
    }

    line.push('}');
    line
}

fn parse_size_data(raw: Option<&str>) -> Option<serde_json::Map<String, Value>> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn opt_str(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_i32(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
