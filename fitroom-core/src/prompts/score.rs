use serde::Serialize;
use serde_json::Value;
use fitroom_common::models::Garment;

const SCORE_TEMPLATE: &str = r#"You are a strict fashion/styling scoring engine.

TASK:
Score the outfit composed of the provided garments for the given person's body profile and occasion.
Return ONLY valid JSON that matches the required schema. No markdown. No extra text. No code fences.

INPUT FORMAT:
You will receive a JSON object with:
- avatarProfile: the person's body/appearance classification (shoulder width, hip ratio, waist definition, body shape, volume, undertone, contrast, etc.)
- occasion: the event/context the outfit is intended for (e.g. casual, work, formal, date, sport, party)
- garments: array of garment objects. Each garment has:
  - name: garment name (may be null)
  - category: garment category (may be null)
  - garmentProfile: detailed garment profile (may be null if not analyzed yet)

SCORING CRITERIA (0-100 for each):

1. fit_balance: how well the garment silhouettes balance the body proportions.
   Consider shoulder width, hip ratio, waist definition, body volume.
2. proportions: how garment lengths and cuts affect perceived proportions.
   Consider torso_vs_legs, verticality, garment lengths, rise heights.
3. color_harmony: how the garment colors work with the person's coloring and with each other.
   Consider undertone, contrast_level and garment colors.
4. occasion_match: how appropriate the outfit is for the stated occasion.
   Perfect occasion alignment = 90-100.
5. season_material: how appropriate the materials are (weight, breathability, layering).
   If garment profiles are missing, default to 60 and note it in "why".
6. overall: roughly fit_balance*0.25 + proportions*0.2 + color_harmony*0.2 + occasion_match*0.2 + season_material*0.15,
   adjusted by at most 5 points for overall cohesion.

VERDICT:
- "great": overall >= 75
- "ok": 50 <= overall < 75
- "not_recommended": overall < 50

MISSING DATA HANDLING:
- If a garment has no garmentProfile, lower the affected scores by 10-20 points and say so in "why".
- If avatarProfile has many "unknown" fields, lower confidence in related scores and explain in "why".

OUTPUT SCHEMA (strict):
{
  "scores": {
    "fit_balance": integer 0-100,
    "proportions": integer 0-100,
    "color_harmony": integer 0-100,
    "occasion_match": integer 0-100,
    "season_material": integer 0-100,
    "overall": integer 0-100
  },
  "verdict": "great" | "ok" | "not_recommended",
  "why": string[] (1-8 items),
  "improvements": string[] (1-8 items),
  "alternatives": string[] (0-6 items)
}

Now analyze the provided input and respond with JSON only."#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreGarment<'a> {
    pub name: Option<&'a str>,
    pub category: Option<&'a str>,
    pub garment_profile: Option<&'a Value>,
}

impl<'a> From<&'a Garment> for ScoreGarment<'a> {
    fn from(g: &'a Garment) -> Self {
        Self {
            name: Some(g.name.as_str()).filter(|n| !n.is_empty()),
            category: g.category.as_deref(),
            garment_profile: g.profile.as_ref(),
        }
    }
}

/// Data block appended under `INPUT:`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInput<'a> {
    pub avatar_profile: &'a Value,
    pub occasion: &'a str,
    pub garments: Vec<ScoreGarment<'a>>,
}

impl<'a> ScoreInput<'a> {
    pub fn new(avatar_profile: &'a Value, occasion: &'a str, garments: &'a [Garment]) -> Self {
        Self {
            avatar_profile,
            occasion,
            garments: garments.iter().map(ScoreGarment::from).collect(),
        }
    }
}

pub fn build_score_prompt(input: &ScoreInput<'_>) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(input)?;
    Ok(format!("{SCORE_TEMPLATE}\n\nINPUT:\n{data}"))
}
