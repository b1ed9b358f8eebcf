use fitroom_common::models::Garment;

const TRYON_TEMPLATE: &str = r#"You are a virtual try-on system that helps people try on clothes.

INPUT IMAGES
Image 0: the PERSON (base image). This defines the final framing and background.
Images 1..N: GARMENT CROPS (isolated clothing items). These are NOT people.

TASK
Generate ONE realistic photo of the SAME person from Image 0 wearing the garments from Images 1..N.

HARD CONSTRAINTS (must follow)
- Output must contain EXACTLY ONE person: the person from Image 0.
- Do NOT create a collage, grid, split-screen, side-by-side, or multiple panels.
- Do NOT return multiple variations in one image.
- Do NOT include the reference crops in the output.
- Keep the same camera framing, background, and aspect ratio as Image 0.

IDENTITY LOCK
- Preserve face, body shape, proportions, pose and skin tone.
- Do NOT beautify, slim, enlarge or modify the body.
- Do NOT change hairstyle.

GARMENT TRANSFER
- Use ONLY the garments from Images 1..N.
- Preserve each garment's color, pattern, silhouette, and length.
- Fit garments naturally with realistic folds and shadows.
- Apply correct layering: shirts under jackets; pants under tops; shoes on feet.

FAIL-SAFE
- If a garment crop is unclear or incomplete, skip it rather than hallucinating.
- If shoes are not clearly visible on the person in Image 0, skip shoes.

OUTPUT
Return ONE single photo-like image only. No text. No watermark."#;

/// One line per garment image, numbered from 1 since image 0 is the person.
pub fn garment_legend(garments: &[Garment]) -> String {
    garments
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let label = if !g.name.trim().is_empty() {
                g.name.as_str()
            } else {
                g.category.as_deref().unwrap_or("garment")
            };
            match g.category.as_deref() {
                Some(category) => format!("Image {}: {} ({})", i + 1, label, category),
                None => format!("Image {}: {}", i + 1, label),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_tryon_prompt(garments: &[Garment]) -> String {
    format!(
        "{TRYON_TEMPLATE}\n\nGARMENT LIST\nImage 0: the PERSON\n{}",
        garment_legend(garments)
    )
}
