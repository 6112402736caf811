//! Fixed prompt text shared by every model backend.

/// Soft length limit the segmenter is asked to respect per description.
pub const MAX_DESCRIPTION_CHARS: usize = 250;

/// Stylistic preamble prepended to every image prompt.
pub const STORYBOARD_STYLE_PREAMBLE: &str =
    "cinematic storyboard panel, high detail, dramatic lighting,";

/// Persona bound to every new assistant conversation.
pub const ASSISTANT_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant for screenwriters \
and film directors. Provide concise, creative, and constructive feedback or ideas. You can \
answer questions about script formatting, character development, plot, and visual storytelling.";

/// Build the segmentation request for `script`.
pub fn segmentation_prompt(script: &str) -> String {
    format!(
        "Analyze the following script and break it down into distinct scenes or shots that can \
be visualized for a storyboard.
For each scene, create a concise, descriptive prompt (under {MAX_DESCRIPTION_CHARS} characters) \
that an AI image generator can use.
Focus on key actions, characters, setting, and mood.
Return the result as a JSON array of objects, where each object has a \"description\" key.

Example output format:
[
    {{\"description\": \"A lone astronaut stands on a red, dusty Martian landscape, looking at two moons in the sky.\"}},
    {{\"description\": \"Close up on the astronaut's helmet, reflecting a distant Earth.\"}},
    {{\"description\": \"The astronaut plants a flag into the Martian soil, a small dust cloud rising.\"}}
]

Script to analyze:
---
{script}
---
"
    )
}

/// Build the image request for one scene description.
pub fn image_prompt(description: &str) -> String {
    format!("{STORYBOARD_STYLE_PREAMBLE} {description}")
}

/// Script offered to new users so they can try the flow immediately.
pub const SAMPLE_SCRIPT: &str = "SCENE START

INT. SPACESHIP COCKPIT - NIGHT

A lone ASTRONAUT, ELARA, sips coffee from a thermal mug. The cockpit is dark, illuminated only \
by the soft glow of distant nebulae on the main viewscreen.

CLOSE UP - ELARA'S EYES
They reflect the starfield, wide with a mix of wonder and weariness.

EXT. SPACESHIP - CONTINUOUS
The small ship, the \"Stardust Drifter,\" floats silently through the cosmic void. A vibrant, \
swirling galaxy looms in the background.

INT. SPACESHIP COCKPIT - CONTINUOUS
Suddenly, a red alert flashes across the control panel. Elara spills her coffee, eyes snapping \
to the warning display. A large, unknown object is approaching fast.

SCENE END";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segmentation_prompt_fences_the_script() {
        let prompt = segmentation_prompt("INT. KITCHEN - DAY");
        assert!(prompt.contains("---\nINT. KITCHEN - DAY\n---"));
        assert!(prompt.contains("under 250 characters"));
        assert!(prompt.contains("\"description\""));
    }

    #[test]
    fn image_prompt_starts_with_style_preamble() {
        assert_eq!(
            image_prompt("A ship drifts."),
            "cinematic storyboard panel, high detail, dramatic lighting, A ship drifts."
        );
    }

    #[test]
    fn sample_script_is_not_blank() {
        assert!(SAMPLE_SCRIPT.starts_with("SCENE START"));
        assert!(SAMPLE_SCRIPT.ends_with("SCENE END"));
    }
}
