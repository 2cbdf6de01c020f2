//! Analysis prompt assembly.

const ANALYSIS_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/opportunity_analysis.md"
));

/// Fill the analysis template for one description.
///
/// Double quotes in the description are swapped for single quotes so the
/// quoted block in the prompt stays unambiguous.
pub fn build_prompt(thesis: &str, description: &str, scale_max: f64) -> String {
    ANALYSIS_PROMPT
        .replace("{thesis}", thesis.trim())
        .replace("{scale_max}", &format_scale(scale_max))
        .replace("{description}", &description.trim().replace('"', "'"))
}

fn format_scale(scale_max: f64) -> String {
    if scale_max.fract().abs() < f64::EPSILON {
        format!("{scale_max:.0}")
    } else {
        scale_max.to_string()
    }
}
