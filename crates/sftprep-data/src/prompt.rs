//! Instruction prompt template.

/// Render an instruction/input/response triple into a single prompt.
///
/// ```
/// let prompt = sftprep_data::generate_prompt("Explain X", "Y", "Z");
/// assert_eq!(
///     prompt,
///     "### Instruction:\nExplain X\n\n### Input:\nY\n\n### Response:\nZ"
/// );
/// ```
///
/// Leading and trailing whitespace of the whole rendered block is stripped;
/// whitespace inside the fields is kept.
pub fn generate_prompt(instruction: &str, input: &str, response: &str) -> String {
    format!(
        "### Instruction:\n{instruction}\n\n### Input:\n{input}\n\n### Response:\n{response}"
    )
    .trim()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_fidelity() {
        let prompt = generate_prompt("Explain X", "Y", "Z");
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(
            lines,
            vec![
                "### Instruction:",
                "Explain X",
                "",
                "### Input:",
                "Y",
                "",
                "### Response:",
                "Z"
            ]
        );
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        let prompt = generate_prompt("Say hi", "", "Hi!\n\n  ");
        assert!(prompt.ends_with("### Response:\nHi!"));
    }

    #[test]
    fn test_empty_input_keeps_section() {
        let prompt = generate_prompt("Say hi", "", "Hi!");
        assert!(prompt.contains("### Input:\n\n\n### Response:"));
    }

    #[test]
    fn test_inner_whitespace_preserved() {
        let prompt = generate_prompt("  indented", "a\tb", "c");
        assert!(prompt.contains("\n  indented\n"));
        assert!(prompt.contains("a\tb"));
    }
}
