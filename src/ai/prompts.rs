/// System prompt framing every text summary request
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Instruction prepended to text content
pub const DEFAULT_SUMMARY_PROMPT: &str = "Summarize this content";

/// Instruction sent alongside an image
pub const DEFAULT_DESCRIPTION_PROMPT: &str = "What’s in this image?";

/// Join an instruction and its input with a blank line.
///
/// An empty instruction yields the input unchanged.
pub fn compose(prompt: &str, input: &str) -> String {
    if prompt.trim().is_empty() {
        return input.to_string();
    }

    let mut composed = String::with_capacity(prompt.len() + input.len() + 2);
    composed.push_str(prompt);
    composed.push_str("\n\n");
    composed.push_str(input);
    composed
}
