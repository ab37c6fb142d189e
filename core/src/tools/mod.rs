mod chat;
mod explain_code;
mod generate_code;
mod generate_image;
mod pdf;
mod search;

pub use chat::ChatTool;
pub use explain_code::ExplainCodeTool;
pub use generate_code::GenerateCodeTool;
pub use generate_image::GenerateImageTool;
pub use pdf::PdfTool;
pub use search::SearchTool;

/// Marker the executor appends before the current user message when it
/// builds a tool's input blob.
pub const USER_QUESTION_MARKER: &str = "سؤال المستخدم:";

/// The text after the last marker, or the whole input when the marker is
/// absent (a tool invoked outside the executor).
pub fn extract_user_question(input: &str) -> &str {
    match input.rfind(USER_QUESTION_MARKER) {
        Some(idx) => input[idx + USER_QUESTION_MARKER.len()..].trim(),
        None => input.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_after_last_marker() {
        let input = format!(
            "[user]\nسؤال المستخدم: قديم\n\n{USER_QUESTION_MARKER}\nاشرح الكود ده"
        );
        assert_eq!(extract_user_question(&input), "اشرح الكود ده");
    }

    #[test]
    fn falls_back_to_whole_input() {
        assert_eq!(extract_user_question("  مرحبا  "), "مرحبا");
    }
}
