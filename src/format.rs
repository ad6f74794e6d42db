//! Rendering of save payloads.
//!
//! Plain saves are stored verbatim. Answers from the language model are
//! stored as a small Markdown document:
//!
//! ```text
//! # <mode name>
//!
//! ## 入力
//!
//! <user input>
//!
//! ## AI回答
//!
//! <model output>
//! ```

const INPUT_HEADING: &str = "## 入力";
const ANSWER_HEADING: &str = "## AI回答";

/// Content for the save-only path.
pub fn format_plain(content: &str) -> String {
    content.to_string()
}

/// Question/answer document headed by the mode's display name.
pub fn format_qa(mode_name: &str, user_input: &str, model_output: &str) -> String {
    format!(
        "# {}\n\n{}",
        mode_name,
        format_qa_headerless(user_input, model_output)
    )
}

/// Question/answer document without the mode heading.
pub fn format_qa_headerless(user_input: &str, model_output: &str) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n{}\n",
        INPUT_HEADING, user_input, ANSWER_HEADING, model_output
    )
}
