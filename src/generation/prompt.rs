// Prompt templates
use crate::config::Profile;
use crate::rag::Passage;

/// Instruction block for `profile`
fn instruction(profile: Profile, question: &str) -> String {
    match profile {
        Profile::Improved => format!(
            "Based strictly on the context above, answer this: {}\n\
             Answer in one short sentence. Do not cite sources.",
            question
        ),
        Profile::Simple => format!(
            "You are a database. Answer the user question in one short sentence using ONLY the context above.\n\
             If the answer is not in the context, say 'Data not available'.\n\
             Question: {}",
            question
        ),
        Profile::Legal => format!(
            "You are a legal assistant. Answer the user question in one short sentence using ONLY the context above.\n\
             If the answer is not in the context, say 'Data not available'.\n\
             Question: {}",
            question
        ),
    }
}

/// Full generator prompt; passages are joined with newlines as the context
pub fn build_prompt(profile: Profile, question: &str, passages: &[Passage]) -> String {
    let context = passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "### Context:\n{}\n\n### Instruction:\n{}\n\n### Response:",
        context,
        instruction(profile, question)
    )
}
