// Raw generator output -> one short sentence
use crate::errors::{RagError, Result};
use crate::generation::llama::GeneratorOutput;

const RESPONSE_MARKER: &str = "### Response:";
const CUT_MARKERS: [&str; 6] = ["\n", "(", "`", "[", "Response:", "Answer:"];

/// Extract the answer following the last `### Response:` marker.
///
/// Keeps text up to and including the first period, then drops anything from
/// the first artifact marker on. Output without the marker is an
/// `ExternalToolFailure` carrying whatever the generator printed.
pub fn clean_answer(output: &GeneratorOutput) -> Result<String> {
    let Some(position) = output.stdout.rfind(RESPONSE_MARKER) else {
        return Err(RagError::ExternalToolFailure {
            raw: raw_output(output),
        });
    };

    let mut answer = output.stdout[position + RESPONSE_MARKER.len()..].trim();
    if let Some(period) = answer.find('.') {
        answer = &answer[..=period];
    }
    for marker in CUT_MARKERS {
        if let Some(cut) = answer.find(marker) {
            answer = &answer[..cut];
        }
    }

    Ok(answer.trim().to_string())
}

fn raw_output(output: &GeneratorOutput) -> String {
    if !output.stdout.trim().is_empty() {
        output.stdout.clone()
    } else if !output.stderr.trim().is_empty() {
        output.stderr.clone()
    } else {
        "Model returned no output.".to_string()
    }
}
