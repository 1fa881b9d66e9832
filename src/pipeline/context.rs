//! Instruction assembly: full-context stuffing.
//!
//! Every held document is always embedded in the instruction, in held
//! order, regardless of size or relevance. This trades scalability
//! (bounded by the model's input window) for perfect recall within that
//! window; there is no retrieval step. Pure functions only.

use crate::models::IngestedDocument;

/// English text averages ~4 chars/token for subword tokenizers.
const CHARS_PER_TOKEN: usize = 4;

/// Advertised input window of the target model, for usage readouts only.
/// Nothing here enforces it; the remote service is the enforcement point.
pub const MODEL_INPUT_TOKEN_LIMIT: usize = 1_000_000;

/// The exact sentence the model must emit when the documents do not
/// contain the answer.
pub const NO_ANSWER_FALLBACK: &str =
    "I cannot find information regarding this in the uploaded files.";

/// Role declaration and grounding rules, prepended to the document blocks.
const INSTRUCTION_HEADER: &str = r#"You are a highly intelligent Knowledge Base Assistant.
Your goal is to answer the user's questions strictly based on the provided <DOCUMENT> blocks.

RULES:
1. Use ONLY the information in the provided documents to answer.
2. If the answer is not in the documents, say "I cannot find information regarding this in the uploaded files."
3. Cite the document title when you reference specific facts (e.g., [Schedule.txt]).
4. Be concise and professional.
5. You can use markdown for formatting tables, lists, and code.

CONTEXT LIBRARY:
"#;

/// Build the full system instruction for the current document set.
///
/// Deterministic: same documents in the same order produce the same text.
/// With no documents the context library is simply empty; the rule set is
/// still emitted so the model falls back honestly.
pub fn build_instruction(documents: &[IngestedDocument]) -> String {
    let blocks = documents
        .iter()
        .map(format_document)
        .collect::<Vec<_>>()
        .join("\n");

    format!("{INSTRUCTION_HEADER}{blocks}")
}

fn format_document(doc: &IngestedDocument) -> String {
    format!(
        "<DOCUMENT>\n  <TITLE>{}</TITLE>\n  <CONTENT>\n{}\n  </CONTENT>\n</DOCUMENT>\n",
        doc.name, doc.content
    )
}

/// Rough token count of the stuffed context, for the usage readout.
pub fn estimate_tokens(documents: &[IngestedDocument]) -> usize {
    let total_chars: usize = documents.iter().map(|d| d.content.len()).sum();
    total_chars / CHARS_PER_TOKEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn doc(name: &str, content: &str) -> IngestedDocument {
        IngestedDocument {
            id: Uuid::new_v4(),
            name: name.to_string(),
            content: content.to_string(),
            mime_hint: "text/plain".to_string(),
            size_bytes: content.len() as u64,
        }
    }

    #[test]
    fn instruction_contains_every_document_verbatim() {
        let docs = vec![
            doc("policy.txt", "Refunds within 30 days."),
            doc("faq.md", "# FAQ\nShipping takes 3 days."),
        ];
        let instruction = build_instruction(&docs);

        assert!(instruction.contains("<TITLE>policy.txt</TITLE>"));
        assert!(instruction.contains("Refunds within 30 days."));
        assert!(instruction.contains("<TITLE>faq.md</TITLE>"));
        assert!(instruction.contains("# FAQ\nShipping takes 3 days."));
    }

    #[test]
    fn documents_appear_in_held_order() {
        let docs = vec![doc("first.txt", "alpha"), doc("second.txt", "beta")];
        let instruction = build_instruction(&docs);

        let first = instruction.find("first.txt").unwrap();
        let second = instruction.find("second.txt").unwrap();
        assert!(first < second);
    }

    #[test]
    fn empty_document_set_still_emits_rules() {
        let instruction = build_instruction(&[]);

        assert!(instruction.contains("Knowledge Base Assistant"));
        assert!(instruction.contains(NO_ANSWER_FALLBACK));
        assert!(instruction.ends_with("CONTEXT LIBRARY:\n"));
        assert!(!instruction.contains("<DOCUMENT>"));
    }

    #[test]
    fn rule_set_is_ordered_and_complete() {
        let instruction = build_instruction(&[]);

        for rule in [
            "1. Use ONLY the information",
            "2. If the answer is not in the documents",
            "3. Cite the document title",
            "4. Be concise and professional",
            "5. You can use markdown",
        ] {
            assert!(instruction.contains(rule), "missing rule: {rule}");
        }
    }

    #[test]
    fn deterministic_for_same_input() {
        let docs = vec![doc("a.txt", "same"), doc("b.txt", "thing")];
        assert_eq!(build_instruction(&docs), build_instruction(&docs));
    }

    #[test]
    fn token_estimate_uses_four_chars_per_token() {
        let docs = vec![doc("a.txt", &"x".repeat(400)), doc("b.txt", &"y".repeat(200))];
        assert_eq!(estimate_tokens(&docs), 150);
        assert_eq!(estimate_tokens(&[]), 0);
    }
}
