use crate::knowledge::KnowledgeBase;

/// Context budget the chat layer asks for per question.
pub const DEFAULT_CONTEXT_CHARS: usize = 2000;

/// Append retrieved standards context to a user question.
///
/// Blank context leaves the question untouched, so callers can pass the
/// knowledge base output straight through.
///
/// # Examples
///
/// ```
/// use aaoifi_kb::advisor::enrich_question;
///
/// assert_eq!(enrich_question("What is riba?", "", "AAOIFI Standards"), "What is riba?");
/// let enriched = enrich_question("What is riba?", "[AAOIFI Standards - Page 3]\nRiba is...", "AAOIFI Standards");
/// assert!(enriched.starts_with("What is riba?\n\n---\nRelevant context from AAOIFI Standards:\n"));
/// ```
pub fn enrich_question(
    question: &str,
    context: &str,
    document_name: &str,
) -> String {
    if context.trim().is_empty() {
        return question.to_string();
    }

    format!(
        "{question}\n\n---\nRelevant context from {document_name}:\n\
         {context}\n---\nPlease use the above {document_name} context to \
         inform your answer when relevant."
    )
}

/// Build the user message for `question` with whatever context the
/// knowledge base can offer.
pub fn build_user_message(
    knowledge: &KnowledgeBase,
    question: &str,
    max_chars: usize,
) -> String {
    let context = knowledge.get_relevant_context(question, max_chars);
    enrich_question(question, &context, &knowledge.config().document_name)
}
