const DELIMITER: &str = "--------------------------------";

/// Frames the documents and the question into the single prompt sent to the
/// model. Documents are joined with no separator and are not escaped.
pub fn compose_prompt<S: AsRef<str>>(docs: &[S], question: &str) -> String {
    let body_len: usize = docs.iter().map(|d| d.as_ref().len()).sum();
    let mut prompt = String::with_capacity(body_len + question.len() + 256);

    prompt.push_str("Answer the user's question based only on the following documents (from uploaded files):\n\n");
    prompt.push_str(DELIMITER);
    prompt.push('\n');
    for doc in docs {
        prompt.push_str(doc.as_ref());
    }
    prompt.push('\n');
    prompt.push_str(DELIMITER);
    prompt.push('\n');
    prompt.push_str("User Question: ");
    prompt.push_str(question);
    prompt.push('\n');
    prompt.push_str("Answer as helpfully as possible.");

    prompt
}
