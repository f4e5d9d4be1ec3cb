//! Prompt templates for question rewriting and answering.

use ragchat_model::Message;
use ragchat_rag::SearchResult;

/// Instruction for turning a follow-up into a standalone question.
pub const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question which can be \
understood without the chat history. Do NOT answer the question, just reformulate it if needed \
and otherwise return it as is.";

/// Answering instruction. `{context}` is replaced by the retrieved passages.
pub const QA_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. Use the \
following pieces of retrieved context to answer the question. If you don't know the answer, say \
that you don't know. Use three sentences maximum and keep the answer concise.\n\n{context}";

const CONTEXT_SLOT: &str = "{context}";

/// Join retrieved chunk texts with blank lines, nearest first.
pub fn format_context(results: &[SearchResult]) -> String {
    results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n")
}

fn with_history(system: String, history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system));
    messages.extend_from_slice(history);
    messages.push(Message::user(question));
    messages
}

/// Messages asking the model to rewrite `question` given `history`.
pub fn contextualize_messages(history: &[Message], question: &str) -> Vec<Message> {
    with_history(CONTEXTUALIZE_SYSTEM_PROMPT.to_string(), history, question)
}

/// Messages asking the model to answer `question` from `context`.
pub fn qa_messages(context: &str, history: &[Message], question: &str) -> Vec<Message> {
    with_history(QA_SYSTEM_PROMPT.replace(CONTEXT_SLOT, context), history, question)
}
