// Generation module
// Answer generator seam and the Ollama chat-backed generator

pub mod ollama;

use anyhow::Result;

pub use ollama::OllamaGenerator;

/// Produces a natural-language answer to `question` from retrieved passages
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, question: &str, contexts: &[String]) -> Result<String>;
}

/// Build the grounded prompt sent to a chat model
#[inline]
pub fn build_prompt(question: &str, contexts: &[String]) -> String {
    let joined_context = contexts.join("\n\n");
    format!(
        "You are a precise assistant.\n\
         Answer the question using ONLY the context.\n\
         If the answer is not in the context, say you do not know.\n\n\
         Context:\n{}\n\n\
         Question: {}\nAnswer:",
        joined_context, question
    )
}
