// Resume review: text extraction, prompt assembly, model call, feedback parsing,
// and the analysis pipeline that persists the result.

pub mod extract;
pub mod handlers;
pub mod parse;
pub mod prompts;
pub mod reviewer;
pub mod service;
