// Résumé intake: document bytes → text → CandidateProfile.

pub mod analyzer;
pub mod extractor;
pub mod handlers;
pub mod prompts;
