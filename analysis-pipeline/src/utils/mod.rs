pub mod github;
pub mod llm;
pub mod llm_instructions;
