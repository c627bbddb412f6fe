//! TypeScript language parser implementation

pub mod parser;
pub mod resolution;

pub use parser::TypeScriptParser;
pub use resolution::TypeScriptResolver;
