//! JavaScript language parser implementation

pub mod parser;
pub mod resolution;

pub use parser::JavaScriptParser;
pub use resolution::JavaScriptResolver;
