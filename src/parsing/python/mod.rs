//! Python language parser implementation

pub mod parser;
pub mod resolution;

pub use parser::PythonParser;
pub use resolution::PythonResolver;
