//! C language parser implementation

pub mod parser;
pub mod resolution;

pub use parser::CParser;
pub use resolution::CResolver;
