//! C++ language parser implementation

pub mod parser;
pub mod resolution;

pub use parser::CppParser;
pub use resolution::CppResolver;
