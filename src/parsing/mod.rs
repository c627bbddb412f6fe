pub mod c;
pub mod cpp;
pub mod factory;
pub mod javascript;
pub mod language;
pub mod parser;
pub mod python;
pub mod resolution;
pub mod typescript;

pub use c::{CParser, CResolver};
pub use cpp::{CppParser, CppResolver};
pub use factory::ParserFactory;
pub use javascript::{JavaScriptParser, JavaScriptResolver};
pub use language::Language;
pub use parser::{LanguageParser, SourceParser, TreeSitterFrontEnd};
pub use python::{PythonParser, PythonResolver};
pub use resolution::{
    GenericResolver, LanguageResolver, ReferenceKind, ReferenceRequest, Resolution,
    ResolutionStatus, ResolveContext, ResolverStats,
};
pub use typescript::{TypeScriptParser, TypeScriptResolver};
