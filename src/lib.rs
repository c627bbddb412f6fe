/// The main library module for symgraph
// Debug macro for consistent debug output
#[macro_export]
macro_rules! debug_print {
    ($self:expr, $($arg:tt)*) => {
        if $crate::config::is_global_debug_enabled() {
            eprintln!("DEBUG: {}", format!($($arg)*));
        }
    };
}

pub mod ast;
pub mod config;
pub mod error;
pub mod indexing;
pub mod parsing;
pub mod symbol;
pub mod types;

// Explicit exports for better API clarity
pub use ast::{AstNode, AstStore, FileAst, NodeFlags, NodeKind, NodeLookup};
pub use config::{ProjectConfig, Settings};
pub use error::{
    ParseError, ParseResult, ProjectError, ProjectErrorCode, ProjectResult,
};
pub use indexing::{ProjectContext, ProjectStats, ReferenceResolver};
pub use parsing::{Language, ReferenceKind, ResolutionStatus};
pub use symbol::{GlobalSymbolTable, SymbolEntry, SymbolScope};
pub use types::{FileId, NodeId, NodeRef, SourceRange};
