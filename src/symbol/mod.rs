//! Global symbol table
//!
//! Hash-indexed registry of every symbol across a project, plus the walk
//! that registers a parsed file's declarations into it.

mod registration;
mod table;

pub use registration::register_file_symbols;
pub use table::{
    GlobalSymbolTable, MIN_BUCKETS, REHASH_THRESHOLD, SymbolEntry, SymbolScope, TableStats,
    hash_string,
};
