pub mod dependencies;
pub mod files;
pub mod project;
pub mod resolver;

pub use dependencies::{Dependency, collect_dependencies};
pub use files::FileWalker;
pub use project::{
    DiscoveredFile, DiscoveryState, FileStats, ParsedFile, ProjectContext, ProjectErrorState,
    ProjectStats,
};
pub use resolver::{FileResolution, ReferenceResolver, ResolutionStats};
