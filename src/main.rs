//! CLI entry point for symgraph.
//!
//! Analyses a project directory, then answers symbol and reference queries
//! against the resolved graph. Every command rebuilds the graph from source.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use symgraph::{AstNode, NodeRef, ProjectContext, ProjectStats, Settings};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Multi-language symbol graph
#[derive(Parser)]
#[command(
    name = "symgraph",
    version = env!("CARGO_PKG_VERSION"),
    about = "Build a cross-file symbol graph for C, C++, Python, JavaScript and TypeScript",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print per-node debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a project, resolve references and print statistics
    #[command(after_help = "Examples:\n  symgraph analyze src\n  symgraph analyze . --ext c,h --json")]
    Analyze {
        /// Project root directory or a single file
        path: PathBuf,

        /// Only consider these file extensions (default: all enabled languages)
        #[arg(long, value_delimiter = ',')]
        ext: Vec<String>,

        /// Do not descend into subdirectories
        #[arg(long)]
        no_recursive: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the symbol registered under a qualified name
    Symbol {
        /// Project root directory
        root: PathBuf,

        /// Fully qualified name, e.g. `geo::Point` or `app.main`
        name: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List every resolved reference to a symbol
    Refs {
        /// Project root directory
        root: PathBuf,

        /// Fully qualified name of the referenced symbol
        name: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Display active settings
    Config,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput<'a> {
    root: &'a Path,
    stats: ProjectStats,
    files: &'a [symgraph::indexing::ParsedFile],
    last_error: Option<&'a symgraph::indexing::ProjectErrorState>,
}

#[derive(Debug, Serialize)]
struct NodeOutput {
    handle: NodeRef,
    kind: String,
    name: String,
    qualified_name: String,
    file: PathBuf,
    line: u32,
    signature: Option<String>,
}

impl NodeOutput {
    fn new(handle: NodeRef, node: &AstNode) -> Self {
        Self {
            handle,
            kind: node.kind.as_str().to_string(),
            name: node.name.clone(),
            qualified_name: node.qualified_name.clone(),
            file: node.file_path.clone(),
            line: node.range.start_line + 1,
            signature: node.signature.clone(),
        }
    }
}

fn init_tracing(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.project.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Discover, parse and resolve everything under `path`
fn build_project(
    settings: &Settings,
    path: &Path,
    extensions: &[String],
    recursive: bool,
) -> Result<ProjectContext> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))?;

    if path.is_file() {
        let root = path.parent().unwrap_or(&path);
        let mut project = ProjectContext::with_settings(root, settings.clone());
        project.add_file(&path, None);
        return Ok(resolve(project));
    }

    let mut project = ProjectContext::with_settings(&path, settings.clone());
    let extensions = if extensions.is_empty() {
        settings.enabled_extensions()
    } else {
        extensions.to_vec()
    };
    let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
    project.add_directory(&path, Some(extensions.as_slice()), recursive);
    Ok(resolve(project))
}

fn resolve(mut project: ProjectContext) -> ProjectContext {
    project.parse_all_files();
    project.resolve_references();
    project
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn print_node(output: &NodeOutput) {
    println!(
        "{} {} at {}:{}",
        output.kind,
        output.qualified_name,
        output.file.display(),
        output.line
    );
    if let Some(signature) = &output.signature {
        println!("  {signature}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    if cli.debug {
        settings.debug = true;
    }
    symgraph::config::set_global_debug(settings.debug);
    init_tracing(&settings);

    match cli.command {
        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            let toml_str =
                toml::to_string_pretty(&settings).context("Error displaying config")?;
            println!("{toml_str}");
        }

        Commands::Analyze {
            path,
            ext,
            no_recursive,
            json,
        } => {
            let project = build_project(&settings, &path, &ext, !no_recursive)?;
            let stats = project.stats();

            if json {
                print_json(&AnalyzeOutput {
                    root: project.root(),
                    stats,
                    files: project.files(),
                    last_error: project.last_error(),
                })?;
            } else {
                println!("Analyzed {}", project.root().display());
                println!("  Files:                 {}", stats.total_files);
                println!("  Symbols:               {}", stats.total_symbols);
                println!("  References:            {}", stats.total_references);
                println!("  Unresolved references: {}", stats.unresolved_references);
                if let Some(error) = project.last_error() {
                    println!("  Last error:            [{}] {}", error.code, error.message);
                }
            }
        }

        Commands::Symbol { root, name, json } => {
            let project = build_project(&settings, &root, &[], true)?;
            let Some(handle) = project.get_symbol_ref(&name) else {
                eprintln!("Symbol not found: {name}");
                std::process::exit(1);
            };
            let Some(node) = project.node(handle) else {
                eprintln!("Symbol {name} points at a missing node");
                std::process::exit(1);
            };

            let output = NodeOutput::new(handle, node);
            if json {
                print_json(&output)?;
            } else {
                print_node(&output);
                if let Some(doc) = &node.docstring {
                    println!("  {}", doc.lines().next().unwrap_or_default());
                }
            }
        }

        Commands::Refs { root, name, json } => {
            let project = build_project(&settings, &root, &[], true)?;
            let Some(target) = project.get_symbol_ref(&name) else {
                eprintln!("Symbol not found: {name}");
                std::process::exit(1);
            };

            let references: Vec<NodeOutput> = project
                .find_references(target)
                .into_iter()
                .filter_map(|handle| project.node(handle).map(|node| NodeOutput::new(handle, node)))
                .collect();

            if json {
                print_json(&references)?;
            } else if references.is_empty() {
                println!("No references to {name}");
            } else {
                println!("{} references to {name}:", references.len());
                for reference in &references {
                    print_node(reference);
                }
            }
        }
    }

    Ok(())
}
