//! schema-docs CLI
//!
//! Renders, builds, lints and inspects schema documentation pages.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_docs::config::{DocsConfig, PageConfig};
use schema_docs::emit::OutputFormat;
use schema_docs::lint::{lint_documents, SchemaLinter};
use schema_docs::schema::loader::{self, DocumentKind, LoadConfig, SchemaDocument};
use schema_docs::schema::RefGraph;
use schema_docs::site::{self, SiteBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-docs")]
#[command(about = "Render JSON Schema documents into reference documentation")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one document (a path or bundled:<name>)
    Render {
        source: String,
        /// html, markdown or json
        #[arg(short, long)]
        format: Option<OutputFormat>,
        /// Key shown for the top-level node
        #[arg(long)]
        root_key: Option<String>,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build every configured page into the output directory
    Build {
        /// Fail if any page on disk is stale; writes nothing
        #[arg(long)]
        check: bool,
        /// Overrides output.dir
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Lint documents (files, directories or bundled:<name>); all bundled ones by default
    Lint { sources: Vec<String> },

    /// Report $ref cycles and dangling local refs
    Cycles { source: String },

    /// List the bundled schemas, or render one
    Bundled {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Show or write configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write a config file with the defaults
    Init {
        #[arg(short, long, default_value = "schema-docs.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = DocsConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Render {
            source,
            format,
            root_key,
            output,
        } => {
            let document = site::load_source(&source).with_context(|| format!("failed to load {}", source))?;
            let page = PageConfig {
                name: page_name(&document),
                source,
                kind: document.kind.into(),
                format,
                root_key,
            };
            let rendered = SiteBuilder::new(&config).render_page(&page)?;
            for item in &rendered.diagnostics {
                eprintln!("{}", item);
            }
            write_or_print(output.as_deref(), &rendered.content)
        }

        Commands::Build { check, output_dir } => {
            let mut builder = SiteBuilder::new(&config);
            if let Some(dir) = output_dir {
                builder = builder.with_output_dir(dir);
            }

            if check {
                println!("🔍 Checking {}", builder.output_dir().display());
                let report = builder.check()?;
                for stale in &report.stale {
                    println!("  ❌ {} is stale", stale.path.display());
                    print!("{}", stale.diff);
                }
                if report.is_clean() {
                    println!("  ✅ {} page(s) up to date", report.checked);
                }
                report.into_result()?;
                return Ok(());
            }

            let report = builder.build()?;
            println!("📦 Built {} page(s) into {}", report.pages.len(), report.output_dir.display());
            for page in &report.pages {
                let marker = if page.diagnostics.is_empty() { "✅" } else { "⚠️ " };
                println!("  {} {} ({} diagnostic(s))", marker, page.file_name, page.diagnostics.len());
                for item in &page.diagnostics {
                    println!("      {}", item);
                }
            }
            Ok(())
        }

        Commands::Lint { sources } => {
            let documents = if sources.is_empty() {
                loader::load_bundled()
            } else {
                let mut documents = Vec::new();
                for source in &sources {
                    documents.extend(collect_documents(source)?);
                }
                documents
            };

            let linter = SchemaLinter::new()
                .with_descriptions(config.lint.check_descriptions)
                .with_value_checks(config.lint.check_values);
            let results = lint_documents(&documents, &linter)?;

            let mut failed = 0;
            for result in &results {
                if result.diagnostics.is_empty() {
                    println!("✅ {}", result.document);
                    continue;
                }
                let marker = if result.is_clean() { "⚠️ " } else { "❌" };
                println!("{} {}", marker, result.document);
                for item in &result.diagnostics {
                    println!("    {}", item);
                }
                if !result.is_clean() {
                    failed += 1;
                }
            }

            if failed > 0 {
                bail!("{} of {} document(s) failed lint", failed, results.len());
            }
            Ok(())
        }

        Commands::Cycles { source } => {
            let document = site::load_source(&source).with_context(|| format!("failed to load {}", source))?;
            let graph = RefGraph::from_document(&document.raw);
            println!(
                "🔍 {}: {} node(s), {} edge(s)",
                document.name,
                graph.node_count(),
                graph.edge_count()
            );
            for reference in graph.dangling() {
                println!("  ⚠️  dangling $ref {}", reference);
            }

            let cycles = graph.cycles();
            if cycles.is_empty() {
                println!("  ✅ no cycles");
                return Ok(());
            }
            for cycle in &cycles {
                println!("  ❌ cycle: {}", cycle.join(" -> "));
            }
            bail!("{} cyclic group(s) found", cycles.len())
        }

        Commands::Bundled { name, format } => match name {
            None => {
                for document in loader::load_bundled() {
                    let kind = match document.kind {
                        DocumentKind::Schema => "schema",
                        DocumentKind::FileTree => "file-tree",
                    };
                    println!("{:<28} {:<10} {}", document.name, kind, document.title());
                }
                Ok(())
            }
            Some(name) => {
                let document = loader::bundled(&name).with_context(|| format!("no bundled document named '{}'", name))?;
                let page = PageConfig {
                    name: page_name(&document),
                    source: format!("{}{}", schema_docs::config::BUNDLED_PREFIX, document.name),
                    kind: document.kind.into(),
                    format,
                    root_key: None,
                };
                let rendered = SiteBuilder::new(&config).render_page(&page)?;
                print!("{}", rendered.content);
                Ok(())
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                DocsConfig::default()
                    .save(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("✅ Wrote {}", path.display());
                Ok(())
            }
        },
    }
}

fn page_name(document: &SchemaDocument) -> String {
    document.name.rsplit('/').next().unwrap_or(&document.name).to_string()
}

/// A file, every JSON document below a directory, or a bundled document
fn collect_documents(source: &str) -> anyhow::Result<Vec<SchemaDocument>> {
    let path = Path::new(source);
    if path.is_dir() {
        return loader::load_from_directory(path, &LoadConfig::default())
            .with_context(|| format!("failed to load documents from {}", source));
    }
    let document = site::load_source(source).with_context(|| format!("failed to load {}", source))?;
    Ok(vec![document])
}

fn write_or_print(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("✅ Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
