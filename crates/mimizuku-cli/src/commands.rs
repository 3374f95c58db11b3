//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimizuku_core::model::{ClassExpression, Individual, Ontology};
use mimizuku_lite::{LiteReasoner, OracleStats};
use mimizuku_taxonomy::{ClassifierConfig, LoggingProgress, Taxonomy, TaxonomyBuilder, TaxonomyPrinter};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Main CLI structure
#[derive(Parser, Debug)]
#[command(name = "mimizuku")]
#[command(about = "Taxonomy classification and realization for description-logic knowledge bases")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Knowledge base as a JSON document
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Classifier configuration as a JSON document
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify every named class of the knowledge base
    Classify {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Classify, then assign every individual its most specific types
    Realize {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Query the hierarchy around a class or the types of an individual
    Query {
        /// Class to look up (`owl:Thing` and `owl:Nothing` name ⊤ and ⊥)
        #[arg(long)]
        class: Option<String>,

        /// Individual whose types to list
        #[arg(long)]
        individual: Option<String>,

        /// Only direct neighbours
        #[arg(short, long)]
        direct: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Start an interactive session
    Interactive,
}

/// Output format options
#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

impl OutputFormat {
    fn render(&self, value: &serde_json::Value, text: impl FnOnce() -> String) -> Result<String> {
        Ok(match self {
            OutputFormat::Text => text(),
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
        })
    }
}

/// Command execution result
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Failures of the command layer itself
#[derive(Error, Debug)]
pub enum CliError {
    #[error("No knowledge base loaded: pass --input <kb.json>")]
    NoKnowledgeBase,

    #[error("Build was canceled")]
    Canceled,

    #[error("Interactive mode is already running")]
    NestedInteractive,

    #[error("Either --class or --individual must be specified")]
    MissingQueryTarget,
}

/// Map the reserved names of ⊤ and ⊥, anything else is a named class
pub fn parse_class(name: &str) -> ClassExpression {
    match name {
        "owl:Thing" | "⊤" => ClassExpression::Thing,
        "owl:Nothing" | "⊥" => ClassExpression::Nothing,
        _ => ClassExpression::named(name),
    }
}

fn names(classes: &BTreeSet<ClassExpression>) -> Vec<String> {
    classes.iter().map(ToString::to_string).collect()
}

fn groups_text(groups: &[BTreeSet<ClassExpression>]) -> String {
    if groups.is_empty() {
        return "-".to_string();
    }
    groups
        .iter()
        .map(|group| names(group).join(" = "))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Visible nodes with their direct supers, ordered by representative
fn taxonomy_json(taxonomy: &Taxonomy, instances: bool) -> Result<serde_json::Value> {
    let mut visible: Vec<_> = taxonomy.nodes().filter(|(_, node)| !node.is_hidden()).collect();
    visible.sort_by(|(_, a), (_, b)| a.name().cmp(b.name()));

    let mut nodes = Vec::with_capacity(visible.len());
    for (_, node) in visible {
        let supers = taxonomy.get_supers(node.name(), true)?;
        let mut entry = json!({
            "equivalents": names(node.equivalents()),
            "supers": supers.iter().map(names).collect::<Vec<_>>(),
        });
        if instances {
            let members: Vec<String> = node.instances().map(ToString::to_string).collect();
            entry["instances"] = json!(members);
        }
        nodes.push(entry);
    }
    Ok(json!(nodes))
}

/// Execute CLI commands.
///
/// The executor keeps the loaded knowledge base and the last built
/// taxonomy, so that an interactive session classifies once and queries
/// many times.
pub struct CommandExecutor {
    config: ClassifierConfig,
    ontology: Option<Ontology>,
    taxonomy: Option<Taxonomy>,
    realized: bool,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            config: ClassifierConfig::default(),
            ontology: None,
            taxonomy: None,
            realized: false,
        }
    }

    /// Apply the global `--input` and `--config` options
    pub fn apply_globals(&mut self, input: Option<&Path>, config: Option<&Path>) -> Result<()> {
        if let Some(path) = config {
            self.load_config(path)?;
        }
        if let Some(path) = input {
            self.load_knowledge_base(path)?;
        }
        Ok(())
    }

    pub fn load_knowledge_base(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base {}", path.display()))?;
        let ontology = Ontology::from_json(&content)
            .with_context(|| format!("Invalid knowledge base {}", path.display()))?;
        info!(
            "loaded {}: {} axioms, {} assertions",
            path.display(),
            ontology.axioms.len(),
            ontology.assertions.len()
        );
        self.set_ontology(ontology);
        Ok(())
    }

    pub fn load_config(&mut self, path: &Path) -> Result<()> {
        self.config = ClassifierConfig::from_json_file(path)?;
        self.taxonomy = None;
        self.realized = false;
        Ok(())
    }

    /// Replace the knowledge base, dropping any taxonomy built from the old one
    pub fn set_ontology(&mut self, ontology: Ontology) {
        self.ontology = Some(ontology);
        self.taxonomy = None;
        self.realized = false;
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn taxonomy(&self) -> Option<&Taxonomy> {
        self.taxonomy.as_ref()
    }

    /// Execute a CLI command
    pub fn execute(&mut self, command: Commands) -> Result<CommandResult> {
        match command {
            Commands::Classify { format } => self.execute_classify(format),
            Commands::Realize { format } => self.execute_realize(format),
            Commands::Query {
                class,
                individual,
                direct,
                format,
            } => self.execute_query(class, individual, direct, format),
            Commands::Interactive => Err(CliError::NestedInteractive.into()),
        }
    }

    /// Parse and execute a full command line, global options included
    pub fn execute_cli(&mut self, cli: Cli) -> Result<CommandResult> {
        self.apply_globals(cli.input.as_deref(), cli.config.as_deref())?;
        match cli.command {
            Some(command) => self.execute(command),
            None => Ok(CommandResult {
                success: true,
                message: String::new(),
                data: None,
            }),
        }
    }

    /// Run a fresh builder session over the loaded knowledge base
    fn build(&mut self, realize: bool) -> Result<OracleStats> {
        let ontology = self.ontology.as_ref().ok_or(CliError::NoKnowledgeBase)?;

        let mut progress = LoggingProgress::default();
        let mut builder = TaxonomyBuilder::with_config(ontology, LiteReasoner::new(ontology), self.config.clone());
        builder.set_listener(&mut progress);

        let finished = if realize {
            builder.realize()?.is_some()
        } else {
            builder.classify()?.is_some()
        };
        if !finished {
            return Err(CliError::Canceled.into());
        }

        let stats = builder.oracle().stats();
        self.realized = builder.is_realized();
        self.taxonomy = builder.into_taxonomy();
        Ok(stats)
    }

    fn execute_classify(&mut self, format: OutputFormat) -> Result<CommandResult> {
        let stats = self.build(false)?;
        let taxonomy = self.taxonomy.as_ref().ok_or(CliError::Canceled)?;

        let data = json!({
            "classes": taxonomy.classes().len(),
            "nodes": taxonomy_json(taxonomy, false)?,
            "oracle": stats,
        });
        let output = format.render(&data["nodes"], || TaxonomyPrinter::new(taxonomy).print())?;
        println!("{}", output.trim_end());

        Ok(CommandResult {
            success: true,
            message: format!(
                "Classified {} classes into {} nodes ({} oracle calls)",
                taxonomy.classes().len(),
                taxonomy.node_count(),
                stats.total()
            ),
            data: Some(data),
        })
    }

    fn execute_realize(&mut self, format: OutputFormat) -> Result<CommandResult> {
        let stats = self.build(true)?;
        let taxonomy = self.taxonomy.as_ref().ok_or(CliError::Canceled)?;

        let data = json!({
            "individuals": taxonomy.individuals().len(),
            "nodes": taxonomy_json(taxonomy, true)?,
            "oracle": stats,
        });
        let output = format.render(&data["nodes"], || {
            TaxonomyPrinter::new(taxonomy).with_instances(true).print()
        })?;
        println!("{}", output.trim_end());

        Ok(CommandResult {
            success: true,
            message: format!(
                "Realized {} individuals ({} instance checks)",
                taxonomy.individuals().len(),
                stats.instance
            ),
            data: Some(data),
        })
    }

    fn execute_query(
        &mut self,
        class: Option<String>,
        individual: Option<String>,
        direct: bool,
        format: OutputFormat,
    ) -> Result<CommandResult> {
        match (class, individual) {
            (Some(class), _) => self.query_class(&class, direct, format),
            (None, Some(individual)) => self.query_individual(&individual, direct, format),
            (None, None) => Err(CliError::MissingQueryTarget.into()),
        }
    }

    fn query_class(&mut self, name: &str, direct: bool, format: OutputFormat) -> Result<CommandResult> {
        if self.taxonomy.is_none() {
            self.build(false)?;
        }
        let taxonomy = self.taxonomy.as_ref().ok_or(CliError::Canceled)?;

        let class = parse_class(name);
        if !taxonomy.contains(&class) {
            return Ok(CommandResult {
                success: false,
                message: format!("Unknown class: {}", name),
                data: None,
            });
        }

        let equivalents = taxonomy.get_equivalents(&class)?;
        let supers = taxonomy.get_supers(&class, direct)?;
        let subs = taxonomy.get_subs(&class, direct)?;
        let instances = if self.realized {
            Some(taxonomy.get_instances(&class, direct)?)
        } else {
            None
        };

        let mut data = json!({
            "class": class.to_string(),
            "equivalents": names(&equivalents),
            "supers": supers.iter().map(names).collect::<Vec<_>>(),
            "subs": subs.iter().map(names).collect::<Vec<_>>(),
        });
        if let Some(instances) = &instances {
            let members: Vec<String> = instances.iter().map(ToString::to_string).collect();
            data["instances"] = json!(members);
        }

        let output = format.render(&data, || {
            let mut text = format!("{}\n", class);
            text.push_str(&format!("  equivalents: {}\n", names(&equivalents).join(", ")));
            text.push_str(&format!("  supers: {}\n", groups_text(&supers)));
            text.push_str(&format!("  subs: {}\n", groups_text(&subs)));
            if let Some(instances) = &instances {
                let members: Vec<String> = instances.iter().map(ToString::to_string).collect();
                text.push_str(&format!("  instances: {}\n", members.join(", ")));
            }
            text
        })?;
        println!("{}", output.trim_end());

        Ok(CommandResult {
            success: true,
            message: format!("{} supers, {} subs", supers.len(), subs.len()),
            data: Some(data),
        })
    }

    fn query_individual(&mut self, name: &str, direct: bool, format: OutputFormat) -> Result<CommandResult> {
        if !self.realized {
            self.build(true)?;
        }
        let taxonomy = self.taxonomy.as_ref().ok_or(CliError::Canceled)?;

        let individual = Individual::new(name);
        if !taxonomy.individuals().contains(&individual) {
            return Ok(CommandResult {
                success: false,
                message: format!("Unknown individual: {}", name),
                data: None,
            });
        }

        let types = taxonomy.get_types(&individual, direct);
        let data = json!({
            "individual": name,
            "types": types.iter().map(names).collect::<Vec<_>>(),
        });
        let output = format.render(&data, || format!("{}\n  types: {}\n", name, groups_text(&types)))?;
        println!("{}", output.trim_end());

        Ok(CommandResult {
            success: true,
            message: format!("{} types", types.len()),
            data: Some(data),
        })
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}
