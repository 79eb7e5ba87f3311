//! vgenome: a loader for the Visual Genome dataset.
//!
//! Visual Genome describes images as scene graphs: objects with bounding
//! boxes, relationships between them and attributes on them, each optionally
//! tagged with WordNet-style senses. The raw JSON comes in several historical
//! layouts and is not self-consistent: objects repeat, arrive out of order,
//! and edges name objects that were never described. This crate turns that
//! into consistent in-memory graphs.
//!
//! # Modules
//!
//! - [`model`]: the in-memory graph, image, region and QA types
//! - [`record`]: adapters from every known JSON layout to canonical records
//! - [`normalize`]: building a [`model::Graph`] from records
//! - [`synset`]: resolving sense names against the sense dictionary
//! - [`collect`]: pagination and relationship-count filtering over many images
//! - [`local`]: the dataset dumps on disk
//! - [`api`] and `remote`: the REST API
//! - [`config`]: YAML run configuration
//! - [`error`]: error types

pub mod api;
pub mod collect;
pub mod config;
pub mod error;
pub mod local;
pub mod model;
pub mod normalize;
pub mod record;
#[cfg(feature = "remote")]
pub mod remote;
pub mod synset;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use config::Config;
pub use error::VgError;

use collect::CollectReport;
use local::GraphQuery;
use model::{Graph, ImageId};
use normalize::{DanglingPolicy, NormalizeReport, Normalized};
use synset::UnresolvedSensePolicy;

/// The vgenome CLI application.
#[derive(Parser)]
#[command(name = "vgenome")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every subcommand. Flags override the config file.
#[derive(clap::Args)]
struct GlobalArgs {
    /// YAML config file.
    #[arg(long, global = true, env = "VGENOME_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding image_data.json, synsets.json and friends.
    #[arg(long, global = true, env = "VGENOME_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory of per-image scene graph files (default: <data-dir>/by-id).
    #[arg(long, global = true)]
    by_id_dir: Option<PathBuf>,

    /// How to handle relationships and attributes that name unknown objects.
    #[arg(long, global = true, value_enum)]
    dangling: Option<DanglingPolicy>,

    /// How to handle sense names missing from synsets.json.
    #[arg(long, global = true, value_enum)]
    unresolved_senses: Option<UnresolvedSensePolicy>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Load one scene graph from the local dataset.
    Graph(GraphArgs),
    /// Load a range of local scene graphs and summarize them.
    Graphs(GraphsArgs),
    /// Summarize the local region descriptions.
    Regions,
    /// Summarize the local question-answer pairs.
    Qas,
    /// Load scene graphs from a VRD annotation file.
    Vrd(VrdArgs),
    /// Query the Visual Genome REST API.
    #[cfg(feature = "remote")]
    Fetch(FetchArgs),
}

#[derive(clap::Args)]
struct GraphArgs {
    /// Image id.
    image_id: u64,

    /// Skip sense resolution.
    #[arg(long)]
    no_senses: bool,

    /// Lowercase object names before printing.
    #[arg(long)]
    lowercase_names: bool,
}

#[derive(clap::Args)]
struct GraphsArgs {
    /// First listing position to load.
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Listing position to stop before (default: end of listing).
    #[arg(long)]
    end: Option<usize>,

    /// Minimum number of relationships a graph must have.
    #[arg(long)]
    min_rels: Option<usize>,

    /// Maximum number of relationships a graph may have.
    #[arg(long)]
    max_rels: Option<usize>,

    /// Skip sense resolution.
    #[arg(long)]
    no_senses: bool,
}

#[derive(clap::Args)]
struct VrdArgs {
    /// VRD JSON file.
    file: PathBuf,
}

#[cfg(feature = "remote")]
#[derive(clap::Args)]
struct FetchArgs {
    /// API host.
    #[arg(long, env = "VGENOME_BASE_URL")]
    base_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    what: FetchCommand,
}

#[cfg(feature = "remote")]
#[derive(Subcommand)]
enum FetchCommand {
    /// Image metadata.
    Image { id: u64 },
    /// Scene graph of an image.
    Graph { id: u64 },
    /// Region descriptions of an image.
    Regions { id: u64 },
    /// Question-answer pairs about an image.
    Qas { id: u64 },
    /// Image ids at listing positions start..=end.
    Ids {
        #[arg(long, default_value_t = 0)]
        start: usize,
        #[arg(long, default_value_t = 99)]
        end: usize,
    },
}

/// Run the vgenome CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), VgError> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("vgenome {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Scene graph, region and QA loader for the Visual Genome dataset.");
        println!();
        println!("Run 'vgenome --help' for usage information.");
        return Ok(());
    };

    let config = resolve_config(&cli.global)?;
    let output = cli.global.output;

    match command {
        Commands::Graph(args) => run_graph(&config, args, output),
        Commands::Graphs(args) => run_graphs(&config, args, output),
        Commands::Regions => run_regions(&config, output),
        Commands::Qas => run_qas(&config, output),
        Commands::Vrd(args) => run_vrd(&config, args, output),
        #[cfg(feature = "remote")]
        Commands::Fetch(args) => run_fetch(config, args, output),
    }
}

fn resolve_config(global: &GlobalArgs) -> Result<Config, VgError> {
    let mut config = match &global.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(data_dir) = &global.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(by_id_dir) = &global.by_id_dir {
        config.by_id_dir = Some(by_id_dir.clone());
    }
    if let Some(dangling) = global.dangling {
        config.dangling_policy = dangling;
    }
    if let Some(policy) = global.unresolved_senses {
        config.unresolved_senses = policy;
    }
    Ok(config)
}

#[derive(Serialize)]
struct GraphView<'a> {
    graph: &'a Graph,
    report: &'a NormalizeReport,
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<(), VgError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(VgError::JsonWrite)?;
    writeln!(out)?;
    Ok(())
}

fn print_graph(normalized: &Normalized) {
    let Normalized { graph, report } = normalized;
    println!("Image {}", graph.image());
    println!("Objects ({}):", graph.entities().len());
    for entity in graph.entities() {
        let senses: Vec<&str> = entity.senses.iter().map(|s| s.name()).collect();
        if senses.is_empty() {
            println!("  {}: {}", entity.id, entity);
        } else {
            println!("  {}: {} [{}]", entity.id, entity, senses.join(", "));
        }
    }
    println!("Relationships ({}):", graph.relationships().len());
    for relationship in graph.relationships() {
        println!("  {}: {}", relationship.id, graph.relationship_phrase(relationship));
    }
    println!("Attributes ({}):", graph.attributes().len());
    for attribute in graph.attributes() {
        println!("  {}", graph.describe_attribute(attribute));
    }
    if !report.is_clean() {
        println!("Normalization: {report}");
    }
}

fn emit_graph(normalized: &Normalized, output: OutputFormat) -> Result<(), VgError> {
    match output {
        OutputFormat::Json => write_json(&GraphView {
            graph: &normalized.graph,
            report: &normalized.report,
        }),
        OutputFormat::Text => {
            print_graph(normalized);
            Ok(())
        }
    }
}

fn emit_not_found(what: &str, output: OutputFormat) -> Result<(), VgError> {
    match output {
        OutputFormat::Json => write_json(&serde_json::Value::Null),
        OutputFormat::Text => {
            println!("{what} not found");
            Ok(())
        }
    }
}

fn run_graph(config: &Config, args: GraphArgs, output: OutputFormat) -> Result<(), VgError> {
    let dataset = config.local_dataset();
    let index = dataset.image_index()?;
    let dict = if args.no_senses {
        None
    } else {
        Some(dataset.load_senses()?)
    };

    let image_id = ImageId(args.image_id);
    match dataset.get_scene_graph(image_id, &index, dict.as_ref())? {
        model::Lookup::Found(mut normalized) => {
            if args.lowercase_names {
                normalized.graph = normalized.graph.map_names(str::to_lowercase);
            }
            emit_graph(&normalized, output)
        }
        model::Lookup::NotFound => emit_not_found(&format!("Scene graph of image {image_id}"), output),
    }
}

#[derive(Serialize)]
struct GraphsSummary<'a> {
    image_ids: Vec<ImageId>,
    report: &'a CollectReport,
}

fn run_graphs(config: &Config, args: GraphsArgs, output: OutputFormat) -> Result<(), VgError> {
    let mut config = config.clone();
    if let Some(min) = args.min_rels {
        config.min_rels = min;
    }
    if let Some(max) = args.max_rels {
        config.max_rels = max;
    }

    let query = GraphQuery {
        start: args.start,
        end: args.end,
        bounds: config.bounds()?,
        resolve_senses: !args.no_senses,
    };
    let collection = config.local_dataset().get_scene_graphs(&query)?;

    match output {
        OutputFormat::Json => write_json(&GraphsSummary {
            image_ids: collection.graphs.iter().map(|g| g.image().id).collect(),
            report: &collection.report,
        }),
        OutputFormat::Text => {
            println!("{}", collection.report);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct GroupSummary {
    images: usize,
    items: usize,
}

fn emit_group_summary(label: &str, summary: GroupSummary, output: OutputFormat) -> Result<(), VgError> {
    match output {
        OutputFormat::Json => write_json(&summary),
        OutputFormat::Text => {
            println!("Loaded {} {label} across {} image(s)", summary.items, summary.images);
            Ok(())
        }
    }
}

fn run_regions(config: &Config, output: OutputFormat) -> Result<(), VgError> {
    let groups = config.local_dataset().get_all_region_descriptions()?;
    let summary = GroupSummary {
        images: groups.len(),
        items: groups.iter().map(Vec::len).sum(),
    };
    emit_group_summary("region description(s)", summary, output)
}

fn run_qas(config: &Config, output: OutputFormat) -> Result<(), VgError> {
    let groups = config.local_dataset().get_all_qas()?;
    let summary = GroupSummary {
        images: groups.len(),
        items: groups.iter().map(Vec::len).sum(),
    };
    emit_group_summary("QA pair(s)", summary, output)
}

fn run_vrd(config: &Config, args: VrdArgs, output: OutputFormat) -> Result<(), VgError> {
    let graphs = local::get_scene_graphs_vrd(&args.file, &config.normalize_options())?;
    match output {
        OutputFormat::Json => {
            let views: Vec<GraphView<'_>> = graphs
                .iter()
                .map(|n| GraphView {
                    graph: &n.graph,
                    report: &n.report,
                })
                .collect();
            write_json(&views)
        }
        OutputFormat::Text => {
            let total = graphs
                .iter()
                .fold(NormalizeReport::new(), |acc, n| acc + n.report);
            let relationships: usize = graphs.iter().map(|n| n.graph.relationships().len()).sum();
            println!(
                "Loaded {} graph(s) with {} relationship(s) from {}",
                graphs.len(),
                relationships,
                args.file.display()
            );
            println!("Normalization: {total}");
            Ok(())
        }
    }
}

#[cfg(feature = "remote")]
fn run_fetch(mut config: Config, args: FetchArgs, output: OutputFormat) -> Result<(), VgError> {
    use model::Lookup;

    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(timeout) = args.timeout_secs {
        config.timeout_secs = timeout;
    }

    let transport = remote::HttpTransport::new(&config.base_url, config.timeout())?;
    let mut api = api::Api::new(transport).with_normalize_options(config.normalize_options());

    match args.what {
        FetchCommand::Image { id } => match api.get_image_data(ImageId(id))? {
            Lookup::Found(image) => match output {
                OutputFormat::Json => write_json(&image),
                OutputFormat::Text => {
                    println!("{image}");
                    Ok(())
                }
            },
            Lookup::NotFound => emit_not_found(&format!("Image {id}"), output),
        },
        FetchCommand::Graph { id } => match api.get_scene_graph_of_image(ImageId(id))? {
            Lookup::Found(normalized) => emit_graph(&normalized, output),
            Lookup::NotFound => emit_not_found(&format!("Scene graph of image {id}"), output),
        },
        FetchCommand::Regions { id } => match api.get_region_descriptions_of_image(ImageId(id))? {
            Lookup::Found(regions) => match output {
                OutputFormat::Json => write_json(&regions),
                OutputFormat::Text => {
                    for region in &regions {
                        println!("{region}");
                    }
                    Ok(())
                }
            },
            Lookup::NotFound => emit_not_found(&format!("Regions of image {id}"), output),
        },
        FetchCommand::Qas { id } => {
            let qas = api.get_qa_of_image(ImageId(id))?;
            match output {
                OutputFormat::Json => write_json(&qas),
                OutputFormat::Text => {
                    for qa in &qas {
                        println!("{qa}");
                    }
                    Ok(())
                }
            }
        }
        FetchCommand::Ids { start, end } => {
            let ids = api.get_image_ids_in_range(start, end)?;
            match output {
                OutputFormat::Json => write_json(&ids),
                OutputFormat::Text => {
                    for id in &ids {
                        println!("{id}");
                    }
                    Ok(())
                }
            }
        }
    }
}
