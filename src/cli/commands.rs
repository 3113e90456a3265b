//! Command dispatch and handlers
//!
//! Handlers resolve CLI flags against loaded settings, wire up the
//! service container and print results. All failures bubble up as
//! [`CliError`] so main can map them to exit codes.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, IoResultExt};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{self, Settings};
use crate::domain::{DrawOptions, Method, OutputStyle, TreatmentNode, VignetteObject};
use crate::infrastructure::di::ServiceContainer;
use crate::util::path::expand_path;

/// Raw generate flags, resolved against settings inside the handler.
struct GenerateRequest<'a> {
    tree: &'a Path,
    multiple: bool,
    method: Option<&'a str>,
    weights: Option<&'a str>,
    output: Option<&'a str>,
    seed: Option<u64>,
    count: usize,
    json: bool,
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Generate {
            tree,
            multiple,
            method,
            weights,
            output,
            seed,
            count,
            json,
        }) => _generate(GenerateRequest {
            tree,
            multiple: *multiple,
            method: method.as_deref(),
            weights: weights.as_deref(),
            output: output.as_deref(),
            seed: *seed,
            count: *count,
            json: *json,
        }),
        Some(Commands::Validate { tree }) => _validate(tree),
        Some(Commands::Tree { tree }) => _tree(tree),
        Some(Commands::Config { command }) => _config(command),
        Some(Commands::Completion { shell }) => _completion(*shell),
        None => Ok(()),
    }
}

#[instrument(skip_all)]
fn _generate(req: GenerateRequest) -> CliResult<()> {
    let settings = Settings::load()?;
    let container = ServiceContainer::new(settings);

    let opts = draw_options(&container.settings, req.multiple, req.method, req.weights)?;
    let style = output_style(&container.settings, req.output)?;
    let seed = req.seed.or(container.settings.seed);
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    debug!(
        "generate: tree={} count={} seed={:?}",
        req.tree.display(),
        req.count,
        seed
    );

    let tree_path = expand_path(req.tree);
    let tree = container.generator.load_tree(&tree_path)?;
    let vignettes = container
        .generator
        .generate_batch(&tree, &opts, style, &mut rng, req.count)?;

    for (i, vignette) in vignettes.iter().enumerate() {
        if req.json {
            output::info(&to_json_line(vignette)?);
        } else {
            if i > 0 {
                output::info("---");
            }
            output::info(&vignette.vignette);
        }
    }
    Ok(())
}

#[instrument(skip_all)]
fn _validate(tree: &Path) -> CliResult<()> {
    let settings = Settings::load()?;
    let container = ServiceContainer::new(settings);

    let tree_path = expand_path(tree);
    let report = container.generator.inspect(&tree_path)?;

    output::success(&format!(
        "{} is a well-formed treatment tree",
        tree_path.display()
    ));
    output::detail(&format!("orders: {}", report.depth));
    output::detail(&format!("branches: {}", report.branches));
    output::detail(&format!("text entries: {}", report.leaves));
    output::detail(&format!(
        "first-order candidates: {}",
        report.root_candidates.iter().join(", ")
    ));
    Ok(())
}

#[instrument(skip_all)]
fn _tree(tree: &Path) -> CliResult<()> {
    let settings = Settings::load()?;
    let container = ServiceContainer::new(settings);

    let tree_path = expand_path(tree);
    let node = container.generator.load_tree(&tree_path)?;
    output::info(&render_node(tree_path.display().to_string(), &node));
    Ok(())
}

/// Render the classified hierarchy; branch constant texts are labelled so
/// they read apart from selectable candidates.
fn render_node(label: String, node: &TreatmentNode) -> Tree<String> {
    match node {
        TreatmentNode::Texts(_) => Tree::new(label),
        TreatmentNode::Branch(branch) => {
            let mut leaves = vec![Tree::new(format!("{} (constant)", branch.text_key))];
            leaves.extend(
                branch
                    .children
                    .iter()
                    .map(|(key, child)| render_node(key.raw().to_string(), child)),
            );
            Tree::new(label).with_leaves(leaves)
        }
        TreatmentNode::Forest(entries) => Tree::new(label).with_leaves(
            entries
                .iter()
                .map(|(key, entry)| render_node(key.raw().to_string(), entry)),
        ),
    }
}

#[instrument(skip_all)]
fn _config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init => _config_init(),
        ConfigCommands::Path => {
            let path = require_config_path()?;
            let status = if path.exists() { "exists" } else { "not created" };
            output::info(&format!("{} ({status})", path.display()));
            Ok(())
        }
    }
}

fn _config_init() -> CliResult<()> {
    let path = require_config_path()?;
    if path.exists() {
        output::warning(&format!("config already exists: {}", path.display()));
        return Ok(());
    }

    let container = ServiceContainer::new(Settings::default());
    container
        .fs
        .ensure_parent(&path)
        .with_path_context("create config directory", &path)?;
    container
        .fs
        .write(&path, &Settings::template())
        .with_path_context("write config template", &path)?;
    output::action("Created", &path.display());
    Ok(())
}

fn _completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

fn require_config_path() -> CliResult<PathBuf> {
    config::global_config_path().ok_or(CliError::Application(ApplicationError::Config {
        message: "cannot determine the user config directory".to_string(),
    }))
}

/// Resolve draw options from CLI flags, falling back to settings.
fn draw_options(
    settings: &Settings,
    multiple: bool,
    method: Option<&str>,
    weights: Option<&str>,
) -> CliResult<DrawOptions> {
    let method = match method {
        Some(raw) => raw.parse::<Method>().map_err(ApplicationError::from)?,
        None => settings.method()?,
    };
    let weights = weights.map(parse_weights).transpose()?;
    Ok(DrawOptions {
        multiple: multiple || settings.draw_multiple,
        method,
        weights,
    })
}

fn output_style(settings: &Settings, output: Option<&str>) -> CliResult<OutputStyle> {
    match output {
        Some(raw) => raw.parse::<OutputStyle>().map_err(CliError::InvalidArgs),
        None => Ok(settings.output()?),
    }
}

fn parse_weights(raw: &str) -> CliResult<Vec<f64>> {
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<f64>().map_err(|_| {
                CliError::InvalidArgs(format!("invalid weight `{token}`; expected a number"))
            })
        })
        .collect()
}

fn to_json_line(vignette: &VignetteObject) -> CliResult<String> {
    serde_json::to_string(vignette).map_err(|e| {
        CliError::Application(ApplicationError::OperationFailed {
            context: "serialize vignette record".to_string(),
            source: Box::new(e),
        })
    })
}
