//! Command dispatch

use std::io;
use std::path::Path;
use std::time::Duration;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::{
    timeline_for, Algorithm, ApplicationError, Frame, Presenter, SearchRequest, SearchResponse,
    Session, SessionEvent,
};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::render::{JsonPresenter, TextPresenter};
use crate::config::{global_config_path, Settings};
use crate::domain::CombinationRecord;
use crate::infrastructure::{InfraError, ServiceContainer};
use crate::tree_traits::TreeNodeConvert;
use crate::util::path::expand_path;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let local_config = cli.config.as_deref().map(expand_path);
    let settings = Settings::load(local_config.as_deref())?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Some(Commands::Tree {
            response,
            recipe,
            steps,
            target,
        }) => _tree(&container, response.as_deref(), *recipe, steps, target.as_deref()),
        Some(Commands::Layout {
            response,
            recipe,
            highlight,
            json,
        }) => _layout(&container, response, *recipe, highlight, *json),
        Some(Commands::Steps { response, json }) => _steps(&container, response, *json),
        Some(Commands::Play {
            response,
            delay_ms,
            json,
        }) => _play(&container, response, *delay_ms, *json),
        Some(Commands::Check {
            target,
            algorithm,
            count,
            catalog,
        }) => _check(&container, target, *algorithm, *count, catalog.as_deref()),
        Some(Commands::Config { command }) => _config(&container, command, local_config.as_deref()),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "recipe-tree", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `recipe-tree --help`".into(),
        )),
    }
}

fn load_response(container: &ServiceContainer, path: &Path) -> CliResult<SearchResponse> {
    Ok(container.load_response(&expand_path(path))?)
}

/// 1-based recipe number to a checked 0-based index.
fn recipe_index(response: &SearchResponse, recipe: usize) -> CliResult<usize> {
    let total = response.recipes.len();
    if total == 0 {
        return Err(ApplicationError::NoRecipes.into());
    }
    if recipe == 0 || recipe > total {
        return Err(ApplicationError::RecipeOutOfRange {
            index: recipe,
            total,
        }
        .into());
    }
    Ok(recipe - 1)
}

#[instrument(skip(container))]
fn _tree(
    container: &ServiceContainer,
    response: Option<&Path>,
    recipe: usize,
    steps: &[String],
    target: Option<&str>,
) -> CliResult<()> {
    let builder = container.composer().builder();
    let (records, target) = match (response, target) {
        (Some(path), _) => {
            let response = load_response(container, path)?;
            let index = recipe_index(&response, recipe)?;
            let recipe = &response.recipes[index];
            output::header(&format!("Recipe {} of {}", index + 1, response.recipes.len()));
            (recipe.steps.clone(), recipe.target.clone())
        }
        (None, Some(target)) => {
            let records = steps
                .iter()
                .map(|s| s.parse::<CombinationRecord>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(ApplicationError::from)?;
            (records, target.to_string())
        }
        (None, None) => {
            return Err(CliError::InvalidArgs(
                "give a response file or --step with --target".into(),
            ))
        }
    };

    let outcome = builder.build(&records, &target);
    output::info(&outcome.tree.to_tree_string().to_string().trim_end());
    for anomaly in &outcome.anomalies {
        output::warning(anomaly);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _layout(
    container: &ServiceContainer,
    response: &Path,
    recipe: usize,
    highlight: &[String],
    json: bool,
) -> CliResult<()> {
    let response = load_response(container, response)?;
    let index = recipe_index(&response, recipe)?;
    let frame = container.composer().recipe_frame(
        &response.recipes[index],
        index,
        response.recipes.len(),
        highlight,
    );
    if json {
        output::info(&render_json(&JsonPresenter::default(), &frame)?);
    } else {
        output::info(&TextPresenter::with_coordinates().render(&frame));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _steps(container: &ServiceContainer, response: &Path, json: bool) -> CliResult<()> {
    let response = load_response(container, response)?;
    let primitives = container.settings.primitive_set();
    let timeline = timeline_for(&response, &primitives);
    debug!(steps = timeline.len(), "timeline ready");

    if json {
        let text = serde_json::to_string_pretty(&timeline).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize snapshots".into(),
            source: Box::new(e),
        })?;
        output::info(&text);
        return Ok(());
    }
    if response.live_update_steps.as_ref().map_or(true, Vec::is_empty) {
        output::warning(&"no live steps in response, synthesized from the first recipe");
    }
    for snapshot in &timeline {
        output::action(&snapshot.index.to_string(), &snapshot.message);
        if let Some(records) = &snapshot.partial_tree {
            for record in records {
                output::detail(record);
            }
        }
        if !snapshot.highlighted_items.is_empty() {
            output::detail(&format!("highlight: {}", snapshot.highlighted_items.join(", ")));
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn _play(
    container: &ServiceContainer,
    response: &Path,
    delay_ms: Option<u64>,
    json: bool,
) -> CliResult<()> {
    let response = load_response(container, response)?;
    let delay = delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| container.settings.delay());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(InfraError::Runtime)?;

    runtime.block_on(async {
        let mut session = Session::open(container.composer().clone(), response, delay).await?;
        if session.timeline().is_empty() {
            output::warning(&"nothing to play: response has neither live steps nor recipes");
            return session.close().await.map_err(CliError::from);
        }
        session.play().await?;
        while let Some(event) = session.next_event().await {
            match event {
                SessionEvent::Frame(frame) if json => {
                    output::info(&render_json(&JsonPresenter { compact: true }, &frame)?)
                }
                SessionEvent::Frame(frame) => {
                    output::info(&TextPresenter::default().render(&frame));
                    output::info(&"");
                }
                SessionEvent::Completed { last_index } => {
                    debug!(last_index, "playback complete");
                    break;
                }
            }
        }
        if !json {
            output::success(&"search replay complete");
        }
        session.close().await.map_err(CliError::from)
    })
}

#[instrument(skip(container))]
fn _check(
    container: &ServiceContainer,
    target: &str,
    algorithm: Algorithm,
    count: Option<u32>,
    catalog: Option<&Path>,
) -> CliResult<()> {
    let catalog = catalog
        .map(|path| container.load_catalog(&expand_path(path)))
        .transpose()?;
    let request = SearchRequest::new(algorithm, target, count)
        .validated(&container.settings.primitive_set(), catalog.as_ref())
        .map_err(ApplicationError::from)?;
    let text = serde_json::to_string_pretty(&request).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize request".into(),
        source: Box::new(e),
    })?;
    output::info(&text);
    Ok(())
}

fn _config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    local: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| describe_path(&p))
                .unwrap_or_else(|| "(no config directory on this platform)".into());
            output::action("global", &global);
            output::action(
                "local",
                &local.map_or_else(|| "(none, pass --config)".to_string(), describe_path),
            );
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn describe_path(path: &Path) -> String {
    let status = if path.exists() {
        "exists"
    } else {
        "not found"
    };
    format!("{} ({})", path.display(), status)
}

fn render_json(presenter: &JsonPresenter, frame: &Frame) -> CliResult<String> {
    presenter.render(frame).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "serialize frame".into(),
            source: Box::new(e),
        }
        .into()
    })
}
