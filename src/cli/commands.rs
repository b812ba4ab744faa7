//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::application::document::DocumentFormat;
use crate::application::services::RenderMode;
use crate::application::{ApplicationError, TreeNodeConvert};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e))?;
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let project_dir = project_dir(cli)?;
    let settings = Settings::load(Some(&project_dir))?;
    debug!("effective settings: {:?}", settings);
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Render {
            paths,
            text,
            persist,
            output,
        } => cmd_render(
            &container,
            paths,
            RenderMode {
                text: *text,
                persist: *persist,
            },
            output.as_deref(),
        ),
        Commands::Tree { file } => cmd_tree(&container, file),
        Commands::Config { command } => cmd_config(&container, command, &project_dir),
        Commands::Completion { .. } => Ok(()),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().map_err(|e| InfraError::io("current directory", e).into()),
    }
}

/// Expands directories into the page documents below them, sorted per directory.
fn collect_documents(paths: &[PathBuf]) -> CliResult<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| DocumentFormat::is_document(p))
                .collect();
            found.sort();
            documents.extend(found);
        } else if path.exists() {
            documents.push(path.clone());
        } else {
            return Err(CliError::InvalidArgs(format!(
                "no such file or directory: {}",
                path.display()
            )));
        }
    }
    if documents.is_empty() {
        return Err(CliError::Usage("no page documents found".into()));
    }
    Ok(documents)
}

#[instrument(level = "debug", skip(container))]
fn cmd_render(
    container: &ServiceContainer,
    paths: &[PathBuf],
    mode: RenderMode,
    output_file: Option<&Path>,
) -> CliResult<()> {
    let documents = collect_documents(paths)?;
    if output_file.is_some() && documents.len() > 1 {
        return Err(CliError::InvalidArgs(
            "--output needs exactly one page document".into(),
        ));
    }

    let results = container.render_service.render_documents(&documents, mode);
    let many = results.len() > 1;
    let mut first_err: Option<ApplicationError> = None;

    for (path, result) in results {
        match result {
            Ok(rendered) => {
                if let Some(file) = output_file {
                    container
                        .fs
                        .ensure_parent(file)
                        .and_then(|_| container.fs.write(file, &rendered.content))
                        .map_err(|e| InfraError::io(format!("write {}", file.display()), e))?;
                    output::action("Wrote", &file.display());
                } else if !mode.persist {
                    output::info(&rendered.content);
                }
                match (mode.persist, &rendered.location) {
                    (true, Some(location)) => output::action("Persisted", &location.display()),
                    (true, None) => output::failure(&format!(
                        "{}: not persisted, see log",
                        path.display()
                    )),
                    _ => {}
                }
            }
            Err(e) => {
                if many {
                    output::failure(&format!("{}: {}", path.display(), e));
                }
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let service = &container.render_service;
    let page = service.build(file)?;
    page.compile(&service.capabilities())
        .map_err(ApplicationError::from)?;
    let tree = page.to_tree_string().map_err(ApplicationError::from)?;
    output::info(&tree);
    Ok(())
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    project_dir: &Path,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let describe = |path: &Path| {
                let state = if container.fs.exists(path) {
                    "exists"
                } else {
                    "not found"
                };
                format!("{} ({})", path.display(), state)
            };
            match global_config_path() {
                Some(path) => output::action("Global", &describe(&path)),
                None => output::action("Global", &"unavailable"),
            }
            output::action("Local", &describe(&local_config_path(project_dir)));
        }
        ConfigCommands::Init { global } => {
            let target = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no config directory available on this system".into())
                })?
            } else {
                local_config_path(project_dir)
            };
            if container.fs.exists(&target) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            container
                .fs
                .ensure_parent(&target)
                .and_then(|_| container.fs.write(&target, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::success(&format!("created {}", target.display()));
            output::detail(&"edit the file to override the defaults");
        }
    }
    Ok(())
}
