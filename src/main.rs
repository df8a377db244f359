use std::path::Path;

use clap::Parser;
use miette::{miette, Context, IntoDiagnostic, Result};
use locker::{
    configuration::Configuration,
    logging::{LoggingConfigurator, LoggingOptions},
    vault::{Config, Resolved, Vault},
};
use tracing::{debug, info};

use crate::cli::{sections_from_assignments, CLIArgs, CLICommand};

mod cli;



fn print_json(value: &serde_json::Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)
        .into_diagnostic()
        .wrap_err("Failed to serialize value as JSON.")?;

    println!("{pretty}");
    Ok(())
}


fn print_resolved(resolved: Resolved) -> Result<()> {
    match resolved.into_value() {
        serde_json::Value::String(string) => {
            println!("{string}");
            Ok(())
        }
        other => print_json(&other),
    }
}


fn command_paths(configuration: &Configuration, logging: &LoggingConfigurator) {
    let base_paths = &configuration.base_paths;

    println!(
        "settings:  {}",
        configuration
            .file_path
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(defaults)".to_string())
    );
    println!("base:      {}", base_paths.base_data_directory_path.display());
    println!("config:    {}", base_paths.config_directory_path.display());
    println!("logs:      {}", base_paths.logs_directory_path.display());
    println!("specific:  {}", base_paths.specific_directory_path.display());

    match logging.log_dir() {
        Some(log_dir) => println!("log files: {}", log_dir.display()),
        None => println!("log files: (console only)"),
    }
}


fn command_init(
    configuration: &Configuration,
    project: Option<String>,
    values: &[String],
) -> Result<()> {
    configuration
        .base_paths
        .ensure_directories()
        .wrap_err("Failed to create the storage layout.")?;

    info!(
        base = %configuration.base_paths.base_data_directory_path.display(),
        "Storage layout is in place."
    );

    let Some(project) = project.or_else(|| configuration.logging.project.clone()) else {
        if !values.is_empty() {
            return Err(miette!(
                "Initial values were given, but no project is set (use --project)."
            ));
        }

        return Ok(());
    };

    let sections = sections_from_assignments(values)?;

    let config_path = Config::ensure_initialized_in(
        &configuration.base_paths.config_directory_path,
        &project,
        &sections,
    )
    .wrap_err_with(|| miette!("Failed to initialize configuration for project {project}."))?;

    println!("{}", config_path.display());
    Ok(())
}


fn command_dump(path: &Path) -> Result<()> {
    let vault = Vault::new(path);

    if path.is_dir() {
        let entries = vault
            .entries()
            .wrap_err_with(|| miette!("Failed to list {}.", path.display()))?;

        for (name, file_name) in entries {
            println!("{name:<24} {file_name}");
        }

        return Ok(());
    }

    let raw = vault
        .raw()
        .wrap_err_with(|| miette!("Failed to load {}.", path.display()))?;

    print_json(&serde_json::Value::Object(raw))
}


fn command_get(path: &Path, name: &str, key: Option<&str>) -> Result<()> {
    let vault = Vault::new(path);

    let mut resolved = vault
        .get(name)
        .wrap_err_with(|| miette!("Failed to resolve {name} in {}.", path.display()))?;

    if let Some(key) = key {
        resolved = resolved
            .get(key)
            .wrap_err_with(|| miette!("Failed to resolve {key} below {name}."))?;
    }

    print_resolved(resolved)
}


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    // Load configuration.
    let configuration = match cli_args.configuration_file_path.as_ref() {
        Some(path) => Configuration::load_from_path(path),
        None => Configuration::load_from_default_path(),
    }
    .wrap_err("Failed to load configuration file.")?;


    let logging = LoggingConfigurator::new();
    logging
        .install()
        .wrap_err("Failed to initialize tracing.")?;

    let project_override = match &cli_args.command {
        CLICommand::Init { project, .. } => project.as_deref(),
        _ => None,
    };

    let logging_options: LoggingOptions = configuration
        .logging
        .to_logging_options(project_override);

    logging
        .configure(logging_options)
        .wrap_err("Failed to configure logging.")?;

    debug!(
        settings = ?configuration.file_path,
        "Configuration loaded."
    );


    match cli_args.command {
        CLICommand::Paths => {
            command_paths(&configuration, &logging);
            Ok(())
        }
        CLICommand::Init { project, values } => command_init(&configuration, project, &values),
        CLICommand::Dump { path } => command_dump(&path),
        CLICommand::Get { path, name, key } => command_get(&path, &name, key.as_deref()),
    }
}
