//! Command-line interface definitions for the `locker` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{miette, Result};
use locker::formats::ini::IniSection;



/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "locker",
    author,
    about = "Inspect and bootstrap the per-user configuration and log directories.",
    version
)]
pub struct CLIArgs {
    /// This is the path to the settings file to use.
    /// If unspecified, this defaults to `~/utilities/locker.toml`
    /// (and to built-in defaults if that file does not exist).
    #[arg(
        short = 'c',
        long = "configuration-file-path",
        global = true,
        help = "Path to the settings file to use. Defaults to ~/utilities/locker.toml"
    )]
    pub configuration_file_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CLICommand,
}


#[derive(Subcommand)]
pub enum CLICommand {
    /// Print the storage layout and the log directory in use.
    Paths,

    /// Create the storage layout and a project configuration file (if missing).
    Init {
        #[arg(
            short = 'p',
            long = "project",
            help = "Project whose <config>/<project>.ini should be created. \
                    Defaults to the project from the settings file."
        )]
        project: Option<String>,

        #[arg(
            long = "set",
            value_name = "SECTION.KEY=VALUE",
            help = "Initial value for the project file. May be repeated."
        )]
        values: Vec<String>,
    },

    /// Print the raw contents of a configuration file, or the names a directory exposes.
    Dump {
        path: PathBuf,
    },

    /// Resolve NAME (and optionally KEY below it) against a configuration file or directory.
    Get {
        path: PathBuf,

        name: String,

        key: Option<String>,
    },
}


/// Parse `SECTION.KEY=VALUE` into its three parts.
/// The section ends at the first `.`, the key at the first `=`.
pub fn parse_section_assignment(assignment: &str) -> Result<(String, String, String)> {
    let (path, value) = assignment.split_once('=').ok_or_else(|| {
        miette!(
            "Failed to parse initial value: expected SECTION.KEY=VALUE, got {}.",
            assignment
        )
    })?;

    let (section, key) = path.split_once('.').ok_or_else(|| {
        miette!(
            "Failed to parse initial value: expected a SECTION.KEY path, got {}.",
            path
        )
    })?;

    let (section, key) = (section.trim(), key.trim());
    if section.is_empty() || key.is_empty() {
        return Err(miette!(
            "Failed to parse initial value: section and key must not be empty in {}.",
            assignment
        ));
    }


    Ok((section.to_string(), key.to_string(), value.trim().to_string()))
}


/// Group `SECTION.KEY=VALUE` assignments into INI sections, in first-seen order.
pub fn sections_from_assignments(assignments: &[String]) -> Result<Vec<IniSection>> {
    let mut sections: Vec<IniSection> = Vec::new();

    for assignment in assignments {
        let (section_name, key, value) = parse_section_assignment(assignment)?;

        let position = match sections.iter().position(|section| section.name == section_name) {
            Some(position) => position,
            None => {
                sections.push(IniSection::new(section_name));
                sections.len() - 1
            }
        };

        let entries = &mut sections[position].entries;
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }


    Ok(sections)
}
