//! Command-line interface

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::{Error, Result};

/// Corax provider - drive Corax resource lifecycles from plan and state documents
#[derive(Parser, Debug)]
#[command(name = "corax-provider")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CORAX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "CORAX_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "CORAX_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print resource schemas as JSON
    Schema {
        /// Only this resource type
        resource_type: Option<String>,
    },

    /// Create a resource from a plan document
    Create {
        /// Resource type, e.g. `corax_project`
        resource_type: String,

        /// Plan document (JSON or YAML)
        #[arg(long)]
        plan: PathBuf,
    },

    /// Refresh a resource from its state document
    Read {
        /// Resource type
        resource_type: String,

        /// State document (JSON or YAML)
        #[arg(long)]
        state: PathBuf,
    },

    /// Update a resource from a plan and its prior state
    Update {
        /// Resource type
        resource_type: String,

        /// Plan document (JSON or YAML)
        #[arg(long)]
        plan: PathBuf,

        /// Prior state document (JSON or YAML)
        #[arg(long)]
        state: PathBuf,
    },

    /// Delete the resource described by a state document
    Delete {
        /// Resource type
        resource_type: String,

        /// State document (JSON or YAML)
        #[arg(long)]
        state: PathBuf,
    },

    /// Import an existing resource by id
    Import {
        /// Resource type
        resource_type: String,

        /// Resource id
        id: String,
    },

    /// Capability type defaults
    #[command(subcommand, name = "capability-types")]
    CapabilityTypes(CapabilityTypesCommand),
}

/// Capability type subcommands
#[derive(Subcommand, Debug)]
pub enum CapabilityTypesCommand {
    /// List capability types and their default deployments
    List,

    /// Show one capability type
    Get {
        /// Capability type, e.g. `chat`
        capability_type: String,
    },

    /// Set the default model deployment of a capability type
    SetDefault {
        /// Capability type
        capability_type: String,

        /// Model deployment id
        deployment_id: String,
    },
}

/// Read a plan or state document.
///
/// YAML is a superset of JSON, so one parser covers both formats.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read, [`Error::Yaml`] when
/// it cannot be parsed, and [`Error::Validation`] when it is not a mapping.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let document: Value = serde_yaml::from_str(&content)?;
    if !document.is_object() {
        return Err(Error::validation(format!(
            "{} must contain a mapping of attributes",
            path.display()
        )));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update() {
        let cli = Cli::try_parse_from([
            "corax-provider",
            "update",
            "corax_project",
            "--plan",
            "plan.yaml",
            "--state",
            "state.json",
        ])
        .unwrap();
        match cli.command {
            Command::Update {
                resource_type,
                plan,
                state,
            } => {
                assert_eq!(resource_type, "corax_project");
                assert_eq!(plan, PathBuf::from("plan.yaml"));
                assert_eq!(state, PathBuf::from("state.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_capability_types() {
        let cli = Cli::try_parse_from([
            "corax-provider",
            "capability-types",
            "set-default",
            "chat",
            "dep-1",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::CapabilityTypes(CapabilityTypesCommand::SetDefault { .. })
        ));
    }

    #[test]
    fn test_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("plan.yaml");
        let mut f = std::fs::File::create(&yaml).unwrap();
        writeln!(f, "name: test-project\nis_public: true").unwrap();
        drop(f);

        let json = dir.path().join("plan.json");
        std::fs::write(&json, r#"{"name": "test-project", "is_public": true}"#).unwrap();

        assert_eq!(load_document(&yaml).unwrap(), load_document(&json).unwrap());
    }

    #[test]
    fn test_load_rejects_non_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.yaml");
        std::fs::write(&path, "- a\n- b\n").unwrap();
        assert!(matches!(load_document(&path), Err(Error::Validation(_))));
    }
}
