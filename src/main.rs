//! Corax Provider - drive Corax resources from plan and state documents
//!
//! Every lifecycle command prints `{"state": ..., "diagnostics": [...]}` on
//! stdout and exits non-zero when an error diagnostic was raised.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use corax_provider::{
    cli::{CapabilityTypesCommand, Cli, Command, load_document},
    client::DefaultModelDeploymentUpdate,
    config::ProviderConfig,
    harness::{Response, Severity},
    provider::{self, Provider},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Schemas are static; no endpoint or key needed.
    if let Command::Schema { resource_type } = &cli.command {
        return run_schema(resource_type.as_deref());
    }

    let Some(provider) = build_provider(cli.config.as_deref()) else {
        return ExitCode::FAILURE;
    };

    match cli.command {
        Command::CapabilityTypes(cmd) => run_capability_types(&provider, cmd).await,
        command => run_lifecycle(&provider, command).await,
    }
}

/// Load configuration and register resources
fn build_provider(config_path: Option<&Path>) -> Option<Provider> {
    let config = match ProviderConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            eprintln!("❌ {e}");
            return None;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %config.api_endpoint,
        "Starting Corax provider"
    );

    match Provider::new(&config) {
        Ok(provider) => Some(provider),
        Err(e) => {
            eprintln!("❌ Failed to configure provider: {e}");
            None
        }
    }
}

/// Print resource schemas
fn run_schema(resource_type: Option<&str>) -> ExitCode {
    match resource_type {
        Some(name) => match provider::resource_schema(name) {
            Ok(schema) => print_json(&schema),
            Err(e) => {
                eprintln!("❌ {e}");
                ExitCode::FAILURE
            }
        },
        None => print_json(&provider::resource_schemas()),
    }
}

/// Run create, read, update, delete or import
async fn run_lifecycle(provider: &Provider, command: Command) -> ExitCode {
    match execute(provider, command).await {
        Ok(response) => emit(&response),
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(provider: &Provider, command: Command) -> anyhow::Result<Response> {
    let response = match command {
        Command::Create { resource_type, plan } => {
            let resource = provider.resource(&resource_type)?;
            resource.create(load_document(&plan)?).await
        }
        Command::Read { resource_type, state } => {
            let resource = provider.resource(&resource_type)?;
            resource.read(load_document(&state)?).await
        }
        Command::Update {
            resource_type,
            plan,
            state,
        } => {
            let resource = provider.resource(&resource_type)?;
            let plan = load_document(&plan)?;
            let prior = load_document(&state)?;
            resource.update(plan, prior).await
        }
        Command::Delete { resource_type, state } => {
            let resource = provider.resource(&resource_type)?;
            resource.delete(load_document(&state)?).await
        }
        Command::Import { resource_type, id } => {
            let resource = provider.resource(&resource_type)?;
            let imported = resource.import(&id);
            // Import only seeds the id; a read fills in the rest.
            match imported.state.clone() {
                Some(seed) if !imported.diagnostics.has_error() => resource.read(seed).await,
                _ => imported,
            }
        }
        Command::Schema { .. } | Command::CapabilityTypes(_) => {
            anyhow::bail!("not a lifecycle command")
        }
    };
    Ok(response)
}

/// Capability type defaults
async fn run_capability_types(provider: &Provider, cmd: CapabilityTypesCommand) -> ExitCode {
    let client = provider.client();
    match cmd {
        CapabilityTypesCommand::List => match client.list_capability_types().await {
            Ok(types) => print_json(&types),
            Err(e) => {
                eprintln!("❌ Failed to list capability types: {e}");
                ExitCode::FAILURE
            }
        },
        CapabilityTypesCommand::Get { capability_type } => {
            match client.get_capability_type(&capability_type).await {
                Ok(found) => print_json(&found),
                Err(e) => {
                    eprintln!("❌ Failed to read capability type {capability_type}: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        CapabilityTypesCommand::SetDefault {
            capability_type,
            deployment_id,
        } => {
            let update = DefaultModelDeploymentUpdate {
                default_model_deployment_id: deployment_id,
            };
            match client
                .set_capability_type_default_model(&capability_type, &update)
                .await
            {
                Ok(updated) => {
                    info!(
                        capability_type = %capability_type,
                        deployment_id = %update.default_model_deployment_id,
                        "Default model deployment set"
                    );
                    print_json(&updated)
                }
                Err(e) => {
                    eprintln!("❌ Failed to set default model for {capability_type}: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Print a lifecycle response and echo its diagnostics on stderr
fn emit(response: &Response) -> ExitCode {
    for diagnostic in &response.diagnostics {
        match diagnostic.severity {
            Severity::Error => eprintln!("❌ {diagnostic}"),
            Severity::Warning => eprintln!("⚠️  {diagnostic}"),
        }
    }

    let code = print_json(response);
    if response.diagnostics.has_error() {
        ExitCode::FAILURE
    } else {
        code
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Failed to serialize to JSON: {e}");
            ExitCode::FAILURE
        }
    }
}
