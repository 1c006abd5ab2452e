//! Profile Views CLI
//!
//! Command-line interface for projecting, patching and fetching profiles.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
#[cfg(feature = "remote")]
use std::sync::Arc;

#[cfg(feature = "remote")]
use clap::Args;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use profile_views::{
    input_schema, load_json, merge, project, to_patch, validate_update, Binding, SchemaRegistry,
};
#[cfg(feature = "remote")]
use profile_views::{Config, HttpBackend, Overrides, ProfileService, ServiceError};

#[derive(Parser)]
#[command(name = "profile-views")]
#[command(about = "Project, patch and fetch profiles through view bindings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered view bindings and their fields
    Bindings,

    /// Project a canonical profile into a view
    Project {
        /// Canonical profile JSON file
        profile: PathBuf,

        /// Related-profiles JSON file ({manager, directs})
        #[arg(long)]
        related: Option<PathBuf>,

        /// View binding to project into
        #[arg(long, short, default_value = "profile")]
        binding: String,
    },

    /// Reverse-project a view update into a canonical patch
    Patch {
        /// View update JSON file
        update: PathBuf,

        /// View binding the update is written against
        #[arg(long, short, default_value = "displayProfile")]
        binding: String,
    },

    /// Apply a view update to a canonical profile and re-project it
    Merge {
        /// Canonical profile JSON file
        profile: PathBuf,

        /// View update JSON file
        update: PathBuf,

        /// View binding the update is written against
        #[arg(long, short, default_value = "displayProfile")]
        binding: String,
    },

    /// Print the JSON Schema for a binding's update input
    Schema {
        /// View binding
        #[arg(long, short, default_value = "displayProfile")]
        binding: String,
    },

    /// Fetch a profile from the backends and project it
    #[cfg(feature = "remote")]
    Fetch {
        /// Profile identifier (defaults to the configured default)
        identifier: Option<String>,

        /// View binding to project into
        #[arg(long, short, default_value = "profile")]
        binding: String,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Apply a view update to a fetched profile and print the result
    #[cfg(feature = "remote")]
    Update {
        /// View update JSON file
        update: PathBuf,

        /// Username of the profile to update
        #[arg(long, short)]
        username: Option<String>,

        /// View binding the update is written against
        #[arg(long, short, default_value = "displayProfile")]
        binding: String,

        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[cfg(feature = "remote")]
#[derive(Args)]
struct BackendArgs {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Profile store base URL
    #[arg(long, env = "SEARCH_SERVICE")]
    search_service: Option<String>,

    /// Relation store base URL
    #[arg(long, env = "ORGCHART_SERVICE")]
    orgchart_service: Option<String>,

    /// Identifier used when none is given
    #[arg(long, env = "DEFAULT_IDENTIFIER")]
    default_identifier: Option<String>,

    /// Backend request timeout in seconds
    #[arg(long, env = "BACKEND_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = match SchemaRegistry::standard() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let pretty = cli.pretty;
    let result = match cli.command {
        Commands::Bindings => run_bindings(&registry, pretty),
        Commands::Project {
            profile,
            related,
            binding,
        } => run_project(&registry, &binding, &profile, related.as_deref(), pretty),
        Commands::Patch { update, binding } => run_patch(&registry, &binding, &update, pretty),
        Commands::Merge {
            profile,
            update,
            binding,
        } => run_merge(&registry, &binding, &profile, &update, pretty),
        Commands::Schema { binding } => run_schema(&registry, &binding, pretty),
        #[cfg(feature = "remote")]
        Commands::Fetch {
            identifier,
            binding,
            backend,
        } => run_fetch(registry, &binding, identifier.as_deref(), backend, pretty),
        #[cfg(feature = "remote")]
        Commands::Update {
            update,
            username,
            binding,
            backend,
        } => run_update(registry, &binding, username.as_deref(), &update, backend, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout stays pure JSON.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_bindings(registry: &SchemaRegistry, pretty: bool) -> Result<(), u8> {
    let summaries: Vec<_> = registry.iter().map(Binding::summary).collect();
    let value = serde_json::to_value(&summaries).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    print_json(&value, pretty)
}

fn run_project(
    registry: &SchemaRegistry,
    binding: &str,
    profile: &Path,
    related: Option<&Path>,
    pretty: bool,
) -> Result<(), u8> {
    let binding = lookup(registry, binding)?;
    let canonical = load(profile, "profile")?;
    let related = related.map(|path| load(path, "related profiles")).transpose()?;
    let view = project(&canonical, related.as_ref(), binding);
    print_json(&view, pretty)
}

fn run_patch(registry: &SchemaRegistry, binding: &str, update: &Path, pretty: bool) -> Result<(), u8> {
    let binding = lookup(registry, binding)?;
    let update = load(update, "update")?;
    let patch = to_patch(&update, binding).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    print_json(&patch, pretty)
}

fn run_merge(
    registry: &SchemaRegistry,
    binding: &str,
    profile: &Path,
    update: &Path,
    pretty: bool,
) -> Result<(), u8> {
    let binding = lookup(registry, binding)?;
    let canonical = load(profile, "profile")?;
    let update = load(update, "update")?;

    if let Err(errors) = validate_update(binding, &update) {
        eprintln!("Update rejected:");
        for error in errors {
            eprintln!("  {}", error);
        }
        return Err(1);
    }

    let patch = to_patch(&update, binding).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;
    let merged = merge(&canonical, &patch);
    print_json(&project(&merged, None, binding), pretty)
}

fn run_schema(registry: &SchemaRegistry, binding: &str, pretty: bool) -> Result<(), u8> {
    let binding = lookup(registry, binding)?;
    print_json(&input_schema(binding), pretty)
}

#[cfg(feature = "remote")]
fn run_fetch(
    registry: SchemaRegistry,
    binding: &str,
    identifier: Option<&str>,
    args: BackendArgs,
    pretty: bool,
) -> Result<(), u8> {
    let service = build_service(registry, args)?;
    let view = service.query(binding, identifier).map_err(report_service_error)?;
    print_json(&view, pretty)
}

#[cfg(feature = "remote")]
fn run_update(
    registry: SchemaRegistry,
    binding: &str,
    username: Option<&str>,
    update: &Path,
    args: BackendArgs,
    pretty: bool,
) -> Result<(), u8> {
    let update = load(update, "update")?;
    let service = build_service(registry, args)?;
    let view = service
        .update(binding, username, &update)
        .map_err(report_service_error)?;
    print_json(&view, pretty)
}

#[cfg(feature = "remote")]
fn build_service(
    registry: SchemaRegistry,
    args: BackendArgs,
) -> Result<ProfileService<HttpBackend>, u8> {
    let overrides = Overrides {
        search_service: args.search_service,
        orgchart_service: args.orgchart_service,
        default_identifier: args.default_identifier,
        timeout_secs: args.timeout_secs,
    };
    let config = Config::load(args.config.as_deref(), overrides).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let backend = HttpBackend::new(
        config.search_service.clone(),
        config.orgchart_service.clone(),
        config.timeout(),
    )
    .map_err(|e| {
        eprintln!("Error: {}", e);
        3u8
    })?;

    Ok(ProfileService::new(Arc::new(registry), backend)
        .with_default_identifier(config.default_identifier))
}

#[cfg(feature = "remote")]
fn report_service_error(err: ServiceError) -> u8 {
    match &err {
        ServiceError::Invalid { errors } => {
            eprintln!("Update rejected:");
            for error in errors {
                eprintln!("  {}", error);
            }
        }
        _ => eprintln!("Error: {}", err),
    }
    err.exit_code() as u8
}

fn lookup<'a>(registry: &'a SchemaRegistry, name: &str) -> Result<&'a Binding, u8> {
    registry.get(name).ok_or_else(|| {
        let known: Vec<&str> = registry.iter().map(Binding::name).collect();
        eprintln!(
            "Error: unknown binding \"{}\" (expected one of: {})",
            name,
            known.join(", ")
        );
        2u8
    })
}

fn load(path: &Path, what: &str) -> Result<Value, u8> {
    load_json(path).map_err(|e| {
        eprintln!("Error loading {}: {}", what, e);
        e.exit_code() as u8
    })
}

fn print_json(value: &Value, pretty: bool) -> Result<(), u8> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);
    Ok(())
}
