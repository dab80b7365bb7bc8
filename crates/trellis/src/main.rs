mod cli;
mod logging;
mod modules;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{debug, info};

use cli::{CliArgs, Commands};
use modules::ModuleSet;
use trellis_core::extension::{order_by_ordinal, ArchiveClassSource, DirectoryClassSource, ScanError};
use trellis_core::kernel::constants;
use trellis_core::verify::{pipeline_with_fetcher, HttpChecksumFetcher};
use trellis_core::{
    CoreConfig, ExtensionScanner, KernelError, ModuleRegistry, PluginLifecycle, VerificationContext,
};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(run(args));
    // A verification that hit its deadline may still be blocked on I/O;
    // do not wait for it.
    runtime.shutdown_background();
    code
}

async fn run(args: CliArgs) -> ExitCode {
    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    logging::init_logging(args.verbose);

    let Some(command) = args.command else {
        eprintln!("No command given. Run with --help for usage.");
        return ExitCode::FAILURE;
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Commands::Verify {
            file,
            url,
            checksum,
            plugin_id,
            plugin_version,
            timeout_secs,
        } => {
            let context = VerificationContext {
                url,
                checksum,
                plugin_id,
                plugin_version,
            };
            verify(config, file, context, Duration::from_secs(timeout_secs)).await
        }
        Commands::Scan {
            path,
            parallel,
            json,
        } => scan(&config, &path, parallel, json),
        Commands::Order { modules, shutdown } => order(&modules, shutdown),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Explicit `--config`, then `$TRELLIS_CONFIG`, then a default file in the
/// working directory, then built-in defaults.
fn load_config(explicit: Option<&Path>) -> Result<CoreConfig, KernelError> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(constants::CONFIG_ENV_VAR).map(PathBuf::from))
        .or_else(|| {
            constants::DEFAULT_CONFIG_FILES
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.is_file())
        });

    match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            Ok(CoreConfig::load(&path)?)
        }
        None => Ok(CoreConfig::default()),
    }
}

/// Verification does blocking file and network I/O, so it runs on the blocking
/// pool with an overall deadline. Checksum downloads get the same deadline.
async fn verify(
    config: CoreConfig,
    file: PathBuf,
    context: VerificationContext,
    timeout: Duration,
) -> Result<(), KernelError> {
    let label = context.plugin_label();
    let fetcher = Arc::new(HttpChecksumFetcher::with_timeout(timeout));
    let pipeline = pipeline_with_fetcher(&config.verification, fetcher);
    let lifecycle = PluginLifecycle::with_verifier(config, pipeline);
    let task = tokio::task::spawn_blocking(move || {
        lifecycle.verify(&context, &file)?;
        Ok::<_, KernelError>(file)
    });

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(KernelError::Other(format!(
            "verification timed out after {}s",
            timeout.as_secs()
        ))),
        Ok(Err(e)) => Err(KernelError::Other(format!("verification task failed: {}", e))),
        Ok(Ok(result)) => {
            let file = result?;
            info!("Artifact for {} passed verification", label);
            println!("Verified {}", file.display());
            Ok(())
        }
    }
}

fn scan(config: &CoreConfig, path: &Path, parallel: bool, json: bool) -> Result<(), KernelError> {
    let scanner = ExtensionScanner::new(config.scanner.clone());
    let found = if path.is_dir() {
        scanner.scan_index(&DirectoryClassSource::new(path), parallel)?
    } else {
        let archive = ArchiveClassSource::open(path).map_err(|source| ScanError::Index {
            path: path.to_path_buf(),
            source,
        })?;
        scanner.scan_index(&archive, parallel)?
    };
    let ordered = order_by_ordinal(found.values());

    if json {
        let rendered = serde_json::to_string_pretty(&ordered)
            .map_err(|e| KernelError::Other(format!("failed to render JSON: {}", e)))?;
        println!("{}", rendered);
        return Ok(());
    }

    if ordered.is_empty() {
        println!("No extensions found in {}", path.display());
    }
    for extension in ordered {
        println!(
            "{} ordinal={} plugins=[{}] points=[{}]",
            extension.class_name,
            extension.ordinal,
            extension.target_plugin_ids.join(","),
            extension.extension_points.join(",")
        );
    }
    Ok(())
}

fn order(modules: &Path, shutdown: bool) -> Result<(), KernelError> {
    let registry = ModuleRegistry::new();
    for descriptor in ModuleSet::load(modules)?.into_descriptors() {
        registry.register(descriptor)?;
    }

    let ordered = if shutdown {
        registry.get_shutdown_order()?
    } else {
        registry.get_startup_order()?
    };
    for module in ordered {
        if module.is_enabled() {
            println!("{}@{}", module.name(), module.version());
        } else {
            println!("{}@{} (disabled)", module.name(), module.version());
        }
    }
    Ok(())
}
