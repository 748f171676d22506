use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use vault_connector::cli::{Cli, Commands, ConfigAction};
use vault_connector::config::{validate_config, validate_config_object, Config, DEFAULT_CONFIG_FILE};
use vault_connector::connector::Connector;
use vault_connector::gateway::{AbortHandle, HttpGateway};
use vault_connector::logging;
use vault_connector::resources::{Entitlement, Grant, ResourceId, ResourceKind};
use vault_connector::sync::run_full_sync;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Commands that need no configuration.
    match cli.command {
        Commands::Version => {
            println!("vault-connector {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Config(ref opts) if matches!(opts.action, ConfigAction::Init) => {
            let path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
            Config::write_default(path)?;
            println!("Configuration file created at {path}");
            return Ok(());
        }
        _ => {}
    }

    let config_path = Config::locate(cli.config.as_deref());
    let mut config = Config::load_from(config_path.as_deref())?;
    config.apply_cli_overrides(cli.vault_host.as_deref(), cli.vault_token.as_deref());
    logging::init(&config.logging);
    match config_path {
        Some(ref p) => info!("Loaded config from {}", p.display()),
        None => info!("No config file found, using defaults"),
    }

    match cli.command {
        Commands::Config(opts) => match opts.action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            }
            ConfigAction::Validate => {
                let errors = validate_config(&config);
                if errors.is_empty() {
                    info!("Configuration is valid");
                } else {
                    for e in &errors {
                        warn!("{}", e);
                    }
                    anyhow::bail!("{} configuration error(s)", errors.len());
                }
            }
            // Written before loading.
            ConfigAction::Init => {}
        },
        Commands::Validate => {
            let connector = connect(&config)?;
            connector.validate().await?;
            println!("ok");
        }
        Commands::Sync(opts) => {
            let connector = connect(&config)?;
            let report = run_full_sync(&connector).await?;
            let out = if opts.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{out}");
        }
        Commands::Grant(opts) => {
            let entitlement = Entitlement::from_id(&opts.entitlement).map_err(anyhow::Error::msg)?;
            let principal = ResourceId::new(ResourceKind::User, opts.principal);
            let connector = connect(&config)?;
            connector
                .grant(&principal, &entitlement)
                .await
                .with_context(|| format!("granting {} to {}", entitlement.id(), principal))?;
            info!("Granted {} to {}", entitlement.id(), principal);
        }
        Commands::Revoke(opts) => {
            let grant = Grant::parse_id(&opts.grant).map_err(anyhow::Error::msg)?;
            let connector = connect(&config)?;
            connector
                .revoke(&grant)
                .await
                .with_context(|| format!("revoking {}", grant.id()))?;
            info!("Revoked {}", grant.id());
        }
        Commands::Version => {}
    }

    Ok(())
}

/// Validate config, build the HTTP connector, and cancel in-flight requests
/// on Ctrl-C.
fn connect(config: &Config) -> anyhow::Result<Connector> {
    validate_config_object(config)?;

    let abort = AbortHandle::new();
    let gateway = HttpGateway::new(&config.vault)?.with_abort_handle(abort.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight requests");
            abort.abort();
        }
    });

    info!("Connecting to Vault at {}", config.vault.address);
    Ok(Connector::from_gateway(Arc::new(gateway), config))
}
