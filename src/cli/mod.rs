use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vault-connector",
    version,
    about = "Sync HashiCorp Vault users, roles and policies"
)]
pub struct Cli {
    /// Path to a config file (json, yaml or toml).
    #[arg(short, long, global = true)]
    pub config: Option<String>,
    /// Vault address, e.g. http://127.0.0.1:8200.
    #[arg(long, global = true)]
    pub vault_host: Option<String>,
    /// Vault token used for every request.
    #[arg(long, global = true)]
    pub vault_token: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full sync pass and print the report as JSON.
    Sync(SyncOpts),
    /// Grant an entitlement to a user.
    Grant(GrantOpts),
    /// Revoke a grant.
    Revoke(RevokeOpts),
    /// Check that the configured token is accepted.
    Validate,
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct SyncOpts {
    /// Pretty-print the report.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(clap::Args)]
pub struct GrantOpts {
    /// Entitlement id, e.g. `policy:ops:assigned`.
    #[arg(short, long)]
    pub entitlement: String,
    /// Userpass user name.
    #[arg(short, long)]
    pub principal: String,
}

#[derive(clap::Args)]
pub struct RevokeOpts {
    /// Grant id, e.g. `policy:ops:assigned:user:alice`.
    #[arg(short, long)]
    pub grant: String,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_takes_entitlement_and_principal() {
        let cli = Cli::parse_from([
            "vault-connector",
            "--vault-host",
            "http://vault:8200",
            "grant",
            "--entitlement",
            "policy:ops:assigned",
            "--principal",
            "alice",
        ]);
        assert_eq!(cli.vault_host.as_deref(), Some("http://vault:8200"));
        let Commands::Grant(opts) = cli.command else {
            panic!("expected grant");
        };
        assert_eq!(opts.entitlement, "policy:ops:assigned");
        assert_eq!(opts.principal, "alice");
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::parse_from(["vault-connector", "config", "show", "--config", "vc.yaml"]);
        assert_eq!(cli.config.as_deref(), Some("vc.yaml"));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigOpts {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn revoke_requires_grant_id() {
        assert!(Cli::try_parse_from(["vault-connector", "revoke"]).is_err());
    }
}
