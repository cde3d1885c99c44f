use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use claim_signer::claim::{DOMAIN_NAME, DOMAIN_VERSION};
use claim_signer::config::{DEFAULT_CHAIN_ID, DEFAULT_PRIVATE_KEY, DEFAULT_VERIFYING_CONTRACT};
use claim_signer::utils::logging;
use claim_signer::{log_error, log_info, SignerConfig};
use secrecy::SecretString;

/// Sign an EIP-712 `Claim` and print the signature with its v, r, s components.
///
/// Every option defaults to the local development setup, so a bare run signs
/// a claim for the signer's own address on chain 31337.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Private key (hex string, 0x optional). Use throwaway keys only.
    #[arg(
        long,
        env = "CLAIM_SIGNER_PRIVATE_KEY",
        default_value = DEFAULT_PRIVATE_KEY,
        hide_default_value = true,
        hide_env_values = true
    )]
    private_key: String,

    /// EIP-155 chain id of the domain.
    #[arg(long, default_value_t = DEFAULT_CHAIN_ID)]
    chain_id: u64,

    /// Contract that verifies the claim.
    #[arg(long, default_value = DEFAULT_VERIFYING_CONTRACT)]
    verifying_contract: String,

    #[arg(long, default_value = DOMAIN_NAME)]
    domain_name: String,

    #[arg(long, default_value = DOMAIN_VERSION)]
    domain_version: String,

    /// Claim recipient. Defaults to the signer's address.
    #[arg(long)]
    recipient: Option<String>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    status: bool,

    #[arg(long, default_value_t = 0)]
    nonce: u64,

    /// Print a single JSON document instead of text lines.
    #[arg(long)]
    json: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> SignerConfig {
        SignerConfig {
            private_key: SecretString::from(self.private_key),
            domain_name: self.domain_name,
            domain_version: self.domain_version,
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
            recipient: self.recipient,
            status: self.status,
            nonce: self.nonce,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    let json = cli.json;
    let config = cli.into_config();
    config
        .validate()
        .context("invalid signer configuration")?;

    let report = match claim_signer::run(&config) {
        Ok(report) => report,
        Err(e) => {
            log_error!(
                "main",
                "claim signing failed",
                error = e,
                chain_id = config.chain_id,
            );
            return Err(e).context("failed to sign claim");
        }
    };

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }

    log_info!(
        "main",
        "claim signed",
        signer = report.signer,
        chain_id = config.chain_id,
    );

    Ok(())
}
