use std::{fs::OpenOptions, path::PathBuf, sync::Arc, sync::Mutex};

use anyhow::{anyhow, Context, Result};
use presale_core::chain::rpc::EthersChain;
use presale_core::config::Config;
use presale_core::notify::ToastBoard;
use presale_core::referral::referral_code;
use presale_core::PresaleService;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod action;
mod app;
mod data;
mod pages;
mod prompt;
mod widgets;

use app::App;
use prompt::ChannelPrompt;

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<String>,
    referral: Option<String>,
}

/// `dashboard [--config FILE] [--ref CODE | URL]`
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                parsed.config = Some(args.next().ok_or_else(|| anyhow!("--config needs a path"))?);
            }
            "--ref" => {
                let code = args.next().ok_or_else(|| anyhow!("--ref needs a code"))?;
                parsed.referral = referral_code(&code);
            }
            other if other.starts_with('-') => return Err(anyhow!("unknown option {other}")),
            url => parsed.referral = referral_code(url),
        }
    }
    Ok(parsed)
}

fn init_logging(config: &Config) -> Result<()> {
    let path = config
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("dashboard.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Error opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    init_logging(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let (prompt, prompts) = ChannelPrompt::new();
    let chain = runtime
        .block_on(EthersChain::connect(&config, Arc::new(prompt)))
        .context("Failed to connect to RPC endpoint")?;
    info!(contract = ?config.contract_address, "connected to {}", config.rpc_url);

    let board = Arc::new(ToastBoard::new());
    let service = Arc::new(PresaleService::new(Arc::new(chain), board.clone(), config));

    if let Some(code) = args.referral {
        let service = service.clone();
        runtime.spawn(async move {
            match service.handle_referral_registration(Some(&code)).await {
                Ok(outcome) => info!(?outcome, "referral code {code} handled"),
                Err(e) => warn!("Error handling referral registration: {e}"),
            }
        });
    }

    let mut terminal = ratatui::init();

    let mut app = App::new(service, board, runtime.handle().clone(), prompts);

    let app_result = app.run(&mut terminal);

    ratatui::restore();
    app_result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn referral_from_launch_url_or_flag() {
        let parsed = args(&["https://presale.example/?ref=0xabc"]).unwrap();
        assert_eq!(parsed.referral.as_deref(), Some("0xabc"));

        let parsed = args(&["--config", "presale.json", "--ref", "0xdef"]).unwrap();
        assert_eq!(parsed.config.as_deref(), Some("presale.json"));
        assert_eq!(parsed.referral.as_deref(), Some("0xdef"));

        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }
}
