use clap::Parser;
use proxy_probe::cli::Cli;
use proxy_probe::check_proxy;
use proxy_probe::output::OutputWriter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = cli.into_config()?;

    let result = check_proxy(&cfg.target, &cfg.probe).await;
    let mut out = OutputWriter::stdout(cfg.output);
    out.write_result(&result)?;

    Ok(())
}
