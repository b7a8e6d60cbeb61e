use clap::Parser;
use random_people::app::{build_coordinator, session::Session};
use random_people::domain::ports::ConfigProvider;
use random_people::utils::logger;
use random_people::CliConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // parse command line
    let cli = CliConfig::parse();

    // init logging
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting random-people");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // load and validate configuration
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // wire transports, store and coordinator
    let coordinator = build_coordinator(&config).await?;

    // run the session; returns once every started operation settled
    let mut session = Session::new(coordinator, config.default_parameters());
    session.run(tokio::io::stdin()).await?;

    Ok(())
}
