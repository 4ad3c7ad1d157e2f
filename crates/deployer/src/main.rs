use clap::Parser;

#[tokio::main]
async fn main() {
    let args = deployer::arguments::Arguments::parse();
    observe::tracing::initialize(&args.logging.observe_config());
    tracing::info!("running deployer with validated arguments:\n{}", args);
    if let Err(err) = deployer::run(args).await {
        tracing::error!("deployment failed: {err:?}");
        std::process::exit(1);
    }
}
