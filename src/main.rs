use clap::Parser;
use shoot::infrastructure::config::Config;
use shoot::infrastructure::{logging, output};
use shoot::presentation::cli::{Cli, Exit, is_usage_error};

/// shoot: send one HTTP request and see what comes back
///
/// Accepts URL shorthands (`:3000/users`, `example.com`) and `{alias}`
/// expressions, infers content types for body files, can sign with AWS SigV4
/// and keeps a local history of every request sent.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::from_env();

    match cli.run(&config).await {
        Ok(Exit::Success) => {}
        Ok(Exit::StatusFailure) => std::process::exit(1),
        Err(err) => {
            output::print_error(&err);
            if is_usage_error(&err) {
                output::print_usage_hint();
                std::process::exit(2);
            }
            std::process::exit(1);
        }
    }
}
