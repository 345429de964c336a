//! Command-line entry point for artistdl
mod cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        // Config errors can happen before the logger exists
        if log::log_enabled!(log::Level::Error) {
            log::error!("{e}");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
