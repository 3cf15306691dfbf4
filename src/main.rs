use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = wiretap::cli::Cli::parse();
    if let Err(e) = wiretap::run::execute(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
