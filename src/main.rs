mod cli;
mod router;

use tracing_subscriber::EnvFilter;

use symdex::output::format_error;

/// Log to stderr so stdout stays clean for entry output. `RUST_LOG` wins
/// over the `-v` count.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "symdex=warn",
        1 => "symdex=info",
        _ => "symdex=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let parsed = cli::parse();
    init_tracing(parsed.verbose);
    let json = matches!(&parsed.command, cli::Command::Extract(args) if args.json);
    if let Err(err) = router::dispatch(parsed) {
        std::process::exit(format_error(&err, json));
    }
}
