use health_export_etl::cli;

fn main() {
    if let Err(e) = cli::cli() {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
