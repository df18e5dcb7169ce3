use dblog_file::cli::{output, Cli};

fn main() {
    // Initialize CLI and execute command
    if let Err(e) = Cli::run() {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
