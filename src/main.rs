use colored::Colorize;

fn main() {
    if let Err(e) = clinadmin::app::run_cli() {
        eprintln!("{} {}", "[ERR]".red().bold(), e);
        std::process::exit(1);
    }
}
