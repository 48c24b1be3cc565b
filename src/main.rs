use std::process;

fn main() {
    if let Err(e) = domus::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
