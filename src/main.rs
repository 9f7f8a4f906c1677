fn main() {
    if let Err(e) = valdag::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
