fn main() {
    if let Err(err) = luna::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
