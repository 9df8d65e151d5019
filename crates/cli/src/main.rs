fn main() -> Result<(), Box<dyn std::error::Error>> {
    cxref_cli::run()
}
