fn main() {
    let config = vigil_tui::config::load_config();
    if let Err(e) = vigil_tui::run(config) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
