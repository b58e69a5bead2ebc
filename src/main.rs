use scene_viewer::{ViewerConfig, flow};

fn main() {
    flow::init_logging();
    let config = ViewerConfig::from_env();
    if let Err(e) = flow::run(config) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
