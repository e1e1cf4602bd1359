use std::path::{Path, PathBuf};

use anyhow::Result;
use objlit::config::{DemoConfig, DEFAULT_CONFIG_PATH};

fn start(path: &Path) -> Result<()> {
    let settings = DemoConfig::load(path)?;
    pollster::block_on(objlit::run(settings))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if let Err(err) = start(&path) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}
