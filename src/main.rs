use anyhow::Result;
use colwm::{Config, WindowManager};

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load_or_default();
    let mut wm = WindowManager::new(config)?;
    wm.run()?;

    Ok(())
}
