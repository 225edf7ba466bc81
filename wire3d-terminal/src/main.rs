/// wire3d terminal viewer
///
/// Usage: wire3d-terminal [scene.toml]
///
/// Controls:
///   - WASD / Arrow Keys: Rotate the selected object
///   - E/R: Roll rotation
///   - Space: Toggle spinning
///   - `:` opens the console (translate, scale, rotate, add-object,
///     add-texture, show, hide, remove, select, list, quit)
///   - Q/ESC: Quit

use std::env;
use std::io;
use wire3d_core::SceneConfig;
use wire3d_terminal::TerminalApp;

fn main() -> io::Result<()> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => SceneConfig::load(&path).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to load config {}: {}", path, e),
            )
        })?,
        None => SceneConfig::default(),
    };
    log::info!("starting with {:?}", config);

    let mut app = TerminalApp::new(config)?;
    app.run()?;

    println!("wire3d terminal closed");
    Ok(())
}
