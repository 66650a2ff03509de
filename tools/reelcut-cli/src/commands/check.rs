//! Check system capabilities.

use reelcut_common::config::AppConfig;
use reelcut_render_engine::codec::{CodecEngine, FfmpegCliEngine};
use reelcut_render_engine::export::{discover_system_font, SystemCapabilities};

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("reelcut System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;

    let mut engine = FfmpegCliEngine::new(config.export.ffmpeg_binary.clone());
    match engine.load().await {
        Ok(()) => println!("[OK] ffmpeg: {}", config.export.ffmpeg_binary),
        Err(e) => {
            all_ok = false;
            println!("[FAIL] ffmpeg: {e:#}");
            println!("       Install ffmpeg or set export.ffmpeg_binary in the config file.");
        }
    }

    let font_path = config.export.font_path.clone().or_else(discover_system_font);
    match font_path {
        Some(path) => match SystemCapabilities::new(config.export.ffmpeg_binary.clone()).with_font_path(&path) {
            Ok(_) => println!("[OK] Font: {}", path.display()),
            Err(e) => println!("[WARN] Font {}: {e}", path.display()),
        },
        None => {
            println!("[WARN] Font: none found; text elements will render empty");
            println!("       Set export.font_path in the config file or pass --font to export.");
        }
    }

    println!(
        "[OK] Config: {}",
        reelcut_common::config::config_file_path().display()
    );

    println!();
    if all_ok {
        println!("All required capabilities are available. reelcut is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}
