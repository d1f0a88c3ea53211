use argh::FromArgs;
use std::path::PathBuf;

use mvexport::sfm::{
    export::{run_export, ExportConfig},
    io::sfm_json::read_sfm_data_json,
};

#[derive(FromArgs)]
/// Convert an openMVG sfm_data.json scene to an MVE scene directory
struct Args {
    /// path to the sfm_data.json scene file to convert
    #[argh(option, short = 'i')]
    sfmdata: PathBuf,

    /// path to the output scene directory
    #[argh(option, short = 'o', default = "PathBuf::from(\"obsolete_SfM_output\")")]
    outdir: PathBuf,

    /// quality of re-encoded and undistorted images, from 0 to 100
    #[argh(option, default = "95")]
    jpeg_quality: u8,

    /// number of threads used to undistort images, all cores by default
    #[argh(option)]
    threads: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    if let Some(num_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()?;
    }

    let scene = read_sfm_data_json(&args.sfmdata)?;
    log::info!(
        "Loaded {} with {} views and {} landmarks",
        args.sfmdata.display(),
        scene.views.len(),
        scene.landmarks.len()
    );

    let config = ExportConfig {
        jpeg_quality: args.jpeg_quality.min(100),
        ..ExportConfig::new(args.outdir)
    };

    let summary = run_export(&scene, &config)?;
    log::info!("{summary}");

    Ok(())
}
