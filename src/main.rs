use log::{error, info, warn};

use prism::{
    cli::{self, Arguments},
    error::PrismError,
    get_progressbar,
    gpu::HostBuffers,
    scene::{BuildConfig, Scene},
};

fn main() {
    // Parsing cli args
    let cli_args = cli::parse_args();

    env_logger::Builder::new()
        .filter_level(cli_args.verbosity.log_level_filter())
        .init();

    if let Err(why) = run(&cli_args) {
        error!("{why}");
        std::process::exit(1);
    }
}

fn run(cli_args: &Arguments) -> Result<(), PrismError> {
    let mut scene = Scene::with_config(BuildConfig {
        depth_budget: cli_args.depth_budget,
    });
    let flags = cli_args.post_process();

    // Load every mesh, in order
    let progress_bar =
        get_progressbar(cli_args.models.len() as u64).with_prefix("Loading models");
    for path in &cli_args.models {
        progress_bar.set_message(path.display().to_string());
        match scene.load_model(path, flags) {
            Ok(_) => {}
            Err(why) if cli_args.skip_failed => warn!("{why}, skipping"),
            Err(why) => {
                progress_bar.abandon();
                return Err(why.into());
            }
        }
        progress_bar.inc(1);
    }
    progress_bar.finish_and_clear();

    // Place models
    let loaded = scene.models().len();
    for spec in &cli_args.transforms {
        scene
            .model_mut(spec.model)
            .ok_or(PrismError::UnknownModel {
                index: spec.model,
                loaded,
            })?
            .set_transform(spec.to_matrix());
    }

    info!("{}", scene.stats());

    // write buffers to disk
    let mut host = HostBuffers::new();
    scene.upload(&mut host);
    host.write_to_dir(&cli_args.output)
        .map_err(|source| PrismError::WriteBuffers {
            dir: cli_args.output.clone(),
            source,
        })?;
    info!("Scene buffers written to {:?}", &cli_args.output);

    Ok(())
}
