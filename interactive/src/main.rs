use clap::Parser;

use canvas2d::logging::{init_logging, LoggingConfig};
use canvas2d::Config;

mod app;
mod args;
mod headless;
mod observer;

use app::{App, AppError};
use args::Args;

fn main() {
    // clion needs help in trait annotation
    let args = <Args as Parser>::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    if let Err(e) = run(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut config = match &args.config {
        Some(path) => {
            let config = Config::load_from_path(path)?;
            log::info!("read config from {:?}", path);
            config
        }
        None => Config::default(),
    };
    args.apply(&mut config);

    let mode = args.mode.draw_mode(&config);

    if args.headless {
        headless::run(config, mode)?;
        return Ok(());
    }

    let app = App::new(config, mode, !args.no_device_pixels)?;

    app.run();
}
