use std::process::ExitCode;

use color::{convert::color_to_space, Output};
use settings::SETTINGS;

pub fn main() -> ExitCode {
    // Register a custom panic handler
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        eprintln!(
            "colorcalc has panicked. This is a bug. Please open an issue at {}, including the debug information below. Thanks!\n",
            env!("CARGO_PKG_REPOSITORY")
        );
        previous_hook(info);
    }));

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let value = SETTINGS.value.as_str();
    let options = &SETTINGS.options;

    let output = match SETTINGS.convert_to {
        Some(space) => Output::Color(color_to_space(value, options, space)),
        None => color::resolve(value, options),
    };

    match output {
        Output::Null => {
            log::error!("{value:?} cannot be represented in the requested format");
            ExitCode::FAILURE
        },
        Output::Text(text) if text.is_empty() => {
            log::error!("{value:?} is not a valid color");
            ExitCode::FAILURE
        },
        output => {
            println!("{output}");
            ExitCode::SUCCESS
        },
    }
}
