use mimalloc::MiMalloc;
use pdf_to_images::cli::{self, Parsed};
use pdf_to_images::ConversionResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // stdout is reserved for the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn emit(result: &ConversionResult) -> ExitCode {
    println!("{}", result.to_json());
    ExitCode::from(u8::try_from(result.exit_code()).unwrap_or(1))
}

fn main() -> ExitCode {
    human_panic::setup_panic!();

    let options = match cli::parse_from(std::env::args_os()) {
        Ok(Parsed::Run(options)) => options,
        Ok(Parsed::Info(info)) => info.exit(),
        Err(e) => {
            init_logging("warn");
            return emit(&e.into());
        }
    };

    init_logging(options.log_directive());
    tracing::debug!(?options, "starting");

    emit(&pdf_to_images::run(&options.request(), &options.settings()))
}
