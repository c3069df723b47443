use anyhow::Result;
use ffcal::cli::{self, Command};
use ffcal::config::Config;
use ffcal::context::AppContext;
use ffcal::pipeline::Pipeline;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::env;

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match cli::parse_args(&args) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            cli::print_help();
            std::process::exit(2);
        }
    };
    let options = invocation.options;
    init_logging(options.verbose);

    match invocation.command {
        Command::Help => {
            cli::print_help();
            Ok(())
        }
        Command::Explain(text) => {
            let config = options.load_config()?;
            let classifier = config.classifier()?;
            println!("policy:        {}", classifier.policy());
            println!("{}", classifier.explain(&text));
            Ok(())
        }
        Command::InitConfig => {
            let ctx = options.context();
            let path = ctx.get_config_file_path()?;
            if path.exists() {
                println!("Config already exists: {}", path.display());
            } else {
                let written = Config::default().save(&ctx)?;
                println!("Wrote default config to {}", written.display());
            }
            Ok(())
        }
        Command::Run => {
            let config = options.load_config()?;
            let source = options.source(&config);
            let pipeline = Pipeline::new(config)?;
            let summary = pipeline.run(&source).await.inspect_err(|e| {
                log::error!("Run failed: {}", e);
            })?;

            println!("Generated file: {}", summary.output_path.display());
            println!("Calendar: {}", pipeline.config().calendar.name);
            println!(
                "Windows: {} acquired, {} parsed",
                summary.windows_acquired, summary.windows_parsed
            );
            println!(
                "Events: {} included of {} ({} red folder, {} VIP keyword)",
                summary.counters.included,
                summary.counters.total_seen,
                summary.counters.red_folder,
                summary.counters.vip_keyword
            );
            println!("VIP policy: {}", pipeline.config().vip_policy);
            Ok(())
        }
    }
}

