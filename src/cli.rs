// File: ./src/cli.rs
//! Command-line parsing and help for the `ffcal` binary.
use crate::config::Config;
use crate::context::StandardContext;
use crate::model::VipPolicy;
use crate::pipeline::Source;
use anyhow::{Result, anyhow};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub weeks: Option<usize>,
    pub vip_policy: Option<VipPolicy>,
    pub inputs: Vec<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Explain(String),
    InitConfig,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub options: Options,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

/// Parse arguments (without the binary name).
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut options = Options::default();
    let mut command = Command::Run;
    let mut free = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-h" | "--help" | "help" => command = Command::Help,
            "-v" | "--verbose" => options.verbose = true,
            "-c" | "--config" => {
                options.config = Some(PathBuf::from(value(args, i, arg)?));
                i += 1;
            }
            "-r" | "--root" => {
                options.root = Some(PathBuf::from(value(args, i, arg)?));
                i += 1;
            }
            "-o" | "--output" => {
                options.output = Some(PathBuf::from(value(args, i, arg)?));
                i += 1;
            }
            "-i" | "--input" => {
                options.inputs.push(PathBuf::from(value(args, i, arg)?));
                i += 1;
            }
            "-w" | "--weeks" => {
                let raw = value(args, i, arg)?;
                let weeks = raw
                    .parse::<usize>()
                    .map_err(|_| anyhow!("--weeks expects a number, got '{}'", raw))?;
                options.weeks = Some(weeks);
                i += 1;
            }
            "--vip-policy" => {
                let raw = value(args, i, arg)?;
                let policy = raw.parse::<VipPolicy>().map_err(|_| {
                    anyhow!(
                        "--vip-policy expects 'always' or 'medium-impact-only', got '{}'",
                        raw
                    )
                })?;
                options.vip_policy = Some(policy);
                i += 1;
            }
            _ if arg.starts_with('-') => return Err(anyhow!("Unknown option: {}", arg)),
            _ => free.push(arg.to_string()),
        }
        i += 1;
    }

    if command != Command::Help
        && let Some(first) = free.first()
    {
        command = match first.as_str() {
            "explain" => {
                if free.len() < 2 {
                    return Err(anyhow!("explain requires some text"));
                }
                Command::Explain(free[1..].join(" "))
            }
            "init" => Command::InitConfig,
            "run" => Command::Run,
            other => return Err(anyhow!("Unknown command: {}", other)),
        };
    }

    Ok(Invocation { command, options })
}

impl Options {
    pub fn context(&self) -> StandardContext {
        StandardContext::new(self.root.clone())
    }

    /// Config from `--config`, else from the context, with command-line overrides applied.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load(&self.context())?,
        };
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(weeks) = self.weeks {
            config.weeks = weeks;
        }
        if let Some(policy) = self.vip_policy {
            config.vip_policy = policy;
        }
        Ok(config)
    }

    pub fn source(&self, config: &Config) -> Source {
        if self.inputs.is_empty() {
            Source::Remote(config.window_urls())
        } else {
            Source::Files(self.inputs.clone())
        }
    }
}

pub fn print_help() {
    println!(
        "ffcal v{} - Economic calendar filter (red folder + VIP events)",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    ffcal [OPTIONS]                 Fetch, filter and write the calendar");
    println!("    ffcal explain <text>            Show which rules match a piece of text");
    println!("    ffcal init                      Write the default config file");
    println!("    ffcal --help                    Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <path>     Use this config file.");
    println!("    -r, --root <path>       Use a different directory for the config file.");
    println!("    -o, --output <path>     Where to write the filtered .ics file.");
    println!("    -w, --weeks <n>         Number of weekly windows to fetch (first is required).");
    println!("    -i, --input <file.ics>  Read a window from a file instead of fetching (repeatable).");
    println!("    --vip-policy <policy>   'always' or 'medium-impact-only'.");
    println!("    -v, --verbose           Debug logging.");
    println!("    -h, --help              Show this help message.");
    println!();
    println!("EXAMPLES:");
    println!("    ffcal -o public/calendar.ics");
    println!("    ffcal --input thisweek.ics --input nextweek.ics");
    println!("    ffcal explain \"FOMC Member Barkin Speaks Impact: Medium\"");
}
