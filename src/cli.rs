use std::env;
use std::path::PathBuf;

/// Default port for `--serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Headless refresh loop, logging one metrics record per cycle.
    Watch { cycles: Option<usize> },
    /// Telemetry producer writing into the store.
    Simulate {
        samples: Option<usize>,
        seed: Option<u64>,
    },
    /// One-shot text report.
    Report { path: PathBuf },
    /// One-shot derived-row CSV.
    RowsOut { path: PathBuf },
    /// Appliance estimate from a TOML file.
    Estimate { path: PathBuf },
    /// Live terminal dashboard.
    Tui,
    /// Read-only HTTP API.
    Serve { port: u16 },
    Help,
}

#[derive(Debug)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub share: Option<u8>,
    pub mode: Mode,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        return Ok(CliOptions {
            config: None,
            store: None,
            share: None,
            mode: Mode::Help,
        });
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut store = None;
    let mut share = None;
    let mut mode: Option<(&str, Mode)> = None;
    let mut cycles = None;
    let mut samples = None;
    let mut seed = None;
    let mut port = None;

    let mut set_mode = |flag: &'static str, m: Mode| -> Result<(), String> {
        match mode.replace((flag, m)) {
            Some((prev, _)) if prev == flag => Err(format!("{flag} provided more than once")),
            Some((prev, _)) => Err(format!(
                "arguments `{prev}` and `{flag}` are mutually exclusive; choose one mode"
            )),
            None => Ok(()),
        }
    };

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--store" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --store (expected a CSV file path)")?;
                if store.replace(PathBuf::from(path)).is_some() {
                    return Err("--store provided more than once".to_string());
                }
            }
            "--share" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --share (expected 0-100)")?;
                let value = raw
                    .parse::<u8>()
                    .ok()
                    .filter(|v| *v <= 100)
                    .ok_or_else(|| format!("--share value \"{raw}\" is not an integer in 0-100"))?;
                share = Some(value);
            }
            "--watch" => set_mode("--watch", Mode::Watch { cycles: None })?,
            "--cycles" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --cycles (expected a count)")?;
                cycles = Some(parse_count("--cycles", raw)?);
            }
            "--simulate" => set_mode(
                "--simulate",
                Mode::Simulate {
                    samples: None,
                    seed: None,
                },
            )?,
            "--samples" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --samples (expected a count)")?;
                samples = Some(parse_count("--samples", raw)?);
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                seed = Some(
                    raw.parse::<u64>()
                        .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?,
                );
            }
            "--report" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --report (expected a file path)")?;
                set_mode("--report", Mode::Report { path: PathBuf::from(path) })?;
            }
            "--rows-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --rows-out (expected a file path)")?;
                set_mode("--rows-out", Mode::RowsOut { path: PathBuf::from(path) })?;
            }
            "--estimate" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --estimate (expected a TOML file path)")?;
                set_mode("--estimate", Mode::Estimate { path: PathBuf::from(path) })?;
            }
            "--tui" => set_mode("--tui", Mode::Tui)?,
            "--serve" => set_mode("--serve", Mode::Serve { port: DEFAULT_PORT })?,
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                port = Some(
                    raw.parse::<u16>()
                        .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?,
                );
            }
            "--help" | "-h" => set_mode("--help", Mode::Help)?,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    let mut mode = mode.map_or(Mode::Watch { cycles: None }, |(_, m)| m);
    match &mut mode {
        Mode::Watch { cycles: c } => *c = cycles.take(),
        Mode::Simulate {
            samples: n,
            seed: s,
        } => {
            *n = samples.take();
            *s = seed.take();
        }
        Mode::Serve { port: p } => {
            if let Some(value) = port.take() {
                *p = value;
            }
        }
        _ => {}
    }

    for (flag, unused) in [
        ("--cycles", cycles.is_some()),
        ("--samples", samples.is_some()),
        ("--seed", seed.is_some()),
        ("--port", port.is_some()),
    ] {
        if unused {
            return Err(format!("{flag} is not valid for the selected mode"));
        }
    }

    Ok(CliOptions {
        config,
        store,
        share,
        mode,
    })
}

fn parse_count(flag: &str, raw: &str) -> Result<usize, String> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("{flag} value \"{raw}\" must be a positive integer"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("green-audit - live energy and carbon audit for a single electrical load");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  green-audit [--config <path>] [--store <path>] [--share <0-100>] [MODE]");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  --watch [--cycles <n>]              Refresh metrics from the store (default)");
    eprintln!("  --simulate [--samples <n>] [--seed <u64>]");
    eprintln!("                                      Write random telemetry into the store");
    eprintln!("  --report <path>                     Write the text report and exit");
    eprintln!("  --rows-out <path>                   Write per-sample derived rows as CSV");
    eprintln!("  --estimate <path>                   Estimate daily usage from an appliance TOML");
    eprintln!("  --tui                               Live terminal dashboard (feature `tui`)");
    eprintln!("  --serve [--port <u16>]              Read-only HTTP API (feature `api`)");
    eprintln!("  --help                              Show this help message");
}
