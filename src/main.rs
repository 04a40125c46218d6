//! Green audit entry point: CLI wiring and mode dispatch.

use std::path::Path;
use std::process;

use tracing::info;

use green_audit::audit::kpi::MetricsRecord;
use green_audit::audit::refresh::{Cycle, RefreshLoop, ShareControl, StopHandle, WAITING_MESSAGE};
use green_audit::cli::{self, CliOptions, Mode};
use green_audit::config::AuditConfig;
use green_audit::error::{AppError, Result};
use green_audit::estimator::{Estimate, EstimateInput};
use green_audit::io::export::export_csv;
use green_audit::io::report::export_report;
use green_audit::logging;
use green_audit::simulator::Simulator;
use green_audit::store::SampleStore;

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };

    if opts.mode == Mode::Help {
        cli::print_usage();
        return;
    }

    logging::init(opts.mode == Mode::Tui);

    if let Err(e) = run(opts) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Loads the TOML config (or defaults), applies CLI overrides, and validates.
fn load_config(opts: &CliOptions) -> Result<AuditConfig> {
    let mut cfg = match &opts.config {
        Some(path) => AuditConfig::from_toml_file(path).map_err(|e| AppError::Config(e.to_string()))?,
        None => AuditConfig::default(),
    };

    if let Some(path) = &opts.store {
        cfg.dashboard.store_path = path.clone();
    }
    if let Some(share) = opts.share {
        cfg.dashboard.renewable_share = share;
    }
    if let Mode::Simulate { seed: Some(seed), .. } = opts.mode {
        cfg.simulator.seed = Some(seed);
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        return Err(AppError::Config(joined));
    }
    Ok(cfg)
}

fn run(opts: CliOptions) -> Result<()> {
    let cfg = load_config(&opts)?;
    let store = SampleStore::new(&cfg.dashboard.store_path);

    match opts.mode {
        Mode::Watch { cycles } => watch(&cfg, store, cycles),
        Mode::Simulate { samples, .. } => {
            let mut sim = Simulator::new(&cfg.simulator);
            let written = sim.run(&store, cfg.simulator_interval(), samples, &StopHandle::new())?;
            info!(samples = written, "simulation finished");
            Ok(())
        }
        Mode::Report { path } => {
            let metrics = current_metrics(&cfg, &store)?;
            export_report(&metrics, &cfg.report, &path).map_err(|e| AppError::output(&path, e))?;
            eprintln!("Report written to {}", path.display());
            Ok(())
        }
        Mode::RowsOut { path } => {
            let samples = store.read_all()?;
            let rows = green_audit::audit::types::derive_rows(
                &samples,
                f64::from(cfg.dashboard.renewable_share),
                &cfg.tariff(),
            );
            export_csv(&rows, &path).map_err(|e| AppError::output(&path, e))?;
            eprintln!("{} rows written to {}", rows.len(), path.display());
            Ok(())
        }
        Mode::Estimate { path } => estimate(&cfg, &path),
        Mode::Tui => tui(&cfg),
        Mode::Serve { port } => serve(&cfg, store, port),
        Mode::Help => Ok(()),
    }
}

fn current_metrics(cfg: &AuditConfig, store: &SampleStore) -> Result<MetricsRecord> {
    let samples = store.read_all()?;
    Ok(MetricsRecord::derive(
        &samples,
        f64::from(cfg.dashboard.renewable_share),
        &cfg.tariff(),
    ))
}

fn watch(cfg: &AuditConfig, store: SampleStore, cycles: Option<usize>) -> Result<()> {
    let share = ShareControl::new(cfg.dashboard.renewable_share);
    let stop = StopHandle::new();
    let mut refresh = RefreshLoop::new(store, cfg.tariff(), cfg.refresh_interval())
        .with_strategy(cfg.strategy());

    refresh.run(&share, &stop, cycles, |cycle| match cycle {
        Cycle::Ready(snapshot) => println!("{}\n", snapshot.metrics),
        Cycle::Waiting | Cycle::Degraded(_) => println!("{WAITING_MESSAGE}"),
    });
    Ok(())
}

fn estimate(cfg: &AuditConfig, path: &Path) -> Result<()> {
    let input = EstimateInput::from_toml_file(path)?;
    let estimate = Estimate::evaluate(&input, &cfg.tariff())?;
    println!("{estimate}");
    Ok(())
}

#[cfg(feature = "tui")]
fn tui(cfg: &AuditConfig) -> Result<()> {
    green_audit::tui::run(cfg)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn tui(_cfg: &AuditConfig) -> Result<()> {
    Err(AppError::Usage(
        "--tui requires building with `--features tui`".to_string(),
    ))
}

#[cfg(feature = "api")]
fn serve(cfg: &AuditConfig, store: SampleStore, port: u16) -> Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    let state = Arc::new(green_audit::api::AppState {
        store,
        tariff: cfg.tariff(),
        share: ShareControl::new(cfg.dashboard.renewable_share),
        report: cfg.report.clone(),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(green_audit::api::serve(state, addr))?;
    Ok(())
}

#[cfg(not(feature = "api"))]
fn serve(_cfg: &AuditConfig, _store: SampleStore, _port: u16) -> Result<()> {
    Err(AppError::Usage(
        "--serve requires building with `--features api`".to_string(),
    ))
}
