#![deny(warnings)]

//! Headless CLI: evaluate a policy scenario and print the projection.

use anyhow::{anyhow, bail, Context, Result};
use policy_core::{
    validate_configuration, PolicyCategory, PolicyConfiguration, Sector, TARGET_EMISSIONS_MT,
    TARGET_YEAR,
};
use policy_engine::{evaluate_with_profile, FormulaProfile, ProjectionResult};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    scenario: Option<PathBuf>,
    profile: Option<String>,
    allocations: Vec<(PolicyCategory, Decimal)>,
    biofuels: bool,
    work_from_home: bool,
    congestion: Option<u32>,
    bev_grant: Option<u32>,
    sandbox: bool,
    json: bool,
    version: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| anyhow!("{flag} expects a value"));
        match arg.as_str() {
            "--scenario" => out.scenario = Some(PathBuf::from(value("--scenario")?)),
            "--profile" => out.profile = Some(value("--profile")?),
            "--heavy-rail" | "--bus" | "--ev" | "--aviation" => {
                let category = match arg.as_str() {
                    "--heavy-rail" => PolicyCategory::HeavyRail,
                    "--bus" => PolicyCategory::BusImprovements,
                    "--ev" => PolicyCategory::EvInfrastructure,
                    _ => PolicyCategory::DomesticAviation,
                };
                let raw = value(arg.as_str())?;
                let amount: Decimal = raw
                    .parse()
                    .with_context(|| format!("{arg}: not a number: {raw}"))?;
                out.allocations.push((category, amount));
            }
            "--biofuels" => out.biofuels = true,
            "--work-from-home" => out.work_from_home = true,
            "--congestion" => {
                out.congestion = Some(value("--congestion")?.parse().context("--congestion")?)
            }
            "--bev-grant" => {
                out.bev_grant = Some(value("--bev-grant")?.parse().context("--bev-grant")?)
            }
            "--sandbox" => out.sandbox = true,
            "--json" => out.json = true,
            "--version" => out.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(out)
}

fn load_profile(name_or_path: Option<&str>) -> Result<FormulaProfile> {
    let Some(name_or_path) = name_or_path else {
        return Ok(FormulaProfile::canonical());
    };
    if let Ok(profile) = FormulaProfile::by_name(name_or_path) {
        return Ok(profile);
    }
    let text = std::fs::read_to_string(name_or_path)
        .with_context(|| format!("profile {name_or_path} is neither a built-in name nor a readable file"))?;
    Ok(FormulaProfile::from_yaml_str(&text)?)
}

fn load_scenario(path: &Path) -> Result<PolicyConfiguration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
}

/// Scenario file first, then flag overrides on top.
fn build_config(args: &Args) -> Result<PolicyConfiguration> {
    let mut cfg = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => PolicyConfiguration::default(),
    };
    for &(category, amount) in &args.allocations {
        cfg.allocations.set(category, amount);
    }
    cfg.biofuels_enabled |= args.biofuels;
    cfg.work_from_home_enabled |= args.work_from_home;
    cfg.sandbox_mode |= args.sandbox;
    if let Some(c) = args.congestion {
        cfg.congestion_charge = c;
    }
    if let Some(g) = args.bev_grant {
        cfg.bev_grant_per_vehicle = g;
    }
    Ok(cfg)
}

fn render(cfg: &PolicyConfiguration, r: &ProjectionResult) -> String {
    let mut out = String::new();
    let budget = match cfg.budget_ceiling() {
        Some(b) => format!("€{b}m"),
        None => "∞".to_string(),
    };
    let status = if r.is_over_budget { "OVER" } else { "within" };
    out.push_str(&format!(
        "Budget | total cost: €{}m | budget: {} | {} budget | admin: €{}m | grants: €{}m\n",
        r.total_cost.round_dp(2),
        budget,
        status,
        r.admin_cost.round_dp(2),
        r.bev_grant_cost.round_dp(2),
    ));
    let ratio = r
        .actual_bev_to_charger_ratio
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "n/a".to_string());
    out.push_str(&format!(
        "Fleet | BEVs: {} | charging points: {} | ratio: {} (ideal {:.1}) | {}\n",
        r.number_of_bevs.floor(),
        r.charging_points,
        ratio,
        r.ideal_bev_to_charger_ratio,
        if r.is_ideal_ratio { "ideal" } else { "not ideal" },
    ));
    out.push_str(&format!(
        "Emissions {} | projected: {:.2} Mt | target: {:.2} Mt | {}\n",
        TARGET_YEAR,
        r.projected_emissions,
        TARGET_EMISSIONS_MT,
        if r.meets_target() { "under target" } else { "over target" },
    ));
    for sector in Sector::ALL {
        let e = r.sector_emissions.get(&sector).copied().unwrap_or(0.0);
        let d = r.sector_reductions.get(&sector).copied().unwrap_or(0.0);
        out.push_str(&format!(
            "  {:<22} {:>6.2} Mt  (-{:.2})\n",
            sector.label(),
            e,
            d
        ));
    }
    out
}

/// `RUST_LOG`-style directives, falling back to `info` when absent or malformed.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(LevelFilter::INFO.to_string()))
}

fn main() -> Result<()> {
    // Logging setup
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "policy-cli {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(scenario = ?args.scenario, profile = ?args.profile, "starting CLI");

    let profile = load_profile(args.profile.as_deref())?;
    let cfg = build_config(&args)?;
    if let Err(e) = validate_configuration(&cfg) {
        warn!(error = %e, "input outside declared ranges; values will be clamped");
    }
    let result = evaluate_with_profile(&cfg, &profile);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render(&cfg, &result));
    }
    Ok(())
}
