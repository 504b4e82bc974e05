//! Command-line front end for the scheduler.
//!
//! `neosched schedule` runs one triage-and-submit pass over a candidate
//! file; without `--execute` it is a dry run and nothing leaves the
//! machine. `neosched longterm` prints the multi-week visibility table
//! for every candidate at one site.
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hifitime::Epoch;
use itertools::izip;
use tracing_subscriber::EnvFilter;

use neosched::batch::{run_batch, HemisphereSites};
use neosched::candidates::{load_candidates, FilterPolicy};
use neosched::longterm::{compute_schedule, LongTermParams};
use neosched::network::PortalClient;
use neosched::sites::{get_site, site_codes};
use neosched::store::MemoryBlockStore;

#[derive(Parser)]
#[command(name = "neosched", version, about = "NEO follow-up scheduling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Triage a candidate file and submit request groups for tonight.
    Schedule {
        /// Candidate file (JSON array of objects with orbital elements).
        #[arg(long)]
        targets: PathBuf,
        /// 1m site for the northern queue, e.g. V37.
        #[arg(long, default_value = "V37")]
        site_north: String,
        /// 1m site for the southern queue, e.g. W85.
        #[arg(long, default_value = "W85")]
        site_south: String,
        /// 0.4m site for bright northern targets; omitted, they go to
        /// the 1m site.
        #[arg(long)]
        site_north_0m4: Option<String>,
        /// 0.4m site for bright southern targets; omitted, they go to
        /// the 1m site.
        #[arg(long)]
        site_south_0m4: Option<String>,
        /// Night to schedule, UTC date (YYYY-MM-DD). Defaults to now.
        #[arg(long)]
        date: Option<String>,
        /// Proposal the requests are charged to.
        #[arg(long)]
        proposal: String,
        /// Observation portal endpoint.
        #[arg(long, default_value = "https://observe.lco.global")]
        portal_url: String,
        /// Actually submit. Without this flag the pass is a dry run.
        #[arg(long)]
        execute: bool,
    },
    /// Print the long-term visibility table for each candidate.
    Longterm {
        /// Candidate file (JSON array of objects with orbital elements).
        #[arg(long)]
        targets: PathBuf,
        /// Site to scan, e.g. F65.
        #[arg(long, default_value = "F65")]
        site: String,
        /// First night of the scan, UTC date (YYYY-MM-DD). Defaults to now.
        #[arg(long)]
        date: Option<String>,
        /// Number of nights to look ahead.
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// List the known site codes.
    Sites,
}

fn parse_date(date: Option<&str>) -> Result<Epoch> {
    match date {
        Some(d) => Epoch::from_str(&format!("{d}T00:00:00"))
            .with_context(|| format!("cannot parse date {d:?}, expected YYYY-MM-DD")),
        None => Ok(Epoch::now().context("system clock unavailable")?),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Schedule {
            targets,
            site_north,
            site_south,
            site_north_0m4,
            site_south_0m4,
            date,
            proposal,
            portal_url,
            execute,
        } => {
            let candidates = load_candidates(&targets)?;
            let north = HemisphereSites {
                one_meter: get_site(&site_north)?,
                point4: site_north_0m4.as_deref().map(get_site).transpose()?,
            };
            let south = HemisphereSites {
                one_meter: get_site(&site_south)?,
                point4: site_south_0m4.as_deref().map(get_site).transpose()?,
            };
            let as_of = Epoch::now().context("system clock unavailable")?;
            let night = parse_date(date.as_deref())?;

            let token = if execute {
                std::env::var("NEOSCHED_TOKEN")
                    .context("NEOSCHED_TOKEN must be set to submit with --execute")?
            } else {
                String::new()
            };
            let network = PortalClient::new(&portal_url, &token);
            let store = MemoryBlockStore::new();

            let report = run_batch(
                &candidates,
                north,
                south,
                &proposal,
                night,
                as_of,
                &FilterPolicy::default(),
                &store,
                &network,
                execute,
            );
            println!("{report}");
            if !execute {
                println!("(dry run; pass --execute to submit)");
            }
        }
        Command::Longterm {
            targets,
            site,
            date,
            days,
        } => {
            let candidates = load_candidates(&targets)?;
            let site = get_site(&site)?;
            let start = parse_date(date.as_deref())?;
            let params = LongTermParams::default();

            for candidate in &candidates {
                let schedule =
                    compute_schedule(site, &candidate.elements, start, days, &params);
                if schedule.is_empty() {
                    println!("{}: not observable at {} in the next {days} nights",
                        candidate.object_id, site.code);
                    continue;
                }
                println!("{} at {}:", candidate.object_id, site.code);
                for (d, point, hours, max_alt) in izip!(
                    &schedule.visible_dates,
                    &schedule.first_points,
                    &schedule.dark_and_up_hours,
                    &schedule.max_altitudes
                ) {
                    let mag = point
                        .magnitude
                        .map(|m| format!("{m:5.1}"))
                        .unwrap_or_else(|| "  n/a".to_string());
                    println!(
                        "  {d}  V={mag}  {hours:4.1} h dark-and-up  peak alt {max_alt:4.1} deg"
                    );
                }
            }
        }
        Command::Sites => {
            for code in site_codes() {
                println!("{code}");
            }
        }
    }
    Ok(())
}
