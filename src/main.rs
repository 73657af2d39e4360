use anyhow::{bail, Context};
use clap::Parser;
use island_dashboard::{
    aggregate,
    cache::LoadCache,
    clean,
    convert,
    filter,
    graph::Graphing,
    load,
    metrics::{self, RenewableSet},
    record::{Dataset, DatasetKind, Record},
    scenario,
};
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser, Debug)]
#[clap(about = "Island energy, water and CO2 dashboards")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Args,
}

#[derive(clap::Parser, Debug)]
enum Args {
    /// Headline metrics across all four bundled datasets, limited to a
    /// year range taken from the consumption data by default.
    // cargo run -- overview --data-dir data --chart-png results/overview.png
    Overview {
        /// Directory holding energy_consumption.csv, renewable_generation.csv,
        /// water_usage.csv and co2_emissions.csv
        #[clap(short, long, default_value = "data")]
        data_dir: PathBuf,

        #[clap(long)]
        min_year: Option<i32>,

        #[clap(long)]
        max_year: Option<i32>,

        /// Generation categories counted as renewable. Defaults to the
        /// `renewable` tag plus common source names.
        #[clap(long, num_args = 1.., value_delimiter = ',')]
        renewable: Vec<String>,

        /// Monthly consumption vs generation line chart
        #[clap(long)]
        chart_png: Option<PathBuf>,

        /// The same monthly series as a csv
        #[clap(long)]
        monthly_csv: Option<PathBuf>,
    },

    /// Per-category view of one dataset: totals, the latest snapshot and
    /// trend charts. Mirrors the energy, water and environment pages.
    // cargo run -- sectors water --categories Residential,Commercial --snapshot-png results/water_pie.png
    Sectors {
        kind: DatasetKind,

        /// Read this file instead of the bundled one in --data-dir
        #[clap(long)]
        csv: Option<PathBuf>,

        /// Also supplies the consumption data the year range defaults to
        #[clap(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Categories to keep. All of them when omitted.
        #[clap(long, num_args = 1.., value_delimiter = ',')]
        categories: Vec<String>,

        #[clap(long)]
        min_year: Option<i32>,

        #[clap(long)]
        max_year: Option<i32>,

        /// Monthly line per category
        #[clap(long)]
        trend_png: Option<PathBuf>,

        /// Pie of the values on the latest date
        #[clap(long)]
        snapshot_png: Option<PathBuf>,

        /// Bar chart of totals per category
        #[clap(long)]
        totals_png: Option<PathBuf>,

        #[clap(long)]
        totals_csv: Option<PathBuf>,
    },

    /// Sums a daily dataset into months and writes the series out.
    // cargo run -- monthly consumption data/energy_consumption.csv results/consumption_monthly.csv
    Monthly {
        kind: DatasetKind,

        csv_in: PathBuf,

        csv_out: PathBuf,

        #[clap(long)]
        chart_png: Option<PathBuf>,
    },

    /// Uploaded consumption and generation files with an illustrative
    /// renewable growth scenario.
    /*
    cargo run -- scenario \
        --consumption-csv uploads/consumption.csv \
        --generation-csv uploads/generation.csv \
        --increase-pct 20 \
        --baseline-png results/mix.png \
        --scenario-png results/mix_scenario.png
    */
    Scenario {
        #[clap(long)]
        consumption_csv: PathBuf,

        #[clap(long)]
        generation_csv: PathBuf,

        /// Percentage increase applied to renewable generation
        #[clap(long, default_value_t = 20., allow_hyphen_values = true)]
        increase_pct: f64,

        #[clap(long)]
        min_year: Option<i32>,

        #[clap(long)]
        max_year: Option<i32>,

        #[clap(long, num_args = 1.., value_delimiter = ',')]
        renewable: Vec<String>,

        /// Stacked yearly generation mix as loaded
        #[clap(long)]
        baseline_png: Option<PathBuf>,

        /// Stacked yearly generation mix after the scenario
        #[clap(long)]
        scenario_png: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn renewable_set(names: &[String]) -> RenewableSet {
    if names.is_empty() {
        RenewableSet::default()
    } else {
        RenewableSet::new(names)
    }
}

fn load_clean(cache: &mut LoadCache, path: &Path, kind: DatasetKind) -> anyhow::Result<Dataset> {
    let loaded = cache
        .get_or_load_path(path, kind)
        .with_context(|| format!("Unable to load {kind} data"))?;
    Ok(clean::clean(&loaded.dataset))
}

/// Resolves the year range against the consumption data, which bounds every
/// other dataset.
fn year_range(
    consumption: &Dataset,
    min_year: Option<i32>,
    max_year: Option<i32>,
) -> anyhow::Result<(i32, i32)> {
    let Some(range) = filter::shared_year_range(&consumption.records, min_year, max_year) else {
        bail!("No usable rows in {} data", consumption.kind);
    };
    Ok(range)
}

fn by_year(dataset: &Dataset, (lo, hi): (i32, i32)) -> Dataset {
    dataset.with_records(filter::filter_by_year(&dataset.records, lo, hi))
}

fn overview(
    data_dir: &Path,
    min_year: Option<i32>,
    max_year: Option<i32>,
    renewable: &RenewableSet,
    chart_png: Option<&Path>,
    monthly_csv: Option<&Path>,
) -> anyhow::Result<()> {
    let mut cache = LoadCache::new();
    let mut bundled =
        |kind: DatasetKind| load_clean(&mut cache, &load::data_file(data_dir, kind), kind);
    let consumption = bundled(DatasetKind::Consumption)?;
    let generation = bundled(DatasetKind::Generation)?;
    let water = bundled(DatasetKind::Water)?;
    let co2 = bundled(DatasetKind::Co2)?;

    let range = year_range(&consumption, min_year, max_year)?;
    let consumption = by_year(&consumption, range);
    let generation = by_year(&generation, range);
    let water = by_year(&water, range);
    let co2 = by_year(&co2, range);

    println!("Island overview {}-{}", range.0, range.1);
    println!(
        "  Total energy:      {:.0}",
        metrics::total_consumption(&consumption.records)
    );
    println!(
        "  Total generation:  {:.0}",
        metrics::total_generation(&generation.records)
    );
    println!(
        "  Renewable share:   {:.1}%",
        metrics::renewable_share(&generation.records, renewable)
    );
    println!(
        "  Generation/energy: {}%",
        metrics::renewable_coverage(&consumption.records, &generation.records)
    );
    println!("  Total water:       {:.0}", metrics::total_water(&water.records));
    println!("  Total CO2:         {:.2}", metrics::total_co2(&co2.records));

    if chart_png.is_none() && monthly_csv.is_none() {
        return Ok(());
    }
    if !consumption.has_dates() || !generation.has_dates() {
        warn!("Monthly comparison needs daily consumption and generation data");
        return Ok(());
    }
    let joined = aggregate::join_monthly(
        &aggregate::aggregate_monthly(&consumption.records)?,
        &aggregate::aggregate_monthly(&generation.records)?,
    );
    if let Some(path) = monthly_csv {
        convert::write_joined_monthly(path, &joined)?;
        info!("Wrote monthly csv: {}", path.display());
    }
    if let Some(path) = chart_png {
        let months: Vec<_> = joined.iter().map(|(d, _, _)| *d).collect();
        let series: [(&str, Vec<f64>); 2] = [
            ("Consumption", joined.iter().map(|(_, c, _)| *c).collect()),
            ("Generation", joined.iter().map(|(_, _, g)| *g).collect()),
        ];
        Graphing::new(path).monthly_lines(
            &months,
            &series,
            "Monthly Energy vs Renewable Generation",
            "Energy",
        )?;
        info!("Wrote chart: {}", path.display());
    }
    Ok(())
}

/// Monthly values per category aligned on the months of the whole selection.
fn monthly_by_category(
    records: &[Record],
) -> anyhow::Result<(Vec<chrono::NaiveDate>, Vec<(String, Vec<f64>)>)> {
    let months: Vec<_> = aggregate::aggregate_monthly(records)?
        .into_iter()
        .filter_map(|r| r.date)
        .collect();
    let mut series = Vec::new();
    for (category, _) in aggregate::totals_by_category(records) {
        let own = aggregate::aggregate_monthly(&filter::filter_categories(
            records,
            std::slice::from_ref(&category),
        ))?;
        let values: Vec<f64> = months
            .iter()
            .map(|m| {
                own.iter()
                    .find(|r| r.date == Some(*m))
                    .map_or(0., |r| r.value)
            })
            .collect();
        series.push((category, values));
    }
    Ok((months, series))
}

#[allow(clippy::too_many_arguments)]
fn sectors(
    kind: DatasetKind,
    path: &Path,
    data_dir: &Path,
    categories: Vec<String>,
    min_year: Option<i32>,
    max_year: Option<i32>,
    trend_png: Option<&Path>,
    snapshot_png: Option<&Path>,
    totals_png: Option<&Path>,
    totals_csv: Option<&Path>,
) -> anyhow::Result<()> {
    let mut cache = LoadCache::new();
    let dataset = load_clean(&mut cache, path, kind)?;
    let consumption = match kind {
        DatasetKind::Consumption => dataset.clone(),
        _ => {
            let kind = DatasetKind::Consumption;
            load_clean(&mut cache, &load::data_file(data_dir, kind), kind)?
        }
    };
    let dataset = by_year(&dataset, year_range(&consumption, min_year, max_year)?);

    info!("{} categories: {}", kind, dataset.categories().join(", "));
    let records = if categories.is_empty() {
        dataset.records.clone()
    } else {
        filter::filter_categories(&dataset.records, &categories)
    };
    let totals = aggregate::totals_by_category(&records);

    println!(
        "{} by {}",
        kind.value_label(),
        kind.category_label().to_lowercase()
    );
    for (category, value) in &totals {
        println!("  {category:<20} {value:>15.2}");
    }
    println!("  {:<20} {:>15.2}", "Total", metrics::total(&records));

    let snapshot = aggregate::latest(&records);
    if let Some(snap) = &snapshot {
        println!("Latest ({})", snap.date);
        for (category, value) in snap.pairs() {
            println!("  {category:<20} {value:>15.2}");
        }
    }

    if let Some(path) = totals_csv {
        convert::write_category_totals(path, kind, &totals)?;
        info!("Wrote totals csv: {}", path.display());
    }
    if let Some(path) = totals_png {
        Graphing::new(path).category_bars(
            &totals,
            &format!("Total {kind} by {}", kind.category_label()),
            kind.value_label(),
        )?;
        info!("Wrote chart: {}", path.display());
    }
    if let Some(path) = snapshot_png {
        match &snapshot {
            Some(snap) => {
                Graphing::new(path).snapshot_pie(
                    &snap.pairs(),
                    &format!(
                        "{} by {} on {}",
                        kind.value_label(),
                        kind.category_label(),
                        snap.date
                    ),
                )?;
                info!("Wrote chart: {}", path.display());
            }
            None => warn!("No dated rows for a snapshot; skipping {}", path.display()),
        }
    }
    if let Some(path) = trend_png {
        let (months, series) = monthly_by_category(&records)?;
        let series: Vec<(&str, Vec<f64>)> = series
            .iter()
            .map(|(cat, values)| (cat.as_str(), values.clone()))
            .collect();
        Graphing::new(path).monthly_lines(
            &months,
            &series,
            &format!("{} Over Time", kind.value_label()),
            kind.value_label(),
        )?;
        info!("Wrote chart: {}", path.display());
    }
    Ok(())
}

fn monthly(
    kind: DatasetKind,
    csv_in: &Path,
    csv_out: &Path,
    chart_png: Option<&Path>,
) -> anyhow::Result<()> {
    let mut cache = LoadCache::new();
    let dataset = load_clean(&mut cache, csv_in, kind)?;
    let months = aggregate::aggregate_monthly(&dataset.records)?;
    convert::write_monthly(csv_out, kind, &months)?;
    info!("Wrote {} months to {}", months.len(), csv_out.display());

    if let Some(path) = chart_png {
        let dates: Vec<_> = months.iter().filter_map(|r| r.date).collect();
        let values: Vec<f64> = months.iter().map(|r| r.value).collect();
        Graphing::new(path).monthly_lines(
            &dates,
            &[(kind.value_label(), values)],
            &format!("Monthly {kind}"),
            kind.value_label(),
        )?;
        info!("Wrote chart: {}", path.display());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_scenario(
    consumption_csv: &Path,
    generation_csv: &Path,
    increase_pct: f64,
    min_year: Option<i32>,
    max_year: Option<i32>,
    renewable: &RenewableSet,
    baseline_png: Option<&Path>,
    scenario_png: Option<&Path>,
) -> anyhow::Result<()> {
    let mut cache = LoadCache::new();
    let consumption = load_clean(&mut cache, consumption_csv, DatasetKind::Consumption)?;
    let generation = load_clean(&mut cache, generation_csv, DatasetKind::Generation)?;

    let range = year_range(&consumption, min_year, max_year)?;
    let consumption = by_year(&consumption, range);
    let generation = by_year(&generation, range);
    let projected = scenario::apply_scenario(&generation.records, increase_pct, renewable);

    println!("Energy overview {}-{}", range.0, range.1);
    println!(
        "  Total consumption (MWh): {:.0}",
        metrics::total_consumption(&consumption.records)
    );
    println!(
        "  Renewable share (%):     {:.1}",
        metrics::renewable_share(&generation.records, renewable)
    );
    println!("Scenario: renewable generation {increase_pct:+}%");
    println!(
        "  Total generation (MWh):  {:.0}",
        metrics::total_generation(&projected)
    );
    println!(
        "  Renewable share (%):     {:.1}",
        metrics::renewable_share(&projected, renewable)
    );

    if let Some(path) = baseline_png {
        Graphing::new(path).stacked_mix(
            &aggregate::yearly_by_category(&generation.records),
            "Renewable vs Non-Renewable Energy Generation",
            "Generation (MWh)",
        )?;
        info!("Wrote chart: {}", path.display());
    }
    if let Some(path) = scenario_png {
        Graphing::new(path).stacked_mix(
            &aggregate::yearly_by_category(&projected),
            "Simulated Energy Mix (Illustrative Scenario)",
            "Generation (MWh)",
        )?;
        info!("Wrote chart: {}", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Args::Overview {
            data_dir,
            min_year,
            max_year,
            renewable,
            chart_png,
            monthly_csv,
        } => {
            overview(
                &data_dir,
                min_year,
                max_year,
                &renewable_set(&renewable),
                chart_png.as_deref(),
                monthly_csv.as_deref(),
            )?;
        }
        Args::Sectors {
            kind,
            csv,
            data_dir,
            categories,
            min_year,
            max_year,
            trend_png,
            snapshot_png,
            totals_png,
            totals_csv,
        } => {
            let path = csv.unwrap_or_else(|| load::data_file(&data_dir, kind));
            sectors(
                kind,
                &path,
                &data_dir,
                categories,
                min_year,
                max_year,
                trend_png.as_deref(),
                snapshot_png.as_deref(),
                totals_png.as_deref(),
                totals_csv.as_deref(),
            )?;
        }
        Args::Monthly {
            kind,
            csv_in,
            csv_out,
            chart_png,
        } => {
            monthly(kind, &csv_in, &csv_out, chart_png.as_deref())?;
        }
        Args::Scenario {
            consumption_csv,
            generation_csv,
            increase_pct,
            min_year,
            max_year,
            renewable,
            baseline_png,
            scenario_png,
        } => {
            run_scenario(
                &consumption_csv,
                &generation_csv,
                increase_pct,
                min_year,
                max_year,
                &renewable_set(&renewable),
                baseline_png.as_deref(),
                scenario_png.as_deref(),
            )?;
        }
    }
    Ok(())
}
