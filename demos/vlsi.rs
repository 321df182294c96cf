use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use vlsi_rs::encoder::SymmetryConfig;
use vlsi_rs::solver::{solve, SolveConfig, Strategy, Technology};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Modeling technology: cp, sat or smt.
    #[arg(value_name = "TECH", default_value = "sat")]
    technology: Technology,

    /// First instance index.
    #[clap(short, long, value_name = "INT", default_value = "1")]
    start: u32,

    /// Last instance index (inclusive).
    #[clap(short, long, value_name = "INT", default_value = "40")]
    end: u32,

    /// Directory with `ins-<i>.txt` files.
    #[clap(long, value_name = "DIR", default_value = "instances")]
    instances: PathBuf,

    /// Directory for `out-<i>.txt` result files.
    #[clap(long, value_name = "DIR", default_value = "out")]
    out: PathBuf,

    /// Allow 90° rotation of circuits.
    #[clap(long)]
    rotation: bool,

    /// Add the dual row/column model.
    #[clap(long)]
    dual: bool,

    /// Minimize directly instead of the technology's default strategy.
    #[clap(long)]
    direct: bool,

    /// Disable symmetry breaking.
    #[clap(long)]
    no_symmetry: bool,

    /// Time limit per instance, in seconds.
    #[clap(long, value_name = "SECS", default_value = "300")]
    timeout: u64,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mut config = SolveConfig::default()
        .with_technology(args.technology)
        .with_rotation(args.rotation)
        .with_dual(args.dual)
        .with_timeout(Duration::from_secs(args.timeout));
    if args.direct {
        config = config.with_strategy(Strategy::Direct);
    }
    if args.no_symmetry {
        config = config.with_symmetry(SymmetryConfig::none());
    }

    config.validate()?;
    std::fs::create_dir_all(&args.out)?;
    let loader = config.loader();

    let mut solved = 0;
    for i in args.start..=args.end {
        let path = args.instances.join(format!("ins-{}.txt", i));
        let instance = match loader.load_path(&path) {
            Ok(instance) => instance,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let outcome = match solve(&instance, &config) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("ins-{}: {}", i, e);
                continue;
            }
        };
        println!("ins-{}: {}", i, outcome);
        match outcome.solution() {
            Some(solution) => {
                let out = args.out.join(format!("out-{}.txt", i));
                solution.write(&out)?;
                info!("wrote {}", out.display());
                if outcome.is_optimal() {
                    solved += 1;
                }
            }
            None => warn!("ins-{}: no packing found", i),
        }
    }

    let time_total = time_total.elapsed();
    println!(
        "Solved {} of {} instances optimally in {:.3} s",
        solved,
        args.end.saturating_sub(args.start) + 1,
        time_total.as_secs_f64()
    );

    Ok(())
}
