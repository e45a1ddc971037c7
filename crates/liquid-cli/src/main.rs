use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use liquid_engine::{Backend, LiquidEngine};
use liquid_ops_demo::{IntensityScaleArgs, IntensityScaleOp};

#[derive(Parser, Debug)]
#[command(
    name = "liquid-cli",
    about = "Drive the Liquid Engine adaptive backend dispatcher"
)]
struct Cli {
    /// Disable the GPU backend even if the host can run it.
    #[arg(long, default_value_t = false)]
    no_gpu: bool,

    /// Disable the JIT backend even if the host can run it.
    #[arg(long, default_value_t = false)]
    no_jit: bool,

    /// Always exploit the highest-throughput backend instead of exploring.
    #[arg(long, default_value_t = false)]
    no_explore: bool,

    /// Print per-run diagnostic lines.
    #[arg(long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the demonstration operation once.
    Run {
        /// Flattened 3-D shape, e.g. "3,64,32".
        #[arg(long, default_value = "3,64,32")]
        shape: String,
        /// Scalar factor every backend multiplies the input by.
        #[arg(long, default_value_t = 4.0)]
        scale: f32,
        /// Force a specific backend's designation instead of letting the
        /// Selector choose (e.g. "Unthreaded", "Threaded", "OpenCL").
        #[arg(long)]
        backend: Option<String>,
    },
    /// Run every enabled backend once and print a sorted comparison.
    Benchmark {
        #[arg(long, default_value = "3,64,32")]
        shape: String,
        #[arg(long, default_value_t = 4.0)]
        scale: f32,
    },
    /// Print the full persisted run-time statistics log.
    Log,
}

fn parse_shape(text: &str) -> Result<(usize, usize, usize)> {
    let dims: Vec<usize> = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| anyhow!("invalid shape dimension '{part}'"))
        })
        .collect::<Result<_>>()?;
    match dims.as_slice() {
        [a, b, c] => Ok((*a, *b, *c)),
        _ => Err(anyhow!("shape must have exactly 3 dimensions, got '{text}'")),
    }
}

fn parse_backend(text: &str) -> Result<Backend> {
    Backend::from_designation(text).ok_or_else(|| {
        let known: Vec<&str> = Backend::ALL.iter().map(|b| b.designation()).collect();
        anyhow!("unknown backend '{text}', expected one of {known:?}")
    })
}

fn build_engine(cli: &Cli) -> LiquidEngine<IntensityScaleOp> {
    let mut engine = LiquidEngine::new(IntensityScaleOp::new());
    if cli.no_gpu {
        engine.set_gpu_enabled(false);
    }
    if cli.no_jit {
        engine.set_jit_enabled(false);
    }
    engine.set_random_testing(!cli.no_explore);
    engine.set_show_info(cli.verbose);
    engine
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut engine = build_engine(&cli);

    match &cli.command {
        Command::Run {
            shape,
            scale,
            backend,
        } => {
            let shape = parse_shape(shape)?;
            let args = IntensityScaleArgs::filled(shape, *scale, 1.0);
            let explicit = backend.as_deref().map(parse_backend).transpose()?;
            let output = engine.run(&args, explicit)?;
            let shown = &output[..output.len().min(4)];
            println!(
                "backend: {}  elapsed: {:.6}s  output[0..{}]: {:?}",
                engine
                    .last_run_type()
                    .map(|b| b.designation())
                    .unwrap_or("?"),
                engine.last_run_time().unwrap_or(0.0),
                shown.len(),
                shown
            );
        }
        Command::Benchmark { shape, scale } => {
            let shape = parse_shape(shape)?;
            let args = IntensityScaleArgs::filled(shape, *scale, 1.0);
            let results = engine.benchmark(&args)?;
            println!("{:<18} elapsed", "backend");
            for (elapsed, designation, _) in &results {
                println!("{designation:<18} {elapsed:.6}s");
            }
        }
        Command::Log => {
            let log = engine.get_run_times_log();
            for backend in Backend::ALL {
                let bucket = log.bucket(backend);
                if bucket.is_empty() {
                    continue;
                }
                println!("{}:", backend.designation());
                for (fingerprint, agg) in bucket {
                    println!(
                        "  {fingerprint}  mean={:.6}s stdev={:.6}s n={}",
                        agg.mean(),
                        agg.stdev(),
                        agg.n
                    );
                }
            }
        }
    }

    Ok(())
}
