use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use hex::encode as hex_encode;
use log::{LevelFilter, debug};
use primix_core::constants::TEST_SAMPLES;
use primix_core::derive::DEFAULT_KDF_ITERATIONS;
use primix_core::{
    DigitEncoding, FastEngine, PrimeWidth, SecureEngine, SecureParams, StatsReport, derive_key,
    generate_token, secure_preset, timed_samples,
};
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(
    name = "primix",
    author,
    version,
    about = "PRIMIX prime-injected generators (experimental, not for key material)"
)]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WidthArg {
    Toy,
    Standard,
}

impl From<WidthArg> for PrimeWidth {
    fn from(arg: WidthArg) -> Self {
        match arg {
            WidthArg::Toy => PrimeWidth::Toy,
            WidthArg::Standard => PrimeWidth::Standard,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineArg {
    Fast,
    Secure,
}

impl EngineArg {
    fn label(self) -> &'static str {
        match self {
            EngineArg::Fast => "fast",
            EngineArg::Secure => "secure",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Decimal,
    Hex,
}

impl OutputFormat {
    fn render(self, value: u64) -> String {
        match self {
            OutputFormat::Decimal => value.to_string(),
            OutputFormat::Hex => format!("{value:016x}"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print outputs of the prime-injected engine.
    Secure {
        #[arg(long, default_value_t = 10, value_name = "N")]
        count: usize,
        #[arg(long, value_enum, default_value = "standard")]
        width: WidthArg,
        /// Overrides the lower prime bound of the chosen width.
        #[arg(long, value_name = "L")]
        prime_lower: Option<u64>,
        /// Overrides the upper prime bound of the chosen width.
        #[arg(long, value_name = "U")]
        prime_upper: Option<u64>,
        /// Miller-Rabin rounds.
        #[arg(long, value_name = "R")]
        rounds: Option<u32>,
        /// Pack pi digits the way the legacy generator did.
        #[arg(long)]
        legacy_digits: bool,
        #[arg(long, value_enum, default_value = "decimal")]
        format: OutputFormat,
    },
    /// Print outputs of the pure-mixing engine.
    Fast {
        #[arg(long, default_value_t = 10, value_name = "N")]
        count: usize,
        #[arg(long, value_enum, default_value = "decimal")]
        format: OutputFormat,
        #[arg(long, requires = "range_max", allow_hyphen_values = true)]
        range_min: Option<i64>,
        #[arg(long, requires = "range_min", allow_hyphen_values = true)]
        range_max: Option<i64>,
        /// Print floats in [0, 1) instead of integers.
        #[arg(long, conflicts_with_all = ["range_min", "range_max"])]
        float: bool,
    },
    /// Time raw generation.
    Bench {
        #[arg(long, value_enum, default_value = "fast")]
        engine: EngineArg,
        #[arg(long, default_value_t = 100_000, value_name = "N")]
        iterations: usize,
        #[arg(long, value_enum, default_value = "toy")]
        width: WidthArg,
    },
    /// Run the statistical harness and emit a JSON report.
    Stats {
        #[arg(long, value_enum, default_value = "fast")]
        engine: EngineArg,
        #[arg(long, default_value_t = TEST_SAMPLES, value_name = "N")]
        samples: usize,
        #[arg(long, value_enum, default_value = "toy")]
        width: WidthArg,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Generate 32-byte tokens from the secure engine.
    Token {
        #[arg(
            long,
            default_value_t = 1,
            value_name = "N",
            value_parser = clap::value_parser!(u16).range(1..=1000)
        )]
        count: u16,
        /// Print the compact `timestamp-bytes` form.
        #[arg(long)]
        hex: bool,
    },
    /// Stretch a password into key bytes with the secure engine.
    DeriveKey {
        #[arg(long)]
        password: String,
        #[arg(long, default_value_t = 32, value_name = "BYTES")]
        length: usize,
        #[arg(long, default_value_t = DEFAULT_KDF_ITERATIONS, value_name = "N")]
        iterations: u32,
        #[arg(long)]
        show_salt: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match cli.command {
        Commands::Secure {
            count,
            width,
            prime_lower,
            prime_upper,
            rounds,
            legacy_digits,
            format,
        } => {
            let params = secure_params(width, prime_lower, prime_upper, rounds, legacy_digits);
            cmd_secure(count, params, format)
        }
        Commands::Fast {
            count,
            format,
            range_min,
            range_max,
            float,
        } => cmd_fast(count, format, range_min.zip(range_max), float),
        Commands::Bench {
            engine,
            iterations,
            width,
        } => cmd_bench(engine, iterations, width.into()),
        Commands::Stats {
            engine,
            samples,
            width,
            out,
        } => cmd_stats(engine, samples, width.into(), out),
        Commands::Token { count, hex } => cmd_token(count, hex),
        Commands::DeriveKey {
            password,
            length,
            iterations,
            show_salt,
        } => cmd_derive_key(&password, length, iterations, show_salt),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn secure_params(
    width: WidthArg,
    prime_lower: Option<u64>,
    prime_upper: Option<u64>,
    rounds: Option<u32>,
    legacy_digits: bool,
) -> SecureParams {
    let mut params = secure_preset(width.into());
    if let Some(lower) = prime_lower {
        params.prime_lower = lower;
    }
    if let Some(upper) = prime_upper {
        params.prime_upper = upper;
    }
    if let Some(rounds) = rounds {
        params.rounds = rounds;
    }
    if legacy_digits {
        params = params.with_encoding(DigitEncoding::LegacyNibble);
    }
    params
}

fn secure_engine(params: SecureParams) -> Result<SecureEngine> {
    SecureEngine::with_params(params).with_context(|| {
        format!(
            "invalid secure parameters (primes in [{}, {}], {} rounds)",
            params.prime_lower, params.prime_upper, params.rounds
        )
    })
}

fn cmd_secure(count: usize, params: SecureParams, format: OutputFormat) -> Result<()> {
    let mut engine = secure_engine(params)?;
    for _ in 0..count {
        let value = engine.next_u64().context("secure generation failed")?;
        println!("{}", format.render(value));
    }
    debug!(
        "secure cmd count={} counter={} timestamp={}",
        count,
        engine.state().counter,
        engine.state().timestamp
    );
    Ok(())
}

fn cmd_fast(
    count: usize,
    format: OutputFormat,
    range: Option<(i64, i64)>,
    float: bool,
) -> Result<()> {
    let mut engine = FastEngine::new();
    debug!(
        "fast cmd rotation primes={:?}",
        engine.rotation_primes().amounts()
    );
    for _ in 0..count {
        if float {
            println!("{:.17}", engine.random_float());
        } else if let Some((min, max)) = range {
            let value = engine
                .random_range(min, max)
                .with_context(|| format!("invalid range [{min}, {max}]"))?;
            println!("{value}");
        } else {
            println!("{}", format.render(engine.next_u64()));
        }
    }
    Ok(())
}

fn collect(engine: EngineArg, count: usize, width: PrimeWidth) -> Result<(Vec<u64>, Duration)> {
    match engine {
        EngineArg::Fast => {
            let mut rng = FastEngine::new();
            let (values, elapsed) = timed_samples(count, || Ok::<_, Infallible>(rng.next_u64()))
                .context("fast generation failed")?;
            Ok((values, elapsed))
        }
        EngineArg::Secure => {
            let mut rng = secure_engine(secure_preset(width))?;
            timed_samples(count, || rng.next_u64()).context("secure generation failed")
        }
    }
}

fn cmd_bench(engine: EngineArg, iterations: usize, width: PrimeWidth) -> Result<()> {
    if iterations == 0 {
        bail!("iterations must be positive");
    }
    let start = Instant::now();
    let (values, elapsed) = collect(engine, iterations, width)?;
    let secs = elapsed.as_secs_f64();
    println!(
        "{}: {} values in {:.6} s ({:.0} values/s)",
        engine.label(),
        values.len(),
        secs,
        values.len() as f64 / secs.max(f64::MIN_POSITIVE)
    );
    debug!(
        "bench cmd engine={} last={:#018x} wall={:?}",
        engine.label(),
        values.last().copied().unwrap_or_default(),
        start.elapsed()
    );
    Ok(())
}

fn cmd_stats(
    engine: EngineArg,
    samples: usize,
    width: PrimeWidth,
    out: Option<PathBuf>,
) -> Result<()> {
    if samples < 2 {
        bail!("need at least two samples for transition statistics");
    }
    let (values, elapsed) = collect(engine, samples, width)?;
    let report = StatsReport::analyze(engine.label(), &values, elapsed);
    eprintln!(
        "{}: chi-square {:.2}, bit entropy {:.6}, {} values/s",
        report.rng,
        report.metrics.chi_square,
        report.metrics.bit_entropy,
        report.metrics.numbers_per_second
    );
    match out {
        Some(path) => {
            report
                .write_json(&path)
                .with_context(|| format!("writing report to {}", path.display()))?;
            println!("Wrote {} report to {}", report.rng, path.display());
        }
        None => println!("{}", report.to_json().context("serializing report")?),
    }
    Ok(())
}

fn cmd_token(count: u16, compact: bool) -> Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before UNIX epoch")?
        .as_secs();
    let mut engine = SecureEngine::new();
    for idx in 0..count {
        let token = generate_token(&mut engine, timestamp).context("token generation failed")?;
        if compact {
            println!("{}", token.to_hex());
        } else {
            println!(
                "Token {}: timestamp={} bytes={}",
                idx + 1,
                token.timestamp,
                hex_encode(token.bytes)
            );
        }
    }
    Ok(())
}

fn cmd_derive_key(password: &str, length: usize, iterations: u32, show_salt: bool) -> Result<()> {
    if password.is_empty() {
        bail!("password must not be empty");
    }
    let mut engine = SecureEngine::new();
    let derived = derive_key(&mut engine, password.as_bytes(), length, iterations)
        .with_context(|| format!("deriving a {length}-byte key"))?;
    println!("Key (hex): {}", hex_encode(&derived.key));
    if show_salt {
        println!("Salt (hex): {}", hex_encode(derived.salt));
    }
    debug!(
        "derive-key cmd length={} iterations={} engine_counter={}",
        length,
        iterations,
        engine.state().counter
    );
    Ok(())
}
