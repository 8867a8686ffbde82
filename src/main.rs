//! irverb CLI - render WAV files through the convolution reverb

use clap::{Parser, Subcommand};
use irverb::{
    render_file, FilterBankBuilder, ImpulseResponseStore, ImpulseShaper, RenderConfig, Reverb,
    ReverbConfig,
};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "irverb")]
#[command(about = "Partitioned convolution reverb", long_about = None)]
struct Cli {
    /// Config file (default: <user config dir>/irverb/irverb.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log rebuilds and asset loads
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a WAV file through the reverb
    Render {
        /// Input WAV file (mono or stereo, at the configured sample rate)
        input: PathBuf,

        /// Output WAV file path (32-bit float stereo)
        output: PathBuf,

        /// Impulse preset (overrides the config)
        #[arg(short, long)]
        preset: Option<String>,

        /// Decay 0.0-1.0
        #[arg(short, long)]
        decay: Option<f64>,

        /// Dry gain 0.0-1.0
        #[arg(long)]
        dry: Option<f32>,

        /// Wet gain 0.0-1.0
        #[arg(long)]
        wet: Option<f32>,

        /// Pass the input through unprocessed
        #[arg(long)]
        bypass: bool,

        /// Stop at the end of the input instead of rendering the reverb tail
        #[arg(long)]
        no_tail: bool,
    },

    /// List configured presets with their impulse lengths
    Presets,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            input,
            output,
            preset,
            decay,
            dry,
            wet,
            bypass,
            no_tail,
        } => {
            let params = &mut config.parameters;
            if let Some(preset) = preset {
                params.preset = preset;
            }
            if let Some(decay) = decay {
                params.decay = decay;
            }
            if let Some(dry) = dry {
                params.dry_mix = dry;
            }
            if let Some(wet) = wet {
                params.wet_mix = wet;
            }
            params.bypass |= bypass;

            println!("irverb renderer");
            println!("===============");
            println!("Input:       {}", input.display());
            println!("Output:      {}", output.display());
            println!("Preset:      {}", config.parameters.preset);
            println!("Decay:       {:.3}", config.parameters.decay);
            println!(
                "Mix:         dry {:.2} / wet {:.2}{}",
                config.parameters.dry_mix,
                config.parameters.wet_mix,
                if config.parameters.bypass { " (bypassed)" } else { "" }
            );
            println!();

            let mut reverb = Reverb::new(&config)?;
            let stats = render_file(
                &input,
                &output,
                &mut reverb,
                &RenderConfig { tail: !no_tail },
            )?;
            stats.print_summary(config.sample_rate);
        }

        Commands::Presets => {
            config.validate()?;
            let mut store = ImpulseResponseStore::from_config(&config);
            let shaper = ImpulseShaper::new(config.sample_rate);
            let builder = FilterBankBuilder::new(config.block_size, config.padding);
            let names: Vec<String> = store.preset_names().map(str::to_string).collect();

            println!(
                "{} presets at {} Hz, block size {}:",
                names.len(),
                config.sample_rate,
                config.block_size
            );
            for name in names {
                let path = store
                    .path(&name)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                match store.load(&name) {
                    Ok(impulse) => {
                        let shaped = shaper.shape(&impulse, config.parameters.decay);
                        println!(
                            "  {:<10} {} ({} frames, {:.2}s, {} partitions)",
                            name,
                            path,
                            shaped.len(),
                            shaped.duration(),
                            builder.partition_count(shaped.len())
                        );
                    }
                    Err(e) => println!("  {:<10} {} (unavailable: {})", name, path, e),
                }
            }
        }
    }

    Ok(())
}

/// Explicit config, else the user config file, else built-in defaults
fn load_config(path: Option<&Path>) -> Result<ReverbConfig, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(ReverbConfig::load(path)?);
    }
    match ReverbConfig::default_path() {
        Some(default) if default.exists() => Ok(ReverbConfig::load(&default)?),
        _ => Ok(ReverbConfig::default()),
    }
}
