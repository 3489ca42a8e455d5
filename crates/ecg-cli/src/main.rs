use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ecg_lib::{
    config::read_config,
    detectors::ecg::{detect_beats_with_policy, DetectionPolicy},
    filters::{filter, FilterSpec},
    io::{self as ecg_io, text as text_io, Column},
    metrics::spectrum::analyze,
    noise::{add_noise, NoiseConfig, NoiseKind},
    pipeline::{run_pipeline, EcgPipelineConfig},
    plot::{
        figure_from_rr, figure_from_spectrum, figure_overlay, figure_with_peaks, Figure, Series,
    },
    signal::{SamplingContext, TimeSeries},
};
use plotters::prelude::*;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

const MAX_PLOT_POINTS: usize = 4000;

#[derive(Parser)]
#[command(
    name = "ecg",
    version,
    about = "ECG toolkit: band-pass filtering, R-peak detection, heart rate and spectra"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the raw waveform comes from.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Sample file (`.csv` or newline-delimited text); stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// CSV column, by index or header name
    #[arg(long, default_value = "0")]
    column: String,
    /// Sampling frequency in Hz
    #[arg(long, default_value_t = 500.0)]
    fs: f64,
}

/// Pipeline overrides shared by `analyze` and `plot`.
#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// TOML pipeline configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    low_cutoff: Option<f64>,
    #[arg(long)]
    high_cutoff: Option<f64>,
    #[arg(long)]
    order: Option<usize>,
    #[arg(long)]
    min_height: Option<f64>,
    #[arg(long)]
    min_separation_s: Option<f64>,
    /// Add `gaussian` or `uniform` noise before filtering
    #[arg(long)]
    noise: Option<String>,
    #[arg(long, default_value_t = 0.3)]
    noise_level: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Rescale the filtered signal to unit peak before detection
    #[arg(long)]
    normalize: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PlotView {
    /// Raw, noisy (if configured) and filtered waveforms
    Waveform,
    /// Filtered waveform with R-peak markers
    Peaks,
    /// RR intervals per beat
    Rr,
    /// One-sided magnitude spectrum of the filtered waveform
    Spectrum,
}

#[derive(Subcommand)]
enum Commands {
    /// Zero-phase Butterworth band-pass; prints the filtered series as JSON
    Filter {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 0.5)]
        low_cutoff: f64,
        #[arg(long, default_value_t = 50.0)]
        high_cutoff: f64,
        #[arg(long, default_value_t = 2)]
        order: usize,
    },
    /// Detect R-peaks on an already filtered series; prints peaks, RR and heart rate
    DetectBeats {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 0.5)]
        min_height: f64,
        #[arg(long, default_value_t = 0.6)]
        min_separation_s: f64,
    },
    /// One-sided magnitude spectrum as JSON
    Spectrum {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Add seeded noise; prints one sample per line
    AddNoise {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "gaussian")]
        kind: String,
        #[arg(long, default_value_t = 0.3)]
        level: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Run noise -> filter -> beats -> spectrum in one shot
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Render one view of the analysis to a PNG via plotters
    Plot {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, value_enum, default_value = "peaks")]
        view: PlotView,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Filter {
            input,
            low_cutoff,
            high_cutoff,
            order,
        } => cmd_filter(&input, FilterSpec::new(low_cutoff, high_cutoff, order))?,
        Commands::DetectBeats {
            input,
            min_height,
            min_separation_s,
        } => cmd_detect_beats(
            &input,
            DetectionPolicy {
                min_height,
                min_separation_s,
            },
        )?,
        Commands::Spectrum { input } => cmd_spectrum(&input)?,
        Commands::AddNoise {
            input,
            kind,
            level,
            seed,
        } => cmd_add_noise(&input, &kind, level, seed)?,
        Commands::Analyze { input, pipeline } => cmd_analyze(&input, &pipeline)?,
        Commands::Plot {
            input,
            pipeline,
            view,
            out,
        } => cmd_plot(&input, &pipeline, view, &out)?,
    }
    Ok(())
}

fn load_time_series(args: &InputArgs) -> Result<TimeSeries> {
    let data = match &args.input {
        Some(path) => ecg_io::read_samples(path, &Column::parse(&args.column))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf).context("parsing samples from stdin")?
        }
    };
    log::debug!("loaded {} samples at {} Hz", data.len(), args.fs);
    Ok(TimeSeries::new(args.fs, data)?)
}

fn pipeline_config(args: &PipelineArgs, fs: f64) -> Result<EcgPipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => read_config(path)?,
        None => EcgPipelineConfig::from_sampling(&SamplingContext::new(fs)?),
    };
    if let Some(low) = args.low_cutoff {
        cfg.filter.low_cutoff_hz = low;
    }
    if let Some(high) = args.high_cutoff {
        cfg.filter.high_cutoff_hz = high;
    }
    if let Some(order) = args.order {
        cfg.filter.order = order;
    }
    if let Some(min_height) = args.min_height {
        cfg.detection.min_height = min_height;
    }
    if let Some(min_separation_s) = args.min_separation_s {
        cfg.detection.min_separation_s = min_separation_s;
    }
    if let Some(tag) = &args.noise {
        cfg.noise = Some(NoiseConfig {
            kind: NoiseKind::parse(tag, args.noise_level)?,
            seed: args.seed,
        });
    }
    if args.normalize {
        cfg.normalize_amplitude = true;
    }
    Ok(cfg)
}

fn cmd_filter(input: &InputArgs, spec: FilterSpec) -> Result<()> {
    let ts = load_time_series(input)?;
    let filtered = filter(&ts, &spec)?;
    println!("{}", serde_json::to_string(&filtered)?);
    Ok(())
}

fn cmd_detect_beats(input: &InputArgs, policy: DetectionPolicy) -> Result<()> {
    let ts = load_time_series(input)?;
    let detection = detect_beats_with_policy(&ts, &policy)?;
    println!("{}", serde_json::to_string(&detection)?);
    Ok(())
}

fn cmd_spectrum(input: &InputArgs) -> Result<()> {
    let ts = load_time_series(input)?;
    let spec = analyze(&ts)?;
    println!("{}", serde_json::to_string(&spec)?);
    Ok(())
}

fn cmd_add_noise(input: &InputArgs, kind: &str, level: f64, seed: u64) -> Result<()> {
    let kind = NoiseKind::parse(kind, level)?;
    let ts = load_time_series(input)?;
    let noisy = add_noise(&ts, kind, seed)?;
    print!("{}", text_io::format_f64_series(&noisy.data));
    Ok(())
}

fn cmd_analyze(input: &InputArgs, pipeline: &PipelineArgs) -> Result<()> {
    let ts = load_time_series(input)?;
    let cfg = pipeline_config(pipeline, ts.fs)?;
    let analysis = run_pipeline(&ts, &cfg)?;
    println!("{}", serde_json::to_string(&analysis)?);
    Ok(())
}

fn cmd_plot(
    input: &InputArgs,
    pipeline: &PipelineArgs,
    view: PlotView,
    out: &Path,
) -> Result<()> {
    let raw = load_time_series(input)?;
    let cfg = pipeline_config(pipeline, raw.fs)?;
    let noisy = cfg
        .noise
        .map(|noise| add_noise(&raw, noise.kind, noise.seed))
        .transpose()?;
    let fig = match view {
        PlotView::Waveform => {
            let filtered = filter(noisy.as_ref().unwrap_or(&raw), &cfg.filter)?;
            let mut traces = vec![("Original ECG", &raw, 0x7F7F7F)];
            if let Some(noisy) = &noisy {
                traces.push(("Noisy ECG", noisy, 0xFF7F0E));
            }
            traces.push(("Filtered ECG", &filtered, 0x1F77B4));
            figure_overlay("ECG signal", &traces, MAX_PLOT_POINTS)
        }
        PlotView::Peaks => {
            let analysis = run_pipeline(&raw, &cfg)?;
            figure_with_peaks(&analysis.filtered, &analysis.beats.peaks, MAX_PLOT_POINTS)
        }
        PlotView::Rr => figure_from_rr(&run_pipeline(&raw, &cfg)?.beats.rr),
        // Independent of beat detection: a record without beats still has a spectrum.
        PlotView::Spectrum => {
            let filtered = filter(noisy.as_ref().unwrap_or(&raw), &cfg.filter)?;
            figure_from_spectrum(&analyze(&filtered)?, MAX_PLOT_POINTS)
        }
    };
    draw_plotters_figure(out, &fig).with_context(|| format!("rendering {}", out.display()))?;
    Ok(())
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (1000, 400));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (x_min, x_max, y_min, y_max) = fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                let width = line.style.width.round().max(1.0) as u32;
                let style = RGBColor(r, g, b).stroke_width(width);
                chart
                    .draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        style,
                    ))?
                    .label(line.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
            Series::Markers(markers) => {
                let (r, g, b) = markers.color.rgb();
                let color = RGBColor(r, g, b);
                let radius = markers.radius;
                chart
                    .draw_series(
                        markers
                            .points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), radius, color.filled())),
                    )?
                    .label(markers.name.clone())
                    .legend(move |(x, y)| Circle::new((x + 10, y), radius, color.filled()));
            }
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
