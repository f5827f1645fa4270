// visca test application -- CLI tool for driving a VISCA PTZ camera over a
// serial port or VISCA-over-IP.
//
// Usage:
//   visca-test-app list
//   visca-test-app --port /dev/ttyUSB0 position
//   visca-test-app --port /dev/ttyUSB0 jog 90 --speed 8 --duration 2
//   visca-test-app --udp 192.168.0.100:52381 --no-handshake zoom 4
//   visca-test-app --port COM3 absolute -- -45 10 --speed 12
//
// Set RUST_LOG=debug (or trace) to see frames on the wire.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use visca_camera::commands::ZoomDirection;
use visca_camera::limits::{all_models, model_by_name};
use visca_camera::{Outcome, ViscaBuilder, ViscaCamera};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// visca test application -- exercises a PTZ camera from the command line.
#[derive(Parser)]
#[command(name = "visca-test-app", version, about)]
struct Cli {
    /// Camera model name (see `list`).
    #[arg(long, default_value = "Scopia Flex")]
    model: String,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, conflicts_with = "udp")]
    port: Option<String>,

    /// VISCA-over-IP endpoint (e.g. 192.168.0.100:52381).
    #[arg(long)]
    udp: Option<SocketAddr>,

    /// Override the model's default baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Reply timeout in milliseconds.
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Skip the address handshake and talk to camera 1 directly.
    #[arg(long)]
    no_handshake: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported camera models.
    List,

    /// Jog pan/tilt along a direction in degrees (-180..=180).
    Jog {
        #[arg(allow_negative_numbers = true)]
        direction: f64,
        #[arg(long)]
        speed: Option<u8>,
        /// Stop after this many seconds (0 = leave it moving).
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },

    /// Jog pan/tilt with separate pan and tilt speed components.
    JogComponents {
        #[arg(allow_negative_numbers = true)]
        pan: i32,
        #[arg(allow_negative_numbers = true)]
        tilt: i32,
    },

    /// Move pan/tilt to an absolute position in degrees.
    Absolute {
        #[arg(allow_negative_numbers = true)]
        pan: f64,
        #[arg(allow_negative_numbers = true)]
        tilt: f64,
        #[arg(long, default_value_t = 10)]
        speed: u8,
    },

    /// Move pan/tilt to an absolute position in encoder counts.
    AbsoluteEncoder {
        #[arg(allow_negative_numbers = true)]
        pan: i32,
        #[arg(allow_negative_numbers = true)]
        tilt: i32,
        #[arg(long)]
        speed: Option<u8>,
    },

    /// Stop pan/tilt motion.
    Stop,

    /// Start zooming in or out.
    ZoomJog {
        #[arg(value_enum, default_value = "out")]
        direction: ZoomArg,
        #[arg(long)]
        speed: Option<u8>,
        /// Stop after this many seconds (0 = leave it moving).
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },

    /// Move the lens to a zoom ratio (e.g. 4 for 4x).
    Zoom { ratio: f64 },

    /// Stop zoom motion.
    ZoomStop,

    /// Print the pan/tilt position.
    Position,

    /// Print the zoom ratio.
    ZoomRatio,

    /// Print the maximum pan/tilt speeds.
    MaxSpeed,

    /// Print position and zoom ratio in a loop.
    Watch {
        /// Poll interval in milliseconds.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
        /// Number of polls (0 = run until Ctrl-C).
        #[arg(long, default_value_t = 0)]
        count: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ZoomArg {
    In,
    Out,
}

impl From<ZoomArg> for ZoomDirection {
    fn from(arg: ZoomArg) -> Self {
        match arg {
            ZoomArg::In => ZoomDirection::In,
            ZoomArg::Out => ZoomDirection::Out,
        }
    }
}

// ---------------------------------------------------------------------------
// Camera construction
// ---------------------------------------------------------------------------

async fn create_camera(cli: &Cli) -> Result<ViscaCamera> {
    let limits = model_by_name(&cli.model)
        .with_context(|| format!("unknown camera model '{}' (see `list`)", cli.model))?;

    let mut builder = ViscaBuilder::new(limits)
        .reply_timeout(Duration::from_millis(cli.timeout_ms))
        .handshake(!cli.no_handshake);

    builder = match (&cli.port, cli.udp) {
        (Some(port), _) => {
            let b = builder.serial_port(port);
            match cli.baud {
                Some(baud) => b.baud_rate(baud),
                None => b,
            }
        }
        (None, Some(addr)) => {
            if cli.baud.is_some() {
                bail!("--baud is not valid with --udp");
            }
            builder.udp(addr)
        }
        (None, None) => bail!("--port or --udp is required for this command"),
    };

    let mut camera = builder.build().context("failed to build camera")?;
    if !camera.connect().await {
        bail!("camera did not complete the connect handshake");
    }
    Ok(camera)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    for m in all_models() {
        let (zoom_lo, zoom_hi) = m.zoom_ratio_range();
        println!(
            "{:<14} pan {:>7.1}..{:<7.1} tilt {:>7.1}..{:<7.1} zoom {}x..{}x  speed {}..={}",
            m.name,
            m.min_pan.degrees(),
            m.max_pan.degrees(),
            m.min_tilt.degrees(),
            m.max_tilt.degrees(),
            zoom_lo,
            zoom_hi,
            m.min_pan_tilt_speed,
            m.max_pan_tilt_speed,
        );
    }
    Ok(())
}

fn print_outcome(what: &str, outcome: Outcome) {
    println!("{what}: {outcome:?}");
}

async fn cmd_watch(camera: &mut ViscaCamera, interval: Duration, count: u32) -> Result<()> {
    let mut polls = 0u32;
    loop {
        let (pan, tilt) = camera.pan_tilt_position().await?;
        let zoom = camera.zoom_ratio().await?;
        println!(
            "pan {:>8.3}°  tilt {:>8.3}°  zoom {:>6.2}x",
            pan.degrees(),
            tilt.degrees(),
            zoom
        );
        polls += 1;
        if count != 0 && polls >= count {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

async fn run(camera: &mut ViscaCamera, command: &Command) -> Result<()> {
    match *command {
        Command::List => unreachable!("handled before connecting"),
        Command::Jog {
            direction,
            speed,
            duration,
        } => {
            print_outcome("jog", camera.pan_tilt_jog(direction, speed).await?);
            if duration > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(duration)).await;
                print_outcome("stop", camera.pan_tilt_stop().await?);
            }
        }
        Command::JogComponents { pan, tilt } => {
            print_outcome("jog", camera.pan_tilt_jog_components(pan, tilt).await?);
        }
        Command::Absolute { pan, tilt, speed } => {
            print_outcome("absolute", camera.pan_tilt_absolute(pan, tilt, speed).await?);
        }
        Command::AbsoluteEncoder { pan, tilt, speed } => {
            print_outcome(
                "absolute",
                camera.pan_tilt_absolute_encoder(pan, tilt, speed).await?,
            );
        }
        Command::Stop => print_outcome("stop", camera.pan_tilt_stop().await?),
        Command::ZoomJog {
            direction,
            speed,
            duration,
        } => {
            print_outcome("zoom jog", camera.zoom_jog(direction.into(), speed).await?);
            if duration > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(duration)).await;
                print_outcome("zoom stop", camera.zoom_stop().await?);
            }
        }
        Command::Zoom { ratio } => print_outcome("zoom", camera.zoom_absolute(ratio).await?),
        Command::ZoomStop => print_outcome("zoom stop", camera.zoom_stop().await?),
        Command::Position => {
            let (pan, tilt) = camera.pan_tilt_position().await?;
            println!(
                "pan  {:>8.3}° ({} counts)\ntilt {:>8.3}° ({} counts)",
                pan.degrees(),
                pan.encoder_count(),
                tilt.degrees(),
                tilt.encoder_count()
            );
        }
        Command::ZoomRatio => {
            let zoom = camera.zoom_position().await?;
            println!("zoom {:.2}x ({} counts)", zoom.ratio(), zoom.encoder_count());
        }
        Command::MaxSpeed => {
            let (pan, tilt) = camera.pan_tilt_max_speed().await?;
            println!("max speed: pan {pan}, tilt {tilt}");
        }
        Command::Watch { interval_ms, count } => {
            cmd_watch(camera, Duration::from_millis(interval_ms), count).await?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .compact()
        .init();

    let cli = Cli::parse();

    // The `list` command does not require a camera connection.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let mut camera = create_camera(&cli).await?;
    info!(camera = camera.name(), "ready");

    let result = run(&mut camera, &cli.command).await;
    camera.disconnect().await.ok();
    result
}
