//! `senseedge` — command-line interface for SenseEdge vibration monitors.
//!
//! ```text
//! USAGE:
//!   senseedge list                     List discovered register windows
//!   senseedge status                   Decode the STATUS register
//!   senseedge setup [--gpio-base N]    Configure the seven user-IO pins
//!   senseedge load <FILE>              Load a 212-byte parameter file
//!   senseedge load --diagnostic        Load the bring-up diagnostic pattern
//!   senseedge monitor [--cycles N]     Run the classification loop
//!   senseedge spectrum                 Dump the 32-bin magnitude spectrum
//!   senseedge features                 Dump the last 8-feature frame
//! ```
//!
//! `--sim` runs any register command against the behavioral simulator
//! instead of hardware.

use anyhow::Result;
use clap::{Parser, Subcommand};
use senseedge_driver::chip::FEATURE_NAMES;
use senseedge_driver::setup::{BoardSetup, SysfsGpio};
use senseedge_driver::{
    decode_to_string, load_parameters, read_parameter_file, select_bus, BusSelection, CaptureLine,
    DeviceManager, GpioTxLine, ParameterSet, PipelineConfig, PipelineController, Reporter,
    SerialTiming, UartTx,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "senseedge", about = "SenseEdge vibration-monitor CLI", version)]
struct Cli {
    /// Use the behavioral simulator instead of hardware.
    #[arg(long, global = true)]
    sim: bool,

    /// Device index when several windows are discovered.
    #[arg(long, global = true)]
    device: Option<usize>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List discovered SenseEdge register windows.
    List,
    /// Decode and print the STATUS register.
    Status,
    /// Configure the seven user-IO pins through sysfs GPIO.
    Setup {
        /// GPIO number of user-IO pin 0 (default: SENSEEDGE_GPIO_BASE or 0).
        #[arg(long)]
        gpio_base: Option<u32>,
    },
    /// Load classifier parameters into the accelerator.
    Load {
        /// Parameter file: exactly 212 raw i8 bytes in memory order.
        file: Option<PathBuf>,

        /// Load the bring-up diagnostic pattern instead of a file.
        #[arg(long, conflicts_with = "file")]
        diagnostic: bool,
    },
    /// Configure, enable, and run the classification loop.
    Monitor {
        /// Cycles to run (0 = until killed).
        #[arg(long, default_value_t = 10)]
        cycles: u64,

        /// Parameter file; the diagnostic pattern is used when omitted.
        #[arg(long)]
        params: Option<PathBuf>,

        /// ADC clock divider.
        #[arg(long, default_value_t = 250)]
        clk_div: u16,

        /// Alarm confidence threshold.
        #[arg(long, default_value_t = 150)]
        threshold: u8,

        /// Consecutive faults before the alarm asserts.
        #[arg(long, default_value_t = 3)]
        faults: u8,

        /// Poll budget per cycle (register reads).
        #[arg(long, default_value_t = 1_000_000)]
        budget: u64,

        /// Also drive telemetry onto this GPIO as a bit-banged UART.
        #[arg(long)]
        tx_gpio: Option<u32>,

        /// Baud rate for --tx-gpio.
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
    },
    /// Dump the 32-bin magnitude spectrum of the most recent FFT.
    Spectrum,
    /// Dump the 8 extracted features of the most recent frame.
    Features,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let selection = if cli.sim {
        BusSelection::Sim
    } else {
        BusSelection::Uio
    };

    match cli.command {
        Cmd::List => cmd_list()?,
        Cmd::Status => cmd_status(selection, cli.device)?,
        Cmd::Setup { gpio_base } => cmd_setup(gpio_base)?,
        Cmd::Load { file, diagnostic } => cmd_load(selection, cli.device, file, diagnostic)?,
        Cmd::Monitor {
            cycles,
            params,
            clk_div,
            threshold,
            faults,
            budget,
            tx_gpio,
            baud,
        } => {
            let config = PipelineConfig {
                clk_div,
                alarm_threshold: threshold,
                consecutive_faults: faults,
                poll_budget: budget,
            };
            cmd_monitor(selection, cli.device, cycles, params, config, tx_gpio, baud)?;
        }
        Cmd::Spectrum => cmd_spectrum(selection, cli.device)?,
        Cmd::Features => cmd_features(selection, cli.device)?,
    }

    Ok(())
}

fn cmd_list() -> Result<()> {
    let mgr = DeviceManager::discover()?;

    println!("SenseEdge windows: {}", mgr.device_count());
    println!();
    for dev in mgr.devices() {
        println!("[uio{}] {}", dev.index, dev.name);
        println!("     node  {}", dev.dev_path.display());
        println!("     map0  {:#x} ({:#x} bytes)", dev.base_addr, dev.map_size);
        println!();
    }

    Ok(())
}

fn cmd_status(selection: BusSelection, device: Option<usize>) -> Result<()> {
    let bus = select_bus(selection, device)?;
    let mut pipeline = PipelineController::new(bus);
    let status = pipeline.status();

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("STATUS       : {:#010x}", status.raw);
    println!("Enabled      : {}", yes_no(status.enabled));
    println!("FFT busy     : {}", yes_no(status.fft_busy));
    println!("Feature busy : {}", yes_no(status.fe_busy));
    println!("NN busy      : {}", yes_no(status.nn_busy));
    println!("Alarm        : {}", yes_no(status.alarm));

    Ok(())
}

fn cmd_setup(gpio_base: Option<u32>) -> Result<()> {
    let setup = match gpio_base {
        Some(base) => BoardSetup::with_base(base),
        None => BoardSetup::new(),
    };

    let mut gpio = SysfsGpio::new(setup.gpio_base());
    setup.run(&mut gpio)?;

    println!("✅ Pins configured (GPIO base {})", setup.gpio_base());
    println!("Telemetry TX is gpio{}", gpio.tx_gpio());
    Ok(())
}

fn cmd_load(
    selection: BusSelection,
    device: Option<usize>,
    file: Option<PathBuf>,
    diagnostic: bool,
) -> Result<()> {
    let params = if diagnostic {
        println!("Loading diagnostic parameter pattern");
        ParameterSet::diagnostic()
    } else {
        let file = file
            .ok_or_else(|| anyhow::anyhow!("give a parameter file or use --diagnostic"))?;
        println!("Loading parameters from {}", file.display());
        read_parameter_file(&file)?
    };

    let mut bus = select_bus(selection, device)?;
    let summary = load_parameters(&mut bus, &params);

    println!(
        "✅ Loaded {} parameter words in {:?}",
        summary.words_written, summary.elapsed
    );
    Ok(())
}

fn cmd_monitor(
    selection: BusSelection,
    device: Option<usize>,
    cycles: u64,
    params: Option<PathBuf>,
    config: PipelineConfig,
    tx_gpio: Option<u32>,
    baud: u32,
) -> Result<()> {
    let params = match params {
        Some(path) => read_parameter_file(&path)?,
        None => ParameterSet::diagnostic(),
    };

    let bus = select_bus(selection, device)?;
    let mut pipeline = PipelineController::with_config(bus, config);
    pipeline.configure(&params)?;
    pipeline.enable()?;

    // Telemetry always renders to the console; --tx-gpio mirrors it onto
    // the board's UART pin as well
    let mut console = Reporter::new(UartTx::new(CaptureLine::new(), SerialTiming::immediate()));
    let mut pin = match tx_gpio {
        Some(gpio) => Some(Reporter::new(UartTx::new(
            GpioTxLine::open(gpio)?,
            SerialTiming::from_baud(baud),
        ))),
        None => None,
    };

    console.banner();
    if let Some(p) = &mut pin {
        p.banner();
    }
    flush_console(&mut console);

    let mut done = 0;
    while cycles == 0 || done < cycles {
        let outcome = pipeline.poll_cycle()?;
        console.report(&outcome);
        if let Some(p) = &mut pin {
            p.report(&outcome);
        }
        flush_console(&mut console);
        done += 1;
    }

    pipeline.disable();
    println!("\n✅ Monitored {done} cycle(s)");
    Ok(())
}

fn flush_console(console: &mut Reporter<CaptureLine>) {
    let levels = console.tx_mut().line_mut().drain();
    print!("{}", decode_to_string(&levels));
}

fn cmd_spectrum(selection: BusSelection, device: Option<usize>) -> Result<()> {
    let bus = select_bus(selection, device)?;
    let mut pipeline = PipelineController::new(bus);
    let bins = pipeline.read_spectrum();

    println!("Magnitude spectrum (32 bins):");
    for (row, chunk) in bins.chunks(8).enumerate() {
        print!("  [{:2}]", row * 8);
        for bin in chunk {
            print!(" {bin:5}");
        }
        println!();
    }

    Ok(())
}

fn cmd_features(selection: BusSelection, device: Option<usize>) -> Result<()> {
    let bus = select_bus(selection, device)?;
    let mut pipeline = PipelineController::new(bus);
    let features = pipeline.read_features();

    println!("Extracted features:");
    for (name, value) in FEATURE_NAMES.iter().zip(features) {
        println!("  {name:<20} : {value:3}");
    }

    Ok(())
}
