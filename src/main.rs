//! spitest - exchange a few bytes with a spidev device
//!
//! The bytes given on the command line are sent in one full-duplex
//! transfer and overwritten by whatever the peripheral clocks back:
//!
//! ```text
//! $ spitest -d /dev/spidev0.0 9f 00 00 00
//! send: 9F 00 00 00
//! recv: FF EF 40 18
//! ```

mod cli;

use clap::Parser;
use cli::Cli;
use spiline_linux_spi::{LinuxSpi, LinuxSpiConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(&cli) {
        log::error!("{}: {}", cli.device, e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut values = pad_to_even(cli.bytes.clone());

    let mut config = LinuxSpiConfig::new(cli.device.as_str()).with_speed(cli.speed);
    if let Some(pin) = cli.chip_select {
        config = config.with_chip_select(pin);
    }
    let mut spi = open_device(&config, &cli.gpiochip)?;

    println!("send: {}", format_bytes(&values));
    let result = spi.transfer_in_place(&mut values);
    let closed = spi.close();
    result?;
    closed?;
    println!("recv: {}", format_bytes(&values));

    Ok(())
}

#[cfg(feature = "linux-gpio")]
fn open_device(
    config: &LinuxSpiConfig,
    gpiochip: &str,
) -> Result<LinuxSpi, Box<dyn std::error::Error>> {
    if config.chip_select.is_none() {
        return Ok(LinuxSpi::open(config)?);
    }
    let mut controller = spiline_linux_gpio::GpioChipSelect::new(
        spiline_linux_gpio::chip_path(gpiochip)?,
    )
    .with_consumer("spitest");
    Ok(LinuxSpi::open_with_chip_select(config, &mut controller)?)
}

#[cfg(not(feature = "linux-gpio"))]
fn open_device(
    config: &LinuxSpiConfig,
    _gpiochip: &str,
) -> Result<LinuxSpi, Box<dyn std::error::Error>> {
    if config.chip_select.is_some() {
        return Err("--cs requires the linux-gpio feature".into());
    }
    Ok(LinuxSpi::open(config)?)
}

/// Odd byte counts are padded with a trailing 00
fn pad_to_even(mut values: Vec<u8>) -> Vec<u8> {
    if values.len() % 2 == 1 {
        values.push(0);
    }
    values
}

/// Format bytes as space-separated upper-case hex
fn format_bytes(values: &[u8]) -> String {
    values
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
