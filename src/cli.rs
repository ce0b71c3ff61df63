//! CLI argument parsing

use clap::Parser;

/// Default SPI device
pub const DEFAULT_DEVICE: &str = "/dev/spidev5.1";

/// Parse a string as a hex byte, with or without a 0x prefix
pub fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex byte '{}': {}", s, e))
}

#[derive(Parser, Debug)]
#[command(name = "spitest")]
#[command(
    author,
    version,
    about = "Send bytes over a spidev device and print the reply",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// SPI device
    #[arg(short, long, value_name = "DEVICE", default_value = DEFAULT_DEVICE)]
    pub device: String,

    /// SPI speed (Hz)
    #[arg(short, long, value_name = "HZ", default_value_t = spiline_linux_spi::DEFAULT_SPEED_HZ)]
    pub speed: u32,

    /// Use GPIO# as custom chip select
    #[arg(long = "cs", value_name = "GPIO")]
    pub chip_select: Option<u32>,

    /// GPIO chip for --cs (number or /dev/gpiochipN path)
    #[arg(long, value_name = "CHIP", default_value = "0")]
    pub gpiochip: String,

    /// Bytes to send, in hex (an odd count is padded with 00)
    #[arg(value_name = "BYTE", required = true, value_parser = parse_hex_u8)]
    pub bytes: Vec<u8>,
}
