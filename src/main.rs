//! distox-io - dump and calibration tool for DistoX survey instruments
//!
//! Usage:
//!
//! ```text
//! distox-io [--config <path>] [--port <tty>] [--name <device-name>] <action> [args]
//!
//! Actions:
//!   toggle-cal                      flip calibration mode on/off
//!   dump-cal  <file>                save device calibration (raw binary)
//!   load-cal  <file>                write calibration (raw or tlx_calib hex)
//!   dump-data <count|all> <file>    dump most-recent log records to CSV
//! ```
//!
//! Pairing the device and binding its RFCOMM channel to a tty is done
//! outside this tool (e.g. `rfcomm bind 0 <bdaddr>`).

use distox_io::config::Config;
use distox_io::device::{DistoDriver, DumpCount};
use distox_io::error::{Error, Result};
use distox_io::report::CsvReport;
use distox_io::transport::SerialTransport;
use std::env;
use std::fs;
use std::io::{BufWriter, Write};

/// Command-line options: flags plus positional action arguments
struct Options {
    config_path: Option<String>,
    port: Option<String>,
    device_name: Option<String>,
    action: Vec<String>,
}

/// Parse args by hand: `--config/-c`, `--port`, `--name` flags, the rest
/// positional
fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut opts = Options {
        config_path: None,
        port: None,
        device_name: None,
        action: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" if i + 1 < args.len() => {
                opts.config_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--port" if i + 1 < args.len() => {
                opts.port = Some(args[i + 1].clone());
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                opts.device_name = Some(args[i + 1].clone());
                i += 2;
            }
            _ => {
                opts.action.push(args[i].clone());
                i += 1;
            }
        }
    }
    opts
}

fn usage() -> Error {
    Error::InvalidParameter(
        "no action specified; expected toggle-cal | dump-cal <file> | \
         load-cal <file> | dump-data <count|all> <file>"
            .to_string(),
    )
}

fn main() -> Result<()> {
    let opts = parse_args();

    // Load configuration, then let flags override it
    let mut config = match &opts.config_path {
        Some(path) => Config::load(path)?,
        None => Config::defaults(),
    };
    if let Some(port) = opts.port {
        config.port.path = port;
    }
    if let Some(name) = opts.device_name {
        config.port.device_name = name;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("distox-io v{} starting...", env!("CARGO_PKG_VERSION"));

    let transport = SerialTransport::open(&config.port.path, config.port.baud)?;
    let mut driver = DistoDriver::new(transport, &config.port.device_name)?;

    let action: Vec<&str> = opts.action.iter().map(String::as_str).collect();
    match action.as_slice() {
        ["toggle-cal"] => {
            let was_on = driver.read_cal_mode()?;
            log::info!("CAL mode originally {}", if was_on { "on" } else { "off" });
            let now_on = driver.toggle_cal_mode()?;
            log::info!("CAL mode now {}", if now_on { "on" } else { "off" });
        }
        ["dump-cal", file] => {
            log::info!("Saving device calibration to '{}'", file);
            let blob = driver.dump_calibration()?;
            fs::write(file, blob)?;
            log::info!("... done");
        }
        ["load-cal", file] => {
            log::info!("Writing device calibration from '{}'", file);
            let input = fs::read(file)?;
            driver.load_calibration(&input)?;
            log::info!("... done");
        }
        ["dump-data", count, file] => {
            let count = if *count == "all" {
                DumpCount::All
            } else {
                let n = count.parse::<u16>().map_err(|_| {
                    Error::InvalidParameter(format!(
                        "record count must be a number or 'all', got '{}'",
                        count
                    ))
                })?;
                DumpCount::Recent(n)
            };

            log::info!("Dumping log records to '{}'", file);
            let out = BufWriter::new(fs::File::create(file)?);
            let mut report = CsvReport::new(out)?;
            let delivered = driver.dump_log(count, &mut report)?;
            report.into_inner().flush()?;
            log::info!("... done, {} records", delivered);
        }
        [] => return Err(usage()),
        other => {
            return Err(Error::InvalidParameter(format!(
                "unrecognized action: {:?}",
                other.join(" ")
            )))
        }
    }

    Ok(())
}
