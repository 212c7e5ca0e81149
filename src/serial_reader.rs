use crate::error::ScopeError;
use crate::line_source::ReaderLines;
use crate::types::*;
use log::info;
use serialport::SerialPort;
use std::io::BufReader;
use std::time::Duration;

pub type SerialLines = ReaderLines<BufReader<Box<dyn SerialPort>>>;

/// Serial connection settings. The device prints `"<ch0>,<ch1>\n"` lines.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD,
            timeout: Duration::from_millis(SERIAL_TIMEOUT_MS),
        }
    }

    pub fn with_baud(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Open the port and discard anything the OS buffered before we attached,
/// so the first line read is a fresh one.
pub fn open(config: &SerialConfig) -> Result<SerialLines, ScopeError> {
    info!(
        "Opening serial port: {} @ {}",
        config.port_name, config.baud_rate
    );

    let open_err = |e: serialport::Error| ScopeError::TransportOpen {
        port: config.port_name.clone(),
        baud: config.baud_rate,
        reason: e.to_string(),
    };

    let port = serialport::new(&config.port_name, config.baud_rate)
        .timeout(config.timeout)
        .open()
        .map_err(open_err)?;
    port.clear(serialport::ClearBuffer::Input).map_err(open_err)?;

    info!("Serial port opened. Reading lines...");
    Ok(ReaderLines::new(BufReader::new(port)))
}
