//! Raspberry Pi sensor source
//!
//! Digital channels come straight off GPIO input pins; analog channels go
//! through an MCP3008 on SPI0. Acquisition failures after init return
//! best-effort values (low / 0) per the sensor interface contract.

use super::{AnalogChannel, DigitalChannel, SensorSource};
use crate::config::SensorSection;
use rppal::gpio::{Gpio, InputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

const SPI_CLOCK_HZ: u32 = 1_000_000;

/// Fatal sensor initialization failure; aborts bootstrap
#[derive(Debug, Error)]
pub enum SensorInitError {
    #[error("GPIO init failed: {0}")]
    Gpio(#[from] rppal::gpio::Error),
    #[error("SPI init failed: {0}")]
    Spi(#[from] rppal::spi::Error),
}

/// GPIO + MCP3008 backed sensor source
pub struct PiSensors {
    pins: [InputPin; 4],
    // Spi::transfer needs &mut; reads are short and the telemetry task is
    // the only caller, so a std Mutex is fine here.
    spi: Mutex<Spi>,
    adc_channels: [u8; 2],
}

impl PiSensors {
    /// Claim the configured pins and open the SPI bus
    pub fn new(config: &SensorSection) -> Result<Self, SensorInitError> {
        let gpio = Gpio::new()?;
        let [p1, p2, p3, p4] = config.digital_pins;
        let pins = [
            gpio.get(p1)?.into_input(),
            gpio.get(p2)?.into_input(),
            gpio.get(p3)?.into_input(),
            gpio.get(p4)?.into_input(),
        ];
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)?;

        Ok(Self {
            pins,
            spi: Mutex::new(spi),
            adc_channels: config.adc_channels,
        })
    }

    /// Single-ended MCP3008 conversion: start bit, mode+channel, then two
    /// clocked-out bytes carrying the 10-bit result.
    fn read_mcp3008(&self, adc_channel: u8) -> u16 {
        let tx = [0x01, (0x08 | adc_channel) << 4, 0x00];
        let mut rx = [0u8; 3];

        let mut spi = match self.spi.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match spi.transfer(&mut rx, &tx) {
            Ok(_) => u16::from(rx[1] & 0x03) << 8 | u16::from(rx[2]),
            Err(e) => {
                warn!(adc_channel, error = %e, "ADC read failed, reporting 0");
                0
            }
        }
    }
}

impl SensorSource for PiSensors {
    fn read_digital(&self, channel: DigitalChannel) -> bool {
        let index = match channel {
            DigitalChannel::D1 => 0,
            DigitalChannel::D2 => 1,
            DigitalChannel::D3 => 2,
            DigitalChannel::D4 => 3,
        };
        self.pins[index].is_high()
    }

    fn read_analog(&self, channel: AnalogChannel) -> u16 {
        let adc_channel = match channel {
            AnalogChannel::A1 => self.adc_channels[0],
            AnalogChannel::A2 => self.adc_channels[1],
        };
        self.read_mcp3008(adc_channel)
    }
}
