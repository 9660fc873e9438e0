//! Potentiometer writes over the Raspberry Pi SPI peripheral, one handle
//! per chip select.

use digipot_traits::PotBus;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::error::{HwError, Result};

pub struct SpiPotBus {
    handles: Vec<Spi>,
}

fn bus_of(index: u8) -> Result<Bus> {
    Ok(match index {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        3 => Bus::Spi3,
        4 => Bus::Spi4,
        5 => Bus::Spi5,
        6 => Bus::Spi6,
        other => return Err(HwError::Spi(format!("no SPI bus {other}"))),
    })
}

fn slave_of(index: u8) -> Result<SlaveSelect> {
    Ok(match index {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        other => return Err(HwError::Spi(format!("no chip select {other}"))),
    })
}

impl SpiPotBus {
    /// Open one mode-0 handle per entry of `chip_selects`; channel `i` writes
    /// through `chip_selects[i]`.
    pub fn open(bus: u8, chip_selects: &[u8], clock_hz: u32) -> Result<Self> {
        let bus = bus_of(bus)?;
        let mut handles = Vec::with_capacity(chip_selects.len());
        for &cs in chip_selects {
            let spi = Spi::new(bus, slave_of(cs)?, clock_hz, Mode::Mode0)
                .map_err(|e| HwError::Spi(format!("open cs{cs}: {e}")))?;
            handles.push(spi);
        }
        tracing::info!(?bus, channels = handles.len(), clock_hz, "spi opened");
        Ok(Self { handles })
    }
}

impl PotBus for SpiPotBus {
    fn write(
        &mut self,
        channel: usize,
        bytes: [u8; 2],
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let spi = self
            .handles
            .get_mut(channel)
            .ok_or(HwError::UnknownChannel(channel))?;
        let n = spi
            .write(&bytes)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        if n != bytes.len() {
            return Err(Box::new(HwError::Spi(format!(
                "short write: {n} of {} bytes",
                bytes.len()
            ))));
        }
        Ok(())
    }
}
