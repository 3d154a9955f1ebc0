use embedded_hal::{
    digital::OutputPin,
    spi::{ErrorType, SpiBus},
};

use super::{BusClock, Interface, InterfaceKind};

/// SPI bus whose clock can be reprogrammed with a divisor of the core clock.
pub trait ClockControl: ErrorType {
    /// Applies a new clock divisor.
    fn set_clock_divisor(&mut self, divisor: u32) -> Result<(), Self::Error>;
}

impl<T: ClockControl + ?Sized> ClockControl for &mut T {
    fn set_clock_divisor(&mut self, divisor: u32) -> Result<(), Self::Error> {
        T::set_clock_divisor(self, divisor)
    }
}

/// Spi interface error
#[derive(Clone, Copy, Debug)]
pub enum SpiError<SPI, DC, CS> {
    Spi(SPI),
    Dc(DC),
    Cs(CS),
}

/// SPI interface with a data/command pin and a manually driven chip select.
///
/// Chip select is driven here rather than by an `SpiDevice` so that a
/// session can stay open across several transfers.
pub struct SpiInterface<'c, SPI, DC, CS> {
    spi: SPI,
    dc: DC,
    cs: CS,
    clock: &'c BusClock,
    applied_divisor: Option<u32>,
    in_session: bool,
}

impl<'c, SPI, DC, CS> SpiInterface<'c, SPI, DC, CS>
where
    SPI: SpiBus + ClockControl,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Create new interface
    pub fn new(spi: SPI, dc: DC, cs: CS, clock: &'c BusClock) -> Self {
        Self {
            spi,
            dc,
            cs,
            clock,
            applied_divisor: None,
            in_session: false,
        }
    }

    /// Release the DC and CS pins and SPI peripheral back, deconstructing the interface
    pub fn release(self) -> (SPI, DC, CS) {
        (self.spi, self.dc, self.cs)
    }

    /// Returns `true` while chip select is asserted.
    pub fn in_session(&self) -> bool {
        self.in_session
    }

    fn sync_clock(&mut self) -> Result<(), SpiError<SPI::Error, DC::Error, CS::Error>> {
        let divisor = self.clock.divisor();
        if self.applied_divisor != Some(divisor) {
            self.spi.flush().map_err(SpiError::Spi)?;
            self.spi
                .set_clock_divisor(divisor)
                .map_err(SpiError::Spi)?;
            log::debug!("spi clock divisor now {}", divisor);
            self.applied_divisor = Some(divisor);
        }
        Ok(())
    }
}

impl<SPI, DC, CS> Interface for SpiInterface<'_, SPI, DC, CS>
where
    SPI: SpiBus + ClockControl,
    DC: OutputPin,
    CS: OutputPin,
{
    type Error = SpiError<SPI::Error, DC::Error, CS::Error>;

    const KIND: InterfaceKind = InterfaceKind::Serial4Line;

    fn begin_session(&mut self) -> Result<(), Self::Error> {
        self.sync_clock()?;
        self.cs.set_low().map_err(SpiError::Cs)?;
        self.in_session = true;
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), Self::Error> {
        self.spi.flush().map_err(SpiError::Spi)?;
        self.cs.set_high().map_err(SpiError::Cs)?;
        self.in_session = false;
        Ok(())
    }

    fn transfer(&mut self, opcode: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.sync_clock()?;
        // the opcode is framed like parameters, 16 bits on the wire
        self.dc.set_low().map_err(SpiError::Dc)?;
        self.spi.write(&[0x00, opcode]).map_err(SpiError::Spi)?;
        self.spi.flush().map_err(SpiError::Spi)?;
        self.dc.set_high().map_err(SpiError::Dc)?;
        if !data.is_empty() {
            self.spi.write(data).map_err(SpiError::Spi)?;
            // DC must not move before the last data byte is shifted out
            self.spi.flush().map_err(SpiError::Spi)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.spi.flush().map_err(SpiError::Spi)
    }

    fn clock(&self) -> &BusClock {
        self.clock
    }
}
