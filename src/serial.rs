use embedded_hal_nb::serial::{Error, Write};

/// Presents a byte-at-a-time UART as an [`embedded_io::Write`] sink, so a
/// whole frame can be handed over in one `write_all`.
#[derive(Debug)]
pub struct NbWriter<Tx: Write> {
    tx: Tx,
}

impl<Tx: Write> NbWriter<Tx> {
    pub fn new(tx: Tx) -> NbWriter<Tx> {
        NbWriter { tx }
    }

    pub fn into_inner(self) -> Tx {
        self.tx
    }
}

#[derive(Debug)]
pub struct ErrorShim<T: Error>(pub T);

impl<T: Error> embedded_io::Error for ErrorShim<T> {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_hal_nb::serial::ErrorKind::*;
        match self.0.kind() {
            Overrun => embedded_io::ErrorKind::OutOfMemory,
            FrameFormat => embedded_io::ErrorKind::InvalidData,
            Parity => embedded_io::ErrorKind::InvalidData,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl<T: Error> From<T> for ErrorShim<T> {
    fn from(value: T) -> Self {
        ErrorShim(value)
    }
}

impl<Tx: Write> embedded_io::ErrorType for NbWriter<Tx> {
    type Error = ErrorShim<Tx::Error>;
}

impl<Tx: Write> embedded_io::Write for NbWriter<Tx> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for b in buf {
            nb::block!(self.tx.write(*b))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        nb::block!(self.tx.flush())?;
        Ok(())
    }
}
