use std::{
    fs::OpenOptions,
    io::{self, Write},
    sync::{Arc, Mutex},
};

use crate::config::{PrinterBackend, PrinterConfig};

pub mod escpos;
mod usb;

use usb::UsbTransport;

#[derive(thiserror::Error, Debug)]
pub enum PrintError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("printer lock poisoned by an earlier failed print")]
    Poisoned,
    #[error("print task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Character formatting applied to every following line until changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    align: Align,
    bold: bool,
    width: u8,
    height: u8,
}

impl TextStyle {
    const MAX_SCALE: u8 = 8;

    pub fn left() -> Self {
        Self {
            align: Align::Left,
            bold: false,
            width: 1,
            height: 1,
        }
    }

    pub fn centered() -> Self {
        Self {
            align: Align::Center,
            ..Self::left()
        }
    }

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn scaled(self, width: u8, height: u8) -> Self {
        Self {
            width: width.clamp(1, Self::MAX_SCALE),
            height: height.clamp(1, Self::MAX_SCALE),
            ..self
        }
    }
}

pub trait ReceiptPrinter: Send {
    fn set_style(&mut self, style: TextStyle) -> Result<(), PrintError>;
    fn text(&mut self, text: &str) -> Result<(), PrintError>;
    fn cut(&mut self) -> Result<(), PrintError>;
}

/// Drives any byte sink that understands ESC/POS.
pub struct EscPosPrinter<W: Write + Send> {
    sink: W,
}

impl<W: Write + Send> EscPosPrinter<W> {
    pub fn new(mut sink: W) -> io::Result<Self> {
        sink.write_all(&escpos::INITIALIZE)?;
        sink.write_all(&escpos::SELECT_LATIN1_CODE_PAGE)?;
        Ok(Self { sink })
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write + Send> ReceiptPrinter for EscPosPrinter<W> {
    fn set_style(&mut self, style: TextStyle) -> Result<(), PrintError> {
        Ok(self.sink.write_all(&escpos::style(&style))?)
    }

    fn text(&mut self, text: &str) -> Result<(), PrintError> {
        Ok(self.sink.write_all(&escpos::text(text))?)
    }

    fn cut(&mut self) -> Result<(), PrintError> {
        self.sink.write_all(&escpos::feed_and_cut())?;
        Ok(self.sink.flush()?)
    }
}

/// The one printer of the process. Whoever holds the lock owns the paper until
/// they release it, so two receipts can never interleave.
#[derive(Clone)]
pub struct SharedPrinter(Arc<Mutex<dyn ReceiptPrinter>>);

impl SharedPrinter {
    pub fn new<P: ReceiptPrinter + 'static>(printer: P) -> Self {
        Self(Arc::new(Mutex::new(printer)))
    }

    /// Runs `job` against the printer on a blocking thread while holding the lock.
    pub async fn with_printer<F>(&self, job: F) -> Result<(), PrintError>
    where
        F: FnOnce(&mut dyn ReceiptPrinter) -> Result<(), PrintError> + Send + 'static,
    {
        let printer = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || {
            let mut guard = printer.lock().map_err(|_| PrintError::Poisoned)?;
            job(&mut *guard)
        })
        .await
        .map_err(|err| PrintError::Aborted(err.to_string()))?
    }
}

pub fn open(config: &PrinterConfig) -> io::Result<SharedPrinter> {
    match config.backend {
        PrinterBackend::Usb => {
            let mut transport = UsbTransport::open(config)?;
            match transport.is_online() {
                Ok(true) => tracing::info!("Receipt printer is online"),
                Ok(false) => {
                    tracing::warn!("Receipt printer reports offline (cover open or out of paper?)")
                }
                Err(err) => tracing::warn!(%err, "Could not read receipt printer status"),
            }
            Ok(SharedPrinter::new(EscPosPrinter::new(transport)?))
        }
        PrinterBackend::File => {
            let file = OpenOptions::new()
                .append(true)
                .open(&config.device_path)?;
            tracing::info!(path = %config.device_path.display(), "Writing receipts to device file");
            Ok(SharedPrinter::new(EscPosPrinter::new(file)?))
        }
    }
}


#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::{
        testing::{Command, RecordingPrinter},
        *,
    };

    #[test]
    fn scale_is_clamped_to_printer_range() {
        let style = TextStyle::left().scaled(0, 12);
        assert_eq!(style, TextStyle::left().scaled(1, 8));
    }

    #[test]
    fn escpos_printer_initializes_then_writes_commands() {
        let mut printer = EscPosPrinter::new(Vec::new()).unwrap();
        printer.set_style(TextStyle::centered().bold()).unwrap();
        printer.text("Thank you!").unwrap();
        printer.cut().unwrap();

        let mut expected = escpos::INITIALIZE.to_vec();
        expected.extend(escpos::SELECT_LATIN1_CODE_PAGE);
        expected.extend(escpos::style(&TextStyle::centered().bold()));
        expected.extend(b"Thank you!");
        expected.extend(escpos::feed_and_cut());
        assert_eq!(printer.into_inner(), expected);
    }

    #[test]
    fn escpos_printer_sends_latin1_text_as_single_bytes() {
        let mut printer = EscPosPrinter::new(Vec::new()).unwrap();
        printer.text("Caf\u{e9} M\u{fc}ller").unwrap();

        let bytes = printer.into_inner();
        assert!(bytes.ends_with(b"Caf\xe9 M\xfcller"));
    }

    #[test]
    fn file_backend_refuses_missing_device() {
        let config = PrinterConfig {
            backend: PrinterBackend::File,
            device_path: std::env::temp_dir()
                .join(format!("receipt-printer-{}", std::process::id()))
                .join("lp0"),
            ..PrinterConfig::default()
        };

        match open(&config) {
            Ok(_) => panic!("opened a device that does not exist"),
            Err(err) => assert_eq!(err.kind(), io::ErrorKind::NotFound),
        }
        assert!(!config.device_path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_jobs_do_not_interleave() {
        let recorder = RecordingPrinter::default();
        let shared = SharedPrinter::new(recorder.clone());

        let jobs = (0..4).map(|job_id| {
            let shared = shared.clone();
            tokio::spawn(async move {
                shared
                    .with_printer(move |printer| {
                        for line in 0..5 {
                            printer.text(&format!("{job_id}:{line}"))?;
                            thread::sleep(Duration::from_millis(2));
                        }
                        printer.cut()
                    })
                    .await
            })
        });
        for job in jobs.collect::<Vec<_>>() {
            job.await.unwrap().unwrap();
        }

        let commands = recorder.commands();
        assert_eq!(commands.len(), 24);
        for receipt in commands.chunks(6) {
            let Command::Text(first) = &receipt[0] else {
                panic!("receipt must start with text, got {:?}", receipt[0]);
            };
            let job_id = first.split(':').next().unwrap();
            for (line, command) in receipt[..5].iter().enumerate() {
                assert_eq!(command, &Command::Text(format!("{job_id}:{line}")));
            }
            assert_eq!(receipt[5], Command::Cut);
        }
    }

    #[tokio::test]
    async fn job_error_is_returned_to_caller() {
        let shared = SharedPrinter::new(testing::FailingPrinter::new(0));
        let err = shared
            .with_printer(|printer| printer.text("hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, PrintError::Io(_)));
        assert!(err.to_string().contains("No such device"));
    }

    #[tokio::test]
    async fn printer_is_usable_after_a_failed_job() {
        let recorder = RecordingPrinter::default();
        let shared = SharedPrinter::new(recorder.clone());

        let failed = shared
            .with_printer(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "stalled").into()))
            .await;
        assert!(failed.is_err());

        shared.with_printer(|printer| printer.cut()).await.unwrap();
        assert_eq!(recorder.commands(), vec![Command::Cut]);
    }
}
