use std::{
    io::{self, Write},
    time::Duration,
};

use rusb::{DeviceHandle, GlobalContext};

use super::escpos;
use crate::config::PrinterConfig;

const STATUS_TIMEOUT: Duration = Duration::from_secs(1);

/// Bulk-transfer link to a USB receipt printer. libusb treats a zero timeout as
/// "wait forever".
pub struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
    in_endpoint: u8,
    out_endpoint: u8,
    timeout: Duration,
}

impl UsbTransport {
    pub fn open(config: &PrinterConfig) -> io::Result<Self> {
        let mut handle = rusb::open_device_with_vid_pid(config.vendor_id, config.product_id)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "no USB printer with vendor {:#06x} product {:#06x}",
                        config.vendor_id, config.product_id
                    ),
                )
            })?;

        if let Err(err) = handle.set_auto_detach_kernel_driver(true) {
            tracing::debug!(%err, "Kernel driver auto-detach unavailable");
        }
        handle
            .claim_interface(config.interface)
            .map_err(usb_io_error)?;

        tracing::info!(
            vendor_id = format_args!("{:#06x}", config.vendor_id),
            product_id = format_args!("{:#06x}", config.product_id),
            interface = config.interface,
            "Claimed USB receipt printer"
        );

        Ok(Self {
            handle,
            in_endpoint: config.in_endpoint,
            out_endpoint: config.out_endpoint,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    pub fn is_online(&mut self) -> io::Result<bool> {
        self.handle
            .write_bulk(
                self.out_endpoint,
                &escpos::TRANSMIT_PRINTER_STATUS,
                STATUS_TIMEOUT,
            )
            .map_err(usb_io_error)?;

        let mut status = [0u8; 1];
        let read = self
            .handle
            .read_bulk(self.in_endpoint, &mut status, STATUS_TIMEOUT)
            .map_err(usb_io_error)?;
        Ok(read == 1 && escpos::is_online(status[0]))
    }
}

impl Write for UsbTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle
            .write_bulk(self.out_endpoint, buf, self.timeout)
            .map_err(usb_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn usb_io_error(err: rusb::Error) -> io::Error {
    let kind = match err {
        rusb::Error::Timeout => io::ErrorKind::TimedOut,
        rusb::Error::NoDevice => io::ErrorKind::NotConnected,
        rusb::Error::NotFound => io::ErrorKind::NotFound,
        rusb::Error::Access => io::ErrorKind::PermissionDenied,
        rusb::Error::Interrupted => io::ErrorKind::Interrupted,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
