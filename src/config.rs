use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_inline_default::serde_inline_default;

const DEFAULT_VENDOR_ID: u16 = 0x04b8;
const DEFAULT_PRODUCT_ID: u16 = 0x0202;
const DEFAULT_IN_ENDPOINT: u8 = 0x82;
const DEFAULT_OUT_ENDPOINT: u8 = 0x01;
const DEFAULT_DEVICE_PATH: &str = "/dev/usb/lp0";
const DEFAULT_UPSTREAM_URL: &str = "http://192.168.1.51:5008";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SUPPORT_PHONE: &str = "1-810-206-2181";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything the service needs to reach the upstream API and the printer.
/// Any field left out of the config file falls back to its default.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub printer: PrinterConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub receipt: ReceiptConfig,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrinterBackend {
    #[default]
    Usb,
    /// Raw ESC/POS bytes written to `device_path`, e.g. the usblp character device.
    File,
}

#[serde_inline_default]
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PrinterConfig {
    #[serde(default)]
    pub backend: PrinterBackend,
    #[serde_inline_default(DEFAULT_VENDOR_ID)]
    pub vendor_id: u16,
    #[serde_inline_default(DEFAULT_PRODUCT_ID)]
    pub product_id: u16,
    #[serde_inline_default(0)]
    pub interface: u8,
    #[serde_inline_default(DEFAULT_IN_ENDPOINT)]
    pub in_endpoint: u8,
    #[serde_inline_default(DEFAULT_OUT_ENDPOINT)]
    pub out_endpoint: u8,
    /// Bulk transfer timeout. 0 waits forever.
    #[serde_inline_default(0)]
    pub timeout_ms: u64,
    #[serde_inline_default(PathBuf::from(DEFAULT_DEVICE_PATH))]
    pub device_path: PathBuf,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            backend: PrinterBackend::Usb,
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            interface: 0,
            in_endpoint: DEFAULT_IN_ENDPOINT,
            out_endpoint: DEFAULT_OUT_ENDPOINT,
            timeout_ms: 0,
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
        }
    }
}

#[serde_inline_default]
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    #[serde_inline_default(DEFAULT_UPSTREAM_URL.to_string())]
    pub base_url: String,
    #[serde_inline_default(DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

#[serde_inline_default]
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ReceiptConfig {
    #[serde_inline_default(DEFAULT_SUPPORT_PHONE.to_string())]
    pub support_phone: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            support_phone: DEFAULT_SUPPORT_PHONE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_path_uses_defaults() {
        let config = Config::load(None).unwrap();

        assert_eq!(config.printer.backend, PrinterBackend::Usb);
        assert_eq!(config.printer.vendor_id, 0x04b8);
        assert_eq!(config.printer.product_id, 0x0202);
        assert_eq!(config.printer.in_endpoint, 0x82);
        assert_eq!(config.printer.out_endpoint, 0x01);
        assert_eq!(config.upstream.base_url, "http://192.168.1.51:5008");
        assert_eq!(config.upstream.timeout_secs, 10);
        assert_eq!(config.receipt.support_phone, "1-810-206-2181");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "printer": { "backend": "file", "device_path": "/tmp/receipt.bin" },
                "upstream": { "base_url": "http://localhost:5008" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.printer.backend, PrinterBackend::File);
        assert_eq!(config.printer.device_path, PathBuf::from("/tmp/receipt.bin"));
        assert_eq!(config.printer.vendor_id, 0x04b8);
        assert_eq!(config.upstream.base_url, "http://localhost:5008");
        assert_eq!(config.upstream.timeout_secs, 10);
        assert_eq!(config.receipt.support_phone, "1-810-206-2181");
    }

    #[test]
    fn empty_object_matches_default_impl() {
        let parsed: Config = serde_json::from_str("{}").unwrap();
        let default = Config::default();

        assert_eq!(parsed.printer.vendor_id, default.printer.vendor_id);
        assert_eq!(parsed.printer.device_path, default.printer.device_path);
        assert_eq!(parsed.upstream.base_url, default.upstream.base_url);
        assert_eq!(parsed.receipt.support_phone, default.receipt.support_phone);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<Config>(r#"{ "upstream": { "baseurl": "x" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = Config::load(Some(Path::new("/nonexistent/receipt-printer.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/receipt-printer.json"));
    }
}
