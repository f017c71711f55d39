use std::sync::Arc;

use time::{
    format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime, UtcOffset,
};

use super::code::RedemptionCode;
use crate::printer::{PrintError, ReceiptPrinter, TextStyle};

const PRINTED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month]/[day]/[year repr:last_two] [hour]:[minute]");

/// Wall-clock source for the receipt date, read once per receipt.
pub type LocalClock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Current time in the zone the host is configured for. The offset is looked up
/// on every call so daylight saving changes show up without a restart.
pub fn local_now() -> OffsetDateTime {
    let seconds = chrono::Local::now().offset().local_minus_utc();
    let offset = UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}

pub fn printed_at(now: OffsetDateTime) -> Result<String, time::error::Format> {
    now.format(PRINTED_AT_FORMAT)
}

/// Everything that ends up on paper for one purchase.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub brand_name: String,
    pub brand_domain: String,
    pub code: RedemptionCode,
    pub printed_at: String,
    pub support_phone: String,
}

impl Receipt {
    pub fn redemption_url(&self) -> String {
        format!("https://{}/{}", self.brand_domain, self.code)
    }

    pub fn render<P: ReceiptPrinter + ?Sized>(&self, printer: &mut P) -> Result<(), PrintError> {
        printer.set_style(TextStyle::centered().bold().scaled(2, 2))?;
        printer.text(&format!("{}\n", self.brand_name))?;
        printer.text("Bitcoin Purchase\n")?;

        printer.set_style(TextStyle::left())?;
        printer.text(&format!("Date: {}\n", self.printed_at))?;
        // The redemption code is printed again as the transaction id.
        printer.text(&format!("Transaction ID: {}\n\n", self.code))?;
        printer.text(&format!("REDEMPTION CODE: {}\n\n", self.code))?;

        printer.set_style(TextStyle::centered())?;
        printer.text("To redeem your Bitcoin, visit:\n")?;
        printer.text(&format!("{}\n\n", self.redemption_url()))?;

        printer.set_style(TextStyle::left())?;
        printer.text(&format!("Support: {}", self.support_phone))?;
        printer.text("\n")?;
        printer.text("\n")?;

        printer.set_style(TextStyle::centered().scaled(2, 2))?;
        printer.text("Thank you!")?;
        printer.cut()
    }
}
