//! Simulated pay-by-QR flow.
//!
//! No gateway is contacted. A request builds a UPI deep link, encodes it as a
//! QR code and records a pending transaction; settlement is whatever the
//! injected [`StatusSource`] reports.

mod qr;
mod status;

pub(crate) use qr::QrImage;
pub(crate) use status::{GatewayStatus, RandomStatusSource, StatusSource};
#[cfg(test)]
pub(crate) use status::ScriptedStatusSource;

use rust_decimal::Decimal;

use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::TransactionStatus;

/// Payee address placed in every payment URI.
pub(crate) const MERCHANT_VPA: &str = "expensetracker@upi";
pub(crate) const MERCHANT_NAME: &str = "Expense Tracker";
pub(crate) const CURRENCY: &str = "INR";

/// A freshly created payment request.
#[derive(Debug)]
pub(crate) struct PaymentRequest {
    pub(crate) transaction_id: String,
    pub(crate) uri: String,
    pub(crate) qr: QrImage,
}

/// Outcome of polling a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settlement {
    Completed,
    Pending,
}

pub(crate) struct PaymentStub<S: StatusSource> {
    source: S,
}

impl<S: StatusSource> PaymentStub<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }

    /// Build a QR payment request and record it as pending.
    ///
    /// The amount is rounded to paise once, so the QR and the stored
    /// transaction always carry the same figure. Failures are logged and
    /// reported as `None`; nothing is raised.
    pub(crate) fn create_payment_request(
        &self,
        db: &Database,
        amount: Decimal,
        description: &str,
    ) -> Option<PaymentRequest> {
        let amount = payable_amount(amount);
        let transaction_id = uuid::Uuid::new_v4().to_string();
        let uri = payment_uri(&transaction_id, amount, description);

        let qr = match QrImage::encode(&uri) {
            Ok(qr) => qr,
            Err(e) => {
                log::error!("Failed to encode payment QR for {transaction_id}: {e}");
                return None;
            }
        };

        if let Err(e) = db.create_pending_transaction(&transaction_id, amount, description) {
            log::error!("Failed to record payment request {transaction_id}: {e}");
            return None;
        }

        log::info!("Created payment request {transaction_id} for {amount} {CURRENCY}");
        Some(PaymentRequest {
            transaction_id,
            uri,
            qr,
        })
    }

    /// Poll the status source and settle the transaction on success.
    pub(crate) fn check_status(&mut self, db: &Database, transaction_id: &str) -> Result<Settlement> {
        let txn = db
            .get_transaction(transaction_id)?
            .ok_or_else(|| TrackerError::not_found(format!("Transaction {transaction_id}")))?;
        if txn.is_completed() {
            return Ok(Settlement::Completed);
        }

        match self.source.poll(transaction_id) {
            GatewayStatus::Success => {
                db.mark_transaction_status(transaction_id, TransactionStatus::Completed)?;
                log::info!("Payment {transaction_id} settled");
                Ok(Settlement::Completed)
            }
            GatewayStatus::Pending => {
                log::debug!("Payment {transaction_id} still pending");
                Ok(Settlement::Pending)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }
}

/// An amount as it can be paid: whole paise.
pub(crate) fn payable_amount(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// `upi://pay?pa=..&pn=..&tr=..&am=..&cu=..&tn=..`, free text percent-encoded.
pub(crate) fn payment_uri(transaction_id: &str, amount: Decimal, description: &str) -> String {
    let fields = [
        ("pa", MERCHANT_VPA.to_string()),
        ("pn", urlencoding::encode(MERCHANT_NAME).into_owned()),
        ("tr", transaction_id.to_string()),
        ("am", format!("{:.2}", amount)),
        ("cu", CURRENCY.to_string()),
        ("tn", urlencoding::encode(description).into_owned()),
    ];
    let query: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("upi://pay?{}", query.join("&"))
}
