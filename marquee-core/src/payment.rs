use std::sync::Arc;

use marquee_shared::Redacted;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::booking::{Booking, BookingRecords, BookingStatus, NewBooking, SeatsInput};
use crate::identity::UserProfile;
use crate::repository::CatalogRepository;
use crate::signature::{self, HashFields};
use crate::{CoreError, CoreResult};

pub const DEFAULT_PRODUCT_INFO: &str = "MovieTickets";
pub const DEFAULT_PHONE: &str = "9999999999";
pub const SUCCESS_CALLBACK_PATH: &str = "/api/payment/success";
pub const FAILURE_CALLBACK_PATH: &str = "/api/payment/failure";

/// Merchant credentials and URLs for the hosted payment gateway.
///
/// Built and validated once at startup, then shared read-only.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    merchant_key: String,
    merchant_salt: Redacted<String>,
    gateway_base_url: String,
    app_base_url: String,
    frontend_base_url: String,
    product_info: String,
    phone: String,
}

impl GatewayConfig {
    pub fn new(
        merchant_key: impl Into<String>,
        merchant_salt: impl Into<String>,
        gateway_base_url: impl Into<String>,
        app_base_url: impl Into<String>,
        frontend_base_url: impl Into<String>,
    ) -> CoreResult<Self> {
        let config = Self {
            merchant_key: merchant_key.into(),
            merchant_salt: Redacted::new(merchant_salt.into()),
            gateway_base_url: trim_url(gateway_base_url.into()),
            app_base_url: trim_url(app_base_url.into()),
            frontend_base_url: trim_url(frontend_base_url.into()),
            product_info: DEFAULT_PRODUCT_INFO.to_string(),
            phone: DEFAULT_PHONE.to_string(),
        };

        let required = [
            ("merchant key", config.merchant_key.as_str()),
            ("merchant salt", config.merchant_salt.expose().as_str()),
            ("gateway base URL", config.gateway_base_url.as_str()),
            ("application base URL", config.app_base_url.as_str()),
            ("frontend base URL", config.frontend_base_url.as_str()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(CoreError::Configuration(format!("Payment gateway {} is not set", name)));
        }

        Ok(config)
    }

    pub fn with_product_info(mut self, product_info: impl Into<String>) -> Self {
        self.product_info = product_info.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn merchant_key(&self) -> &str {
        &self.merchant_key
    }

    pub fn product_info(&self) -> &str {
        &self.product_info
    }

    pub fn payment_url(&self) -> String {
        format!("{}/_payment", self.gateway_base_url)
    }

    pub fn success_url(&self) -> String {
        format!("{}{}", self.app_base_url, SUCCESS_CALLBACK_PATH)
    }

    pub fn failure_url(&self) -> String {
        format!("{}{}", self.app_base_url, FAILURE_CALLBACK_PATH)
    }

    pub fn frontend_success_url(&self, txn_id: &str) -> String {
        format!("{}/payment-success?txnid={}", self.frontend_base_url, txn_id)
    }

    pub fn frontend_failure_url(&self) -> String {
        format!("{}/payment-failure", self.frontend_base_url)
    }

    fn salt(&self) -> &str {
        self.merchant_salt.expose()
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Gateway amounts always carry exactly two fraction digits.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Signed form the browser auto-submits to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRedirect {
    pub action: String,
    pub fields: Vec<(&'static str, String)>,
}

impl GatewayRedirect {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn render_form(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<body>\n");
        html.push_str(&format!(
            "<form id=\"paymentForm\" method=\"post\" action=\"{}\">\n",
            escape_html(&self.action)
        ));
        for (name, value) in &self.fields {
            html.push_str(&format!(
                "  <input type=\"hidden\" name=\"{}\" value=\"{}\" />\n",
                name,
                escape_html(value)
            ));
        }
        html.push_str("</form>\n");
        html.push_str("<script type=\"text/javascript\">document.getElementById(\"paymentForm\").submit();</script>\n");
        html.push_str("</body>\n</html>\n");
        html
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Body of `POST /api/payment/initiate`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePayment {
    pub amount: Decimal,
    pub show_id: i32,
    #[serde(default)]
    pub seats: SeatsInput,
}

/// Form fields posted by the gateway to the success and failure URLs.
/// Anything else the gateway sends is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub txnid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub productinfo: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub hash: String,
}

impl CallbackPayload {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Signs outbound payment requests and authenticates gateway callbacks,
/// driving the booking lifecycle from the latter.
#[derive(Clone)]
pub struct PaymentBridge {
    config: Arc<GatewayConfig>,
    bookings: BookingRecords,
    catalog: Arc<dyn CatalogRepository>,
}

impl PaymentBridge {
    pub fn new(config: GatewayConfig, bookings: BookingRecords, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self {
            config: Arc::new(config),
            bookings,
            catalog,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn bookings(&self) -> &BookingRecords {
        &self.bookings
    }

    /// Build the signed gateway form for a transaction.
    pub fn build_redirect(&self, txn_id: &str, amount: Decimal, first_name: &str, email: &str) -> GatewayRedirect {
        let amount = format_amount(amount);
        let fields = HashFields {
            key: self.config.merchant_key(),
            txnid: txn_id,
            amount: &amount,
            product_info: self.config.product_info(),
            first_name,
            email,
        };
        let hash = signature::request_hash(&fields, self.config.salt());

        GatewayRedirect {
            action: self.config.payment_url(),
            fields: vec![
                ("key", self.config.merchant_key().to_string()),
                ("txnid", txn_id.to_string()),
                ("amount", amount.clone()),
                ("productinfo", self.config.product_info().to_string()),
                ("firstname", first_name.to_string()),
                ("email", email.to_string()),
                ("phone", self.config.phone.clone()),
                ("surl", self.config.success_url()),
                ("furl", self.config.failure_url()),
                ("hash", hash),
            ],
        }
    }

    /// Record a pending booking for the payer and return it with its signed redirect.
    pub async fn initiate(&self, payer: &UserProfile, request: InitiatePayment) -> CoreResult<(Booking, GatewayRedirect)> {
        let seats = request.seats.into_selection()?;
        let new = NewBooking::new(payer.user_id, request.show_id, request.amount, seats)?;

        if self.catalog.find_show(new.show_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Show {} not found", new.show_id)));
        }

        let booking = self.bookings.create_pending(new).await?;
        let redirect = self.build_redirect(&booking.txn_id, booking.amount, &payer.name, payer.email.expose());

        info!("Payment initiated for booking {} ({})", booking.txn_id, format_amount(booking.amount));
        Ok((booking, redirect))
    }

    /// Recompute the response hash over the posted fields and compare it to the posted hash.
    pub fn verify_callback(&self, payload: &CallbackPayload) -> CoreResult<()> {
        let fields = HashFields {
            key: self.config.merchant_key(),
            txnid: &payload.txnid,
            amount: &payload.amount,
            product_info: &payload.productinfo,
            first_name: &payload.firstname,
            email: &payload.email,
        };
        let expected = signature::response_hash(&fields, &payload.status, self.config.salt());

        if signature::hashes_match(&expected, &payload.hash) {
            Ok(())
        } else {
            warn!("Callback hash mismatch for transaction {}", payload.txnid);
            Err(CoreError::SignatureMismatch(payload.txnid.clone()))
        }
    }

    /// Success URL handler: authenticated status from the gateway decides the outcome.
    pub async fn handle_success_callback(&self, payload: &CallbackPayload) -> CoreResult<Booking> {
        require_txnid(payload)?;
        self.verify_callback(payload)?;

        let target = if payload.is_success() {
            BookingStatus::Success
        } else {
            BookingStatus::Failed
        };
        self.bookings.transition(&payload.txnid, target).await
    }

    /// Failure URL handler: same authentication, always lands on `failed`.
    pub async fn handle_failure_callback(&self, payload: &CallbackPayload) -> CoreResult<Booking> {
        require_txnid(payload)?;
        self.verify_callback(payload)?;
        self.bookings.transition(&payload.txnid, BookingStatus::Failed).await
    }
}

fn require_txnid(payload: &CallbackPayload) -> CoreResult<()> {
    if payload.txnid.trim().is_empty() {
        return Err(CoreError::InvalidRequest("Missing transaction id".to_string()));
    }
    Ok(())
}
