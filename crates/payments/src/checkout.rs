//! Payment initiation.
//!
//! Turns an invoice into a hosted gateway checkout session and records the
//! attempt as a `pending` payment. The payment row is only written after the
//! gateway accepts the session, so a gateway failure leaves no local trace.

use rand::Rng;
use sqlx::PgPool;

use invopay_tenancy::{Invoice, NewPayment, OrgScope, Payments};

use crate::client::{InitiateRequest, PayChanguClient, PaymentMeta};
use crate::error::{PaymentError, PaymentResult};

/// Transaction references look like `INV-<invoice_id>-<8 uppercase
/// alphanumerics>`. Collisions are astronomically unlikely but references
/// are still checked against existing payments and regenerated on conflict.
const REFERENCE_SUFFIX_LEN: usize = 8;
const REFERENCE_SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_REFERENCE_ATTEMPTS: usize = 5;

/// Where the gateway sends the browser afterwards.
#[derive(Debug, Clone)]
pub struct PaymentUrls {
    /// Our callback route; the gateway appends `tx_ref` and `status`.
    pub callback_url: String,
    /// Where an abandoned checkout returns to.
    pub return_url: String,
}

impl PaymentUrls {
    pub fn from_env() -> Self {
        let callback_url = std::env::var("PAYMENT_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:8080/payments/callback".to_string());
        let return_url = std::env::var("PAYMENT_RETURN_URL")
            .unwrap_or_else(|_| "http://localhost:3000/invoices".to_string());
        Self {
            callback_url,
            return_url,
        }
    }
}

/// Payer details forwarded to the hosted checkout page.
#[derive(Debug, Clone, Default)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// What initiation hands back to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Checkout {
    pub checkout_url: String,
    pub tx_ref: String,
    pub payment_id: i64,
}

/// Initiates gateway checkouts and records pending payments.
pub struct CheckoutService {
    client: PayChanguClient,
    pool: PgPool,
    urls: PaymentUrls,
}

impl CheckoutService {
    pub fn new(client: PayChanguClient, pool: PgPool, urls: PaymentUrls) -> Self {
        Self { client, pool, urls }
    }

    /// Initiate a payment for an invoice.
    ///
    /// On gateway success exactly one `pending` payment row exists
    /// afterwards, carrying the generated reference and the raw gateway
    /// response. On gateway failure the error is returned as-is and zero
    /// rows are created.
    pub async fn initiate_payment(
        &self,
        scope: &OrgScope,
        invoice: &Invoice,
        customer: &CustomerDetails,
    ) -> PaymentResult<Checkout> {
        if !invoice.status.is_payable() {
            return Err(PaymentError::InvoiceNotPayable(invoice.status));
        }

        let payments = Payments::new(self.pool.clone());
        let tx_ref = self.unused_reference(&payments, invoice.id).await?;
        let request = build_initiate_request(invoice, customer, &tx_ref, &self.urls);

        let data = self.client.initiate(&request).await?;
        let raw = serde_json::to_value(&data).unwrap_or(serde_json::Value::Null);

        let payment = payments
            .create_pending(
                scope,
                NewPayment {
                    invoice_id: invoice.id,
                    amount_cents: invoice.total_cents,
                    currency: invoice.currency.clone(),
                    tx_ref: tx_ref.clone(),
                    gateway_payload: Some(raw),
                    // The payment belongs to the invoice's organization no
                    // matter what scope initiated it.
                    organization_id: Some(invoice.organization_id),
                },
            )
            .await?;

        tracing::info!(
            org_id = %invoice.organization_id,
            invoice_id = invoice.id,
            payment_id = payment.id,
            tx_ref = %tx_ref,
            "Initiated gateway checkout"
        );

        Ok(Checkout {
            checkout_url: data.checkout_url,
            tx_ref,
            payment_id: payment.id,
        })
    }

    /// Generate a reference and prove it unused. References are unique
    /// across tenants, hence the explicit cross-tenant probe.
    async fn unused_reference(&self, payments: &Payments, invoice_id: i64) -> PaymentResult<String> {
        for _ in 0..MAX_REFERENCE_ATTEMPTS {
            let candidate = generate_tx_ref(invoice_id);
            if !payments
                .tx_ref_exists(&OrgScope::all_organizations(), &candidate)
                .await?
            {
                return Ok(candidate);
            }
        }
        Err(PaymentError::ReferenceExhausted)
    }
}

/// `INV-<invoice_id>-<8 uppercase alphanumerics>`.
pub(crate) fn generate_tx_ref(invoice_id: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..REFERENCE_SUFFIX_ALPHABET.len());
            REFERENCE_SUFFIX_ALPHABET[idx] as char
        })
        .collect();
    format!("INV-{invoice_id}-{suffix}")
}

/// Minor units to the `"123.45"` form the gateway expects.
fn format_amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn build_initiate_request(
    invoice: &Invoice,
    customer: &CustomerDetails,
    tx_ref: &str,
    urls: &PaymentUrls,
) -> InitiateRequest {
    InitiateRequest {
        amount: format_amount(invoice.total_cents),
        currency: invoice.currency.clone(),
        tx_ref: tx_ref.to_string(),
        callback_url: urls.callback_url.clone(),
        return_url: urls.return_url.clone(),
        email: customer.email.clone(),
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        customization: None,
        meta: PaymentMeta {
            invoice_id: invoice.id,
            organization_id: invoice.organization_id,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invopay_tenancy::InvoiceStatus;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn test_invoice(id: i64, total_cents: i64) -> Invoice {
        let now = OffsetDateTime::now_utc();
        Invoice {
            id,
            organization_id: Uuid::new_v4(),
            client_id: 1,
            currency: "USD".to_string(),
            status: InvoiceStatus::Sent,
            total_cents,
            notes: None,
            issued_at: now,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn assert_reference_shape(tx_ref: &str, invoice_id: i64) {
        let prefix = format!("INV-{invoice_id}-");
        assert!(tx_ref.starts_with(&prefix), "reference was: {tx_ref}");
        let suffix = &tx_ref[prefix.len()..];
        assert_eq!(suffix.len(), REFERENCE_SUFFIX_LEN);
        assert!(suffix
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn references_match_the_documented_pattern() {
        assert_reference_shape(&generate_tx_ref(1), 1);
        assert_reference_shape(&generate_tx_ref(982), 982);
    }

    #[test]
    fn references_are_not_repeated_in_practice() {
        let a = generate_tx_ref(1);
        let b = generate_tx_ref(1);
        // 36^8 possibilities; equality here would indicate a broken RNG.
        assert_ne!(a, b);
    }

    #[test]
    fn amounts_format_as_major_units() {
        assert_eq!(format_amount(10000), "100.00");
        assert_eq!(format_amount(10005), "100.05");
        assert_eq!(format_amount(99), "0.99");
        assert_eq!(format_amount(150000_00), "150000.00");
    }

    #[test]
    fn initiate_request_embeds_correlation_meta() {
        let invoice = test_invoice(42, 12550);
        let urls = PaymentUrls {
            callback_url: "http://localhost:8080/payments/callback".to_string(),
            return_url: "http://localhost:3000/invoices".to_string(),
        };
        let customer = CustomerDetails {
            email: Some("client@example.com".to_string()),
            first_name: Some("Thoko".to_string()),
            last_name: Some("Banda".to_string()),
        };

        let request = build_initiate_request(&invoice, &customer, "INV-42-AAAA1111", &urls);

        assert_eq!(request.amount, "125.50");
        assert_eq!(request.currency, "USD");
        assert_eq!(request.meta.invoice_id, 42);
        assert_eq!(request.meta.organization_id, invoice.organization_id);
        assert_eq!(request.callback_url, urls.callback_url);
    }

    #[tokio::test]
    async fn unpayable_invoices_are_refused_before_any_io() {
        // Lazy pool: if the service touched the database or the gateway the
        // test would not return an InvoiceNotPayable error.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();
        let client = PayChanguClient::new(crate::client::PayChanguConfig {
            secret_key: "sec".to_string(),
            webhook_secret: "whsec".to_string(),
            base_url: "http://localhost:1".to_string(),
        });
        let service = CheckoutService::new(
            client,
            pool,
            PaymentUrls {
                callback_url: String::new(),
                return_url: String::new(),
            },
        );

        let mut invoice = test_invoice(1, 10000);
        invoice.status = InvoiceStatus::Paid;

        let err = service
            .initiate_payment(
                &OrgScope::organization(invoice.organization_id),
                &invoice,
                &CustomerDetails::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PaymentError::InvoiceNotPayable(InvoiceStatus::Paid)
        ));
    }
}
