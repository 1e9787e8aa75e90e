//! Email service for password reset links and order invoices.
//!
//! Uses SMTP via lettre for delivery with Askama plain text and HTML
//! templates. Sending is best-effort from the caller's point of view: results
//! are folded into a [`NotificationOutcome`] rather than failing the request.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use bazaar_core::format_money;

use crate::config::EmailConfig;
use crate::models::{Order, OrderItem};

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    reset_url: &'a str,
    ttl_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    reset_url: &'a str,
    ttl_minutes: i64,
}

/// One invoice line, pre-formatted for the templates.
pub struct InvoiceLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Template)]
#[template(path = "email/invoice.html")]
struct InvoiceEmailHtml<'a> {
    order_id: i32,
    lines: &'a [InvoiceLine],
    total: &'a str,
}

#[derive(Template)]
#[template(path = "email/invoice.txt")]
struct InvoiceEmailText<'a> {
    order_id: i32,
    lines: &'a [InvoiceLine],
    total: &'a str,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// What happened to a best-effort notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    /// Outgoing email is not configured.
    Disabled,
    Failed(String),
}

impl NotificationOutcome {
    /// Fold a send result into an outcome, logging failures.
    #[must_use]
    pub fn from_result(result: Result<(), EmailError>, what: &str) -> Self {
        match result {
            Ok(()) => Self::Sent,
            Err(e) => {
                tracing::warn!(error = %e, notification = what, "email delivery failed");
                Self::Failed(e.to_string())
            }
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_password_reset(
        &self,
        to: &str,
        reset_url: &str,
        ttl_minutes: i64,
    ) -> Result<(), EmailError> {
        let html = PasswordResetEmailHtml {
            reset_url,
            ttl_minutes,
        }
        .render()?;
        let text = PasswordResetEmailText {
            reset_url,
            ttl_minutes,
        }
        .render()?;

        self.send_multipart_email(to, "Password Reset Request", &text, &html)
            .await
    }

    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_invoice(
        &self,
        to: &str,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), EmailError> {
        let lines = invoice_lines(items);
        let total = format_money(order.total_price);
        let order_id = order.id.as_i32();

        let html = InvoiceEmailHtml {
            order_id,
            lines: &lines,
            total: &total,
        }
        .render()?;
        let text = InvoiceEmailText {
            order_id,
            lines: &lines,
            total: &total,
        }
        .render()?;

        self.send_multipart_email(to, &invoice_subject(order), &text, &html)
            .await
    }

    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_owned()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

fn invoice_subject(order: &Order) -> String {
    format!("Invoice for Order #{}", order.id)
}

fn invoice_lines(items: &[OrderItem]) -> Vec<InvoiceLine> {
    items
        .iter()
        .map(|item| InvoiceLine {
            name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: format_money(item.price_at_purchase),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use bazaar_core::{OrderId, OrderItemId, ProductId, UserId};

    use super::*;

    fn order() -> (Order, Vec<OrderItem>) {
        let order = Order {
            id: OrderId::new(17),
            buyer_id: UserId::new(3),
            total_price: Decimal::new(2750, 2),
            created_at: Utc::now(),
        };
        let items = vec![
            OrderItem {
                id: OrderItemId::new(1),
                order_id: order.id,
                product_id: ProductId::new(1),
                product_name: "Rooibos".to_owned(),
                quantity: 2,
                price_at_purchase: Decimal::new(1000, 2),
            },
            OrderItem {
                id: OrderItemId::new(2),
                order_id: order.id,
                product_id: ProductId::new(2),
                product_name: "Rusks".to_owned(),
                quantity: 1,
                price_at_purchase: Decimal::new(750, 2),
            },
        ];
        (order, items)
    }

    #[test]
    fn test_invoice_text_lists_items_and_total() {
        let (order, items) = order();
        let lines = invoice_lines(&items);
        let text = InvoiceEmailText {
            order_id: order.id.as_i32(),
            lines: &lines,
            total: &format_money(order.total_price),
        }
        .render()
        .unwrap();

        assert!(text.contains("Thank you for your order #17"));
        assert!(text.contains("- Rooibos x 2 @ R10.00"));
        assert!(text.contains("- Rusks x 1 @ R7.50"));
        assert!(text.contains("Total: R27.50"));
        assert_eq!(invoice_subject(&order), "Invoice for Order #17");
    }

    #[test]
    fn test_password_reset_text_mentions_link_and_expiry() {
        let text = PasswordResetEmailText {
            reset_url: "https://bazaar.test/reset-password/abc",
            ttl_minutes: 5,
        }
        .render()
        .unwrap();

        assert!(text.contains("https://bazaar.test/reset-password/abc"));
        assert!(text.contains("This link expires in 5 minutes."));
    }

    #[test]
    fn test_notification_outcome_from_result() {
        assert_eq!(
            NotificationOutcome::from_result(Ok(()), "invoice"),
            NotificationOutcome::Sent
        );
        let failed = NotificationOutcome::from_result(
            Err(EmailError::InvalidAddress("nope".to_owned())),
            "invoice",
        );
        assert!(failed.is_failed());
    }
}
