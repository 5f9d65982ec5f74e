use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
}

/// Outbound transactional mail. Plain text only; the order
/// confirmation is the single template this system sends.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    pub async fn send_order_confirmation(
        &self,
        to: &str,
        recipient_name: &str,
        order_id: Uuid,
        total_amount: Decimal,
    ) -> Result<(), EmailError> {
        let body = format!(
            "Hello {recipient_name},\n\n\
             Thank you for your order.\n\n\
             Order number: {order_id}\n\
             Total amount: {total_amount}\n\n\
             We will let you know once it ships.\n"
        );

        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(format!("Order confirmation {order_id}"))
            .body(body)?;

        self.transport.send(message).await?;
        Ok(())
    }
}
