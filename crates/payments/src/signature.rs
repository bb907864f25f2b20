//! Checkout signatures: hex HMAC-SHA256 of `"{order_id}|{payment_id}"` keyed
//! with the merchant secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8], order_id: &str, payment_id: &str) -> Result<HmacSha256, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| GatewayError::Unavailable(format!("invalid signing key: {e}")))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(mac)
}

/// Computes the signature the gateway attaches to a successful payment.
pub fn sign(secret: &[u8], order_id: &str, payment_id: &str) -> Result<String, GatewayError> {
    Ok(hex::encode(mac(secret, order_id, payment_id)?.finalize().into_bytes()))
}

/// Checks a signature in constant time.
pub fn verify(
    secret: &[u8],
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), GatewayError> {
    let expected = hex::decode(signature).map_err(|_| GatewayError::SignatureMismatch)?;
    mac(secret, order_id, payment_id)?
        .verify_slice(&expected)
        .map_err(|_| GatewayError::SignatureMismatch)
}
