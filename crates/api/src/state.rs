//! Shared application state.

use std::sync::Arc;

use analytics::AnalyticsService;
use domain::{AuthService, CatalogService, JwtIssuer, OrderService, PasswordHasher};
use payments::{
    CheckoutConfig, GatewayError, InMemoryGateway, PaymentGateway, PaymentService,
    RazorpayConfig, RazorpayGateway,
};
use store::Store;

use crate::config::Config;
use crate::media::MediaStorage;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: S,
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S>,
    pub auth: AuthService<S>,
    pub payments: PaymentService<S>,
    pub analytics: AnalyticsService<S>,
    pub media: MediaStorage,
}

impl<S: Store + Clone> AppState<S> {
    /// Wires every service over one store.
    pub fn new(
        store: S,
        config: &Config,
        gateway: Arc<dyn PaymentGateway>,
        hasher: PasswordHasher,
    ) -> Self {
        let tokens = JwtIssuer::new(
            config.jwt_secret.as_bytes(),
            to_chrono(config.access_token_ttl),
            to_chrono(config.refresh_token_ttl),
        );
        let checkout = CheckoutConfig {
            display_name: config.store_display_name.clone(),
        };

        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            auth: AuthService::new(store.clone(), Arc::new(tokens), hasher),
            payments: PaymentService::new(store.clone(), gateway, checkout),
            analytics: AnalyticsService::new(store.clone(), config.low_stock_threshold),
            media: MediaStorage::new(&config.media_root),
            store,
        }
    }
}

/// Picks the payment gateway: Razorpay when credentials are configured,
/// otherwise the in-memory gateway.
pub fn create_gateway(config: &Config) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
    match &config.razorpay {
        Some(credentials) => {
            let razorpay = RazorpayConfig::new(&credentials.key_id, &credentials.key_secret)
                .with_api_base(&config.razorpay_api_base)
                .with_timeout(config.gateway_timeout);
            Ok(Arc::new(RazorpayGateway::new(razorpay)?))
        }
        None => Ok(Arc::new(InMemoryGateway::default())),
    }
}

fn to_chrono(ttl: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365))
}
