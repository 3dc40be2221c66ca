pub mod payment;
pub mod stripe;

pub use payment::{to_minor_units, PaymentService};
pub use stripe::{ChargeGateway, StripeClient};
