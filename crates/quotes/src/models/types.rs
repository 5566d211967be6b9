use std::borrow::Cow;

use uuid::Uuid;

/// Provider identifier - mostly static constants
pub type ProviderId = Cow<'static, str>;

/// Identity of a single quote instance, assigned when the registry accepts it
pub type QuoteId = Uuid;

/// Currency code (e.g. "BTC", "iso:USD")
pub type CurrencyCode = Cow<'static, str>;

/// Ramp payment method discovered at runtime (e.g. "credit", "sepa", "applepay")
pub type PaymentType = String;
