use bigdecimal::BigDecimal;
use uuid::Uuid;

/// How an offering is priced by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingStrategy {
    /// Price is independent of size.
    Fixed { base_price: BigDecimal },
    /// Price is computed from length × width (square meters).
    DimensionBased {
        price_per_square_meter: BigDecimal,
        minimum_price: Option<BigDecimal>,
    },
}

impl PricingStrategy {
    pub fn kind(&self) -> PricingKind {
        match self {
            PricingStrategy::Fixed { .. } => PricingKind::Fixed,
            PricingStrategy::DimensionBased { .. } => PricingKind::DimensionBased,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingKind {
    Fixed,
    DimensionBased,
}

impl PricingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingKind::Fixed => "fixed",
            PricingKind::DimensionBased => "dimension_based",
        }
    }
}

/// A sellable (product type × action) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offering {
    pub id: Uuid,
    pub product_type_id: Uuid,
    pub action_id: Uuid,
    pub pricing: PricingStrategy,
}

impl Offering {
    pub fn kind(&self) -> PricingKind {
        self.pricing.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductType {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAction {
    pub id: Uuid,
    pub name: String,
}
