use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::line_item::{ItemId, LineItem, Resolution};
use crate::domain::offering::Offering;

/// Offerings keyed by (product type, action), built once per catalog load.
///
/// A key claimed by more than one offering is ambiguous and never resolves.
#[derive(Debug, Default)]
pub struct OfferingIndex {
    by_key: HashMap<(Uuid, Uuid), Option<Arc<Offering>>>,
}

impl OfferingIndex {
    pub fn build<I>(offerings: I) -> Self
    where
        I: IntoIterator<Item = Arc<Offering>>,
    {
        let mut by_key = HashMap::new();
        for offering in offerings {
            let key = (offering.product_type_id, offering.action_id);
            by_key
                .entry(key)
                .and_modify(|slot: &mut Option<Arc<Offering>>| {
                    log::warn!(
                        "Ambiguous offerings for product type {} / action {}",
                        key.0,
                        key.1
                    );
                    *slot = None;
                })
                .or_insert(Some(offering));
        }
        Self { by_key }
    }

    pub fn lookup(&self, product_type_id: Uuid, action_id: Uuid) -> Option<&Arc<Offering>> {
        self.by_key
            .get(&(product_type_id, action_id))
            .and_then(Option::as_ref)
    }

    fn offering_for(&self, item: &LineItem) -> Option<&Arc<Offering>> {
        self.lookup(item.product_type_id()?, item.action_id()?)
    }
}

/// Matching offering (or none) for every item.
pub fn resolve(
    items: &[LineItem],
    index: &OfferingIndex,
) -> HashMap<ItemId, Option<Arc<Offering>>> {
    items
        .iter()
        .map(|item| (item.id(), index.offering_for(item).cloned()))
        .collect()
}

/// Turn a lookup result into the item's resolution. No offering is a miss
/// only once both selections are made.
pub fn classify(item: &LineItem, offering: Option<Arc<Offering>>) -> Resolution {
    match offering {
        Some(offering) => Resolution::Resolved(offering),
        None if item.product_type_id().is_some() && item.action_id().is_some() => {
            Resolution::NoMatch
        }
        None => Resolution::Unselected,
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::offering::PricingStrategy;
    use crate::domain::order::{Edit, OrderDraft};

    fn offering(product_type_id: Uuid, action_id: Uuid) -> Arc<Offering> {
        Arc::new(Offering {
            id: Uuid::new_v4(),
            product_type_id,
            action_id,
            pricing: PricingStrategy::Fixed {
                base_price: BigDecimal::from(12),
            },
        })
    }

    fn draft_selecting(product_type_id: Option<Uuid>, action_id: Option<Uuid>) -> OrderDraft {
        let mut draft = OrderDraft::new();
        let item_id = draft.apply(Edit::AddItem).unwrap().added.unwrap();
        draft
            .apply(Edit::SetProductType {
                item_id,
                product_type_id,
            })
            .unwrap();
        draft.apply(Edit::SetAction { item_id, action_id }).unwrap();
        draft
    }

    #[test]
    fn resolves_unique_match() {
        let (rug, wash) = (Uuid::new_v4(), Uuid::new_v4());
        let wanted = offering(rug, wash);
        let index = OfferingIndex::build(vec![wanted.clone(), offering(rug, Uuid::new_v4())]);
        let draft = draft_selecting(Some(rug), Some(wash));

        let resolved = resolve(draft.items(), &index);
        let item_id = draft.items()[0].id();
        assert_eq!(resolved[&item_id].as_ref().map(|o| o.id), Some(wanted.id));
    }

    #[test]
    fn ambiguous_key_resolves_to_none() {
        let (rug, wash) = (Uuid::new_v4(), Uuid::new_v4());
        let index = OfferingIndex::build(vec![
            offering(rug, wash),
            offering(rug, wash),
            offering(rug, wash),
        ]);
        let draft = draft_selecting(Some(rug), Some(wash));
        let item = &draft.items()[0];

        let offering = resolve(draft.items(), &index).remove(&item.id()).flatten();
        assert!(offering.is_none());
        assert_eq!(classify(item, offering), Resolution::NoMatch);
    }

    #[test]
    fn missing_selection_is_unselected_not_a_miss() {
        let index = OfferingIndex::build(vec![offering(Uuid::new_v4(), Uuid::new_v4())]);
        let draft = draft_selecting(Some(Uuid::new_v4()), None);

        assert!(resolve(draft.items(), &index)
            .values()
            .all(|o| o.is_none()));
        assert_eq!(classify(&draft.items()[0], None), Resolution::Unselected);
    }
}
