//! Pure aggregation of eligible sales into payout totals.

use crate::domain::{
    is_eligible, Currency, PartnerId, PartnerProfile, Sale, SaleType, SaleTypeBreakdown, TimeMs,
};

/// Result of aggregating one partner's eligible sales at a point in time.
///
/// Carries the exact sale-id set so the writer can perform the matching
/// state transition, plus the partner name/coupon snapshots the request
/// row denormalizes for audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub partner_id: PartnerId,
    pub partner_name: String,
    pub partner_coupon: String,
    /// Overall commission owed across all eligible sales, minor units.
    pub total_commission_amount: i64,
    pub subscription: SaleTypeBreakdown,
    pub credit_pack: SaleTypeBreakdown,
    pub sales_count: i64,
    pub currency: Currency,
    /// Ids of the aggregated sales, sorted ascending.
    pub sale_ids: Vec<String>,
}

/// Aggregate the eligible subset of `sales` for `profile` at `now`.
///
/// Returns `None` when no sale is eligible. Deterministic: sales are
/// ordered by `(created_at, id)` before the currency is taken from the
/// first eligible member, and the returned id set is sorted.
pub fn aggregate_eligible(
    profile: &PartnerProfile,
    sales: &[Sale],
    now: TimeMs,
) -> Option<Aggregation> {
    let mut eligible: Vec<&Sale> = sales.iter().filter(|s| is_eligible(s, now)).collect();
    if eligible.is_empty() {
        return None;
    }
    eligible.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

    let mut subscription = SaleTypeBreakdown::default();
    let mut credit_pack = SaleTypeBreakdown::default();
    let mut total = 0i64;
    let mut sale_ids = Vec::with_capacity(eligible.len());

    for sale in &eligible {
        let bucket = match sale.sale_type {
            SaleType::Subscription => &mut subscription,
            SaleType::CreditPack => &mut credit_pack,
        };
        bucket.count += 1;
        bucket.commission_amount += sale.commission_amount;
        total += sale.commission_amount;
        sale_ids.push(sale.id.clone());
    }

    sale_ids.sort();

    Some(Aggregation {
        partner_id: profile.id.clone(),
        partner_name: profile.display_name.clone(),
        partner_coupon: profile.coupon_code.clone(),
        total_commission_amount: total,
        subscription,
        credit_pack,
        sales_count: eligible.len() as i64,
        currency: eligible[0].currency.clone(),
        sale_ids,
    })
}
