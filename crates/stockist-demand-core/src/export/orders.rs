//! Purchase-order export, one order per resolved stockist group.

use serde::{Deserialize, Serialize};

use crate::models::{ResolutionResult, Stockist, UNMATCHED};
use crate::resolver::fields::{self, FieldAliases};

/// A single line on a stockist's purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    pub demand_line_id: String,
    /// Text the user typed
    pub requested: String,
    /// Medicine display name (the requested text for name-only matches)
    pub medicine: String,
    pub medicine_id: Option<String>,
    pub quantity: u32,
    /// False for inventory-only matches with no medicine record
    pub canonical: bool,
}

/// Purchase order for one stockist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    /// Group key (stockist display name)
    pub stockist: String,
    pub stockist_id: Option<String>,
    pub phone: Option<String>,
    pub lines: Vec<PurchaseOrderLine>,
}

/// Demand line no stockist could supply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedLine {
    pub demand_line_id: String,
    pub requested: String,
    pub quantity: u32,
}

/// All purchase orders from one resolution result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderBatch {
    /// Export timestamp
    pub exported_at: String,
    pub orders: Vec<PurchaseOrder>,
    pub unmatched: Vec<UnmatchedLine>,
    /// Total order line count across stockists
    pub total_lines: usize,
}

impl PurchaseOrderBatch {
    /// Build orders from a result, looking stockist details up by group key.
    pub fn from_result(
        result: &ResolutionResult,
        stockists: &[Stockist],
        aliases: &FieldAliases,
    ) -> Self {
        let mut orders = Vec::new();
        let mut unmatched = Vec::new();

        for group in result.iter() {
            if group.key == UNMATCHED {
                unmatched.extend(group.entries.iter().map(|entry| UnmatchedLine {
                    demand_line_id: entry.demand_line.id.clone(),
                    requested: entry.demand_line.name.clone(),
                    quantity: entry.demand_line.quantity,
                }));
                continue;
            }

            let stockist = stockists
                .iter()
                .find(|s| fields::stockist_label(s, aliases) == group.key);

            let lines = group
                .entries
                .iter()
                .map(|entry| {
                    let requested = entry.demand_line.query().to_string();
                    let (medicine, medicine_id, canonical) = match &entry.medicine {
                        Some(m) => (
                            m.display_name(aliases).unwrap_or_else(|| requested.clone()),
                            m.id(aliases),
                            m.is_canonical(),
                        ),
                        None => (requested.clone(), None, false),
                    };
                    PurchaseOrderLine {
                        demand_line_id: entry.demand_line.id.clone(),
                        requested,
                        medicine,
                        medicine_id,
                        quantity: entry.quantity.unwrap_or(entry.demand_line.quantity),
                        canonical,
                    }
                })
                .collect();

            orders.push(PurchaseOrder {
                stockist: group.key.clone(),
                stockist_id: stockist.and_then(|s| fields::record_id(s.fields(), aliases)),
                phone: stockist.and_then(|s| fields::stockist_phone(s, aliases)),
                lines,
            });
        }

        let total_lines = orders.iter().map(|o: &PurchaseOrder| o.lines.len()).sum();

        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            orders,
            unmatched,
            total_lines,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format. Unmatched lines are listed last under the `unmatched` key.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str("stockist,stockist_id,phone,demand_line_id,requested,medicine,medicine_id,quantity,canonical\n");

        for order in &self.orders {
            for line in &order.lines {
                csv.push_str(&format!(
                    "{},{},{},{},{},{},{},{},{}\n",
                    escape_csv(&order.stockist),
                    escape_csv(order.stockist_id.as_deref().unwrap_or("")),
                    escape_csv(order.phone.as_deref().unwrap_or("")),
                    escape_csv(&line.demand_line_id),
                    escape_csv(&line.requested),
                    escape_csv(&line.medicine),
                    escape_csv(line.medicine_id.as_deref().unwrap_or("")),
                    line.quantity,
                    line.canonical,
                ));
            }
        }

        for line in &self.unmatched {
            csv.push_str(&format!(
                "{},,,{},{},,,{},false\n",
                UNMATCHED,
                escape_csv(&line.demand_line_id),
                escape_csv(&line.requested),
                line.quantity,
            ));
        }

        csv
    }
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DemandLine, MatchedMedicine, Medicine, ResolutionEntry};
    use serde_json::json;

    fn make_result() -> (ResolutionResult, Vec<Stockist>) {
        let para = DemandLine::with_id("l1", "Paracetamol", 10);
        let xanax = DemandLine::with_id("l2", "Xanax", 2);
        let unknown = DemandLine::with_id("l3", "zzz", 1);

        let medicine = Medicine::from_value(json!({"_id": "m1", "name": "Paracetamol"}));

        let mut result = ResolutionResult::new();
        result.push(
            "City Pharma",
            ResolutionEntry::available(&para, MatchedMedicine::Canonical(medicine)),
        );
        result.push(
            "Night, Chemist",
            ResolutionEntry::available(&xanax, MatchedMedicine::named("Xanax")),
        );
        result.push(UNMATCHED, ResolutionEntry::unmatched(&unknown));

        let stockists = vec![
            Stockist::from_value(json!({"_id": "s1", "title": "City Pharma", "phone": "555-0100"})),
            Stockist::from_value(json!({"_id": "s2", "name": "Night, Chemist"})),
        ];
        (result, stockists)
    }

    #[test]
    fn test_orders_from_result() {
        let (result, stockists) = make_result();
        let batch = PurchaseOrderBatch::from_result(&result, &stockists, &FieldAliases::default());

        assert_eq!(batch.orders.len(), 2);
        assert_eq!(batch.total_lines, 2);

        let city = &batch.orders[0];
        assert_eq!(city.stockist, "City Pharma");
        assert_eq!(city.stockist_id.as_deref(), Some("s1"));
        assert_eq!(city.phone.as_deref(), Some("555-0100"));
        assert_eq!(city.lines[0].medicine_id.as_deref(), Some("m1"));
        assert!(city.lines[0].canonical);
        assert_eq!(city.lines[0].quantity, 10);

        let night = &batch.orders[1];
        assert!(night.phone.is_none());
        assert!(!night.lines[0].canonical);
        assert_eq!(night.lines[0].medicine, "Xanax");

        assert_eq!(batch.unmatched.len(), 1);
        assert_eq!(batch.unmatched[0].requested, "zzz");
    }

    #[test]
    fn test_csv_export() {
        let (result, stockists) = make_result();
        let batch = PurchaseOrderBatch::from_result(&result, &stockists, &FieldAliases::default());
        let csv = batch.to_csv();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("stockist,"));
        assert_eq!(lines[1], "City Pharma,s1,555-0100,l1,Paracetamol,Paracetamol,m1,10,true");
        assert!(lines[2].starts_with("\"Night, Chemist\",s2,"));
        assert_eq!(lines[3], "unmatched,,,l3,zzz,,,1,false");
    }

    #[test]
    fn test_json_export() {
        let (result, stockists) = make_result();
        let batch = PurchaseOrderBatch::from_result(&result, &stockists, &FieldAliases::default());
        let json = batch.to_json().unwrap();

        let parsed: PurchaseOrderBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, batch);
        assert!(json.contains("\"demandLineId\""));
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
