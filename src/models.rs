use serde::{Deserialize, Serialize};

use crate::{identity::UserId, month::YearMonth};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashbackCategory {
    pub category: Category,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankWithCategories {
    pub bank: Bank,
    pub categories: Vec<CashbackCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashbackMonthView {
    pub month: YearMonth,
    #[serde(skip)]
    pub user_id: UserId,
    pub banks: Vec<BankWithCategories>,
}

impl CashbackMonthView {
    pub fn fact_count(&self) -> usize {
        self.banks.iter().map(|b| b.categories.len()).sum()
    }

    pub fn facts(&self) -> Vec<(String, String, f64)> {
        self.banks
            .iter()
            .flat_map(|b| {
                b.categories
                    .iter()
                    .map(|c| (b.bank.name.clone(), c.category.name.clone(), c.percent))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankFacts {
    pub name: String,
    pub categories: Vec<CategoryPercent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPercent {
    pub name: String,
    pub percent: f64,
}

impl BankFacts {
    pub fn new<B, I, C>(bank: B, categories: I) -> Self
    where
        B: Into<String>,
        I: IntoIterator<Item = (C, f64)>,
        C: Into<String>,
    {
        Self {
            name: bank.into(),
            categories: categories
                .into_iter()
                .map(|(name, percent)| CategoryPercent::new(name, percent))
                .collect(),
        }
    }
}

impl CategoryPercent {
    pub fn new(name: impl Into<String>, percent: f64) -> Self {
        Self {
            name: name.into(),
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn month_view_serializes_without_ids() {
        let view = CashbackMonthView {
            month: YearMonth::parse("2024-06").expect("month"),
            user_id: UserId::new(42).expect("user"),
            banks: vec![BankWithCategories {
                bank: Bank {
                    id: 7,
                    name: "Sber".into(),
                },
                categories: vec![CashbackCategory {
                    category: Category {
                        id: 3,
                        name: "Taxi".into(),
                    },
                    percent: 10.0,
                }],
            }],
        };

        let value = serde_json::to_value(&view).expect("json");
        assert_eq!(
            value,
            json!({
                "month": "2024-06",
                "banks": [{
                    "bank": { "name": "Sber" },
                    "categories": [{ "category": { "name": "Taxi" }, "percent": 10.0 }]
                }]
            })
        );
        assert_eq!(view.fact_count(), 1);
    }

    #[test]
    fn bank_facts_accept_request_shape() {
        let facts: BankFacts = serde_json::from_value(json!({
            "name": "Tinkoff",
            "categories": [{ "name": "Pharmacy", "percent": 5 }]
        }))
        .expect("json");
        assert_eq!(facts, BankFacts::new("Tinkoff", [("Pharmacy", 5.0)]));
    }
}
