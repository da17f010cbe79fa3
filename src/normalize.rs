use crate::{
    error::{LedgerError, Result},
    models::{BankFacts, CategoryPercent},
};

pub const MIN_PERCENT: f64 = 0.0;
pub const MAX_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFact {
    pub bank: String,
    pub category: String,
    pub percent: f64,
}

pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn required_name(raw: &str, what: &str) -> Result<String> {
    let name = normalize_name(raw);
    if name.is_empty() {
        return Err(LedgerError::invalid_argument(format!(
            "{what} name cannot be empty"
        )));
    }
    Ok(name)
}

pub fn check_percent(percent: f64, category: &str) -> Result<()> {
    if !percent.is_finite() || !(MIN_PERCENT..=MAX_PERCENT).contains(&percent) {
        return Err(LedgerError::invalid_argument(format!(
            "percent must be between {MIN_PERCENT} and {MAX_PERCENT} for category {category:?}, got {percent}"
        )));
    }
    Ok(())
}

pub fn validate_facts(banks: &[BankFacts]) -> Result<Vec<NormalizedFact>> {
    let mut facts = Vec::new();
    for entry in banks {
        let bank = required_name(&entry.name, "bank")?;
        for (category, percent) in validate_categories(&bank, &entry.categories)? {
            facts.push(NormalizedFact {
                bank: bank.clone(),
                category,
                percent,
            });
        }
    }
    Ok(facts)
}

pub fn validate_categories(bank: &str, categories: &[CategoryPercent]) -> Result<Vec<(String, f64)>> {
    if categories.is_empty() {
        return Err(LedgerError::invalid_argument(format!(
            "bank {bank:?} must have at least one category"
        )));
    }

    categories
        .iter()
        .map(|entry| {
            let category = required_name(&entry.name, "category").map_err(|_| {
                LedgerError::invalid_argument(format!(
                    "category name cannot be empty for bank {bank:?}"
                ))
            })?;
            check_percent(entry.percent, &category)?;
            Ok((category, entry.percent))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_exotic_whitespace() {
        assert_eq!(normalize_name("  Tinkoff\u{a0}\u{a0}Black \t"), "Tinkoff Black");
        assert_eq!(normalize_name("Sber\u{0}\u{7}"), "Sber");
        assert_eq!(normalize_name("Аптеки"), "Аптеки");
        assert_eq!(normalize_name("\u{a0} \n"), "");
    }

    #[test]
    fn validate_flattens_in_submission_order() {
        let facts = validate_facts(&[
            BankFacts::new(" Sber ", [("Taxi", 10.0), ("Pharmacy", 5.0)]),
            BankFacts::new("Tinkoff", [("Taxi", 3.0)]),
        ])
        .expect("valid");

        let triples: Vec<_> = facts
            .iter()
            .map(|f| (f.bank.as_str(), f.category.as_str(), f.percent))
            .collect();
        assert_eq!(
            triples,
            vec![
                ("Sber", "Taxi", 10.0),
                ("Sber", "Pharmacy", 5.0),
                ("Tinkoff", "Taxi", 3.0),
            ]
        );
    }

    #[test]
    fn validate_rejects_bad_input() {
        let cases = vec![
            BankFacts::new("  ", [("Taxi", 1.0)]),
            BankFacts::new("Sber", Vec::<(String, f64)>::new()),
            BankFacts::new("Sber", [("\u{a0}", 1.0)]),
            BankFacts::new("Sber", [("Taxi", 150.0)]),
            BankFacts::new("Sber", [("Taxi", -0.5)]),
            BankFacts::new("Sber", [("Taxi", f64::NAN)]),
        ];
        for case in cases {
            let err = validate_facts(&[BankFacts::new("Ok", [("Fine", 1.0)]), case.clone()])
                .expect_err("must reject");
            assert_eq!(err.code(), "INVALID_ARGUMENT", "{case:?}");
        }
    }

    #[test]
    fn percent_bounds_are_inclusive() {
        assert!(check_percent(0.0, "x").is_ok());
        assert!(check_percent(100.0, "x").is_ok());
        assert!(check_percent(100.01, "x").is_err());
    }
}
