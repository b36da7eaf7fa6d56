/// Sentinel returned for any code missing from a label table.
pub const UNKNOWN_LABEL: &str = "Unknown";

const CLEANING_QUALITY_LABELS: &[(&str, &str)] = &[
    ("1", "Very Satisfied 🎉"),
    ("2", "Satisfied 😊"),
    ("3", "Neutral 😐"),
    ("4", "Unsatisfied 😕"),
];

const TURNAROUND_LABELS: &[(&str, &str)] = &[
    ("1", "🚀 Faster than expected"),
    ("2", "⏳ Just right"),
    ("3", "🐢 Took too long"),
];

const CUSTOMER_SERVICE_LABELS: &[(&str, &str)] = &[
    ("1", "Friendly & Helpful 😊"),
    ("2", "Okay, but can improve 🤔"),
    ("3", "Not Satisfied 😡"),
];

/// Survey questions whose answers arrive as option codes.
///
/// ```
/// use care_core::LabelCategory;
///
/// assert_eq!(LabelCategory::Turnaround.resolve("2"), "⏳ Just right");
/// assert_eq!(LabelCategory::Turnaround.resolve("9"), "Unknown");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelCategory {
    CleaningQuality,
    Turnaround,
    CustomerService,
}

impl LabelCategory {
    pub const ALL: [LabelCategory; 3] = [
        LabelCategory::CleaningQuality,
        LabelCategory::Turnaround,
        LabelCategory::CustomerService,
    ];

    /// Code to label pairs for this category.
    pub fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            LabelCategory::CleaningQuality => CLEANING_QUALITY_LABELS,
            LabelCategory::Turnaround => TURNAROUND_LABELS,
            LabelCategory::CustomerService => CUSTOMER_SERVICE_LABELS,
        }
    }

    /// Display string for `code`, or [`UNKNOWN_LABEL`] when the table has no entry.
    pub fn resolve(self, code: &str) -> &'static str {
        self.table()
            .iter()
            .find(|(key, _)| *key == code)
            .map(|(_, label)| *label)
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// Same as [`resolve`](Self::resolve) for an answer that may be absent.
    pub fn resolve_opt(self, code: Option<&str>) -> &'static str {
        code.map(|c| self.resolve(c)).unwrap_or(UNKNOWN_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_code_resolves() {
        assert_eq!(LabelCategory::CleaningQuality.resolve("1"), "Very Satisfied 🎉");
        assert_eq!(LabelCategory::CleaningQuality.resolve("2"), "Satisfied 😊");
        assert_eq!(LabelCategory::CleaningQuality.resolve("3"), "Neutral 😐");
        assert_eq!(LabelCategory::CleaningQuality.resolve("4"), "Unsatisfied 😕");
        assert_eq!(LabelCategory::Turnaround.resolve("1"), "🚀 Faster than expected");
        assert_eq!(LabelCategory::Turnaround.resolve("2"), "⏳ Just right");
        assert_eq!(LabelCategory::Turnaround.resolve("3"), "🐢 Took too long");
        assert_eq!(LabelCategory::CustomerService.resolve("1"), "Friendly & Helpful 😊");
        assert_eq!(
            LabelCategory::CustomerService.resolve("2"),
            "Okay, but can improve 🤔"
        );
        assert_eq!(LabelCategory::CustomerService.resolve("3"), "Not Satisfied 😡");
    }

    #[test]
    fn unknown_codes_resolve_to_sentinel() {
        for category in LabelCategory::ALL {
            for code in ["", "0", "5", "01", " 1", "one", "Very Satisfied 🎉"] {
                assert_eq!(category.resolve(code), UNKNOWN_LABEL, "{category:?} {code:?}");
            }
            assert_eq!(category.resolve_opt(None), UNKNOWN_LABEL);
        }
        // service and turnaround tables stop at 3
        assert_eq!(LabelCategory::Turnaround.resolve("4"), UNKNOWN_LABEL);
        assert_eq!(LabelCategory::CustomerService.resolve("4"), UNKNOWN_LABEL);
    }

    #[test]
    fn tables_have_unique_codes() {
        for category in LabelCategory::ALL {
            let table = category.table();
            for (idx, (code, _)) in table.iter().enumerate() {
                assert!(
                    table[idx + 1..].iter().all(|(other, _)| other != code),
                    "duplicate code {code} in {category:?}"
                );
            }
        }
    }
}
