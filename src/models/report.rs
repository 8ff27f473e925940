use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Month names for report display, indexed by month number - 1.
const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// A monthly canteen report for one school.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub id: i64,
    #[serde(rename = "schoolId")]
    pub school_id: Option<i64>,
    #[serde(rename = "schoolName")]
    pub school_name: Option<String>,
    pub year: i32,
    pub month: u32,
    #[serde(rename = "mealsServed")]
    pub meals_served: Option<i64>,
    #[serde(rename = "studentsEnrolled")]
    pub students_enrolled: Option<i64>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl MonthlyReport {
    /// "March 2026" style label; out-of-range months fall back to the
    /// raw number rather than panicking on bad server data.
    pub fn month_display(&self) -> String {
        match MONTH_NAMES.get(self.month.wrapping_sub(1) as usize) {
            Some(name) => format!("{} {}", name, self.year),
            None => format!("{}/{}", self.month, self.year),
        }
    }

    pub fn school_display(&self) -> String {
        self.school_name
            .clone()
            .unwrap_or_else(|| match self.school_id {
                Some(id) => format!("School {}", id),
                None => "-".to_string(),
            })
    }
}

/// One page of the paginated `/reports/monthly` listing.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReportPage {
    #[serde(default, alias = "data", alias = "items")]
    pub reports: Vec<MonthlyReport>,
    #[serde(default, alias = "totalCount")]
    pub total: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
}

impl ReportPage {
    pub fn has_more(&self) -> bool {
        self.offset + (self.reports.len() as i64) < self.total
    }

    /// 1-based page number for the status line.
    pub fn page_number(&self) -> i64 {
        if self.limit <= 0 {
            1
        } else {
            self.offset / self.limit + 1
        }
    }

    pub fn page_count(&self) -> i64 {
        if self.limit <= 0 || self.total <= 0 {
            1
        } else {
            (self.total + self.limit - 1) / self.limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_page() {
        let json = r#"{
            "items": [
                {"id": 10, "schoolId": 7, "schoolName": "Scuola Primaria Nord",
                 "year": 2026, "month": 3, "mealsServed": 2310,
                 "studentsEnrolled": 118, "submittedAt": "2026-04-02T09:00:00Z"},
                {"id": 11, "schoolId": 8, "year": 2026, "month": 13}
            ],
            "totalCount": 40,
            "offset": 0,
            "limit": 2
        }"#;

        let page: ReportPage = serde_json::from_str(json).expect("Failed to parse report page");
        assert_eq!(page.reports.len(), 2);
        assert_eq!(page.total, 40);
        assert!(page.has_more());
        assert_eq!(page.reports[0].month_display(), "March 2026");
        assert_eq!(page.reports[0].school_display(), "Scuola Primaria Nord");
        // Bad month number from the server must not panic
        assert_eq!(page.reports[1].month_display(), "13/2026");
        assert_eq!(page.reports[1].school_display(), "School 8");
    }

    #[test]
    fn test_page_numbers() {
        let page = ReportPage {
            reports: Vec::new(),
            total: 45,
            offset: 20,
            limit: 10,
        };
        assert_eq!(page.page_number(), 3);
        assert_eq!(page.page_count(), 5);

        // Degenerate limit never divides by zero
        let empty = ReportPage::default();
        assert_eq!(empty.page_number(), 1);
        assert_eq!(empty.page_count(), 1);
    }
}
