use askama::Template;

use crate::contracts::types::{PriceCreepRow, RecurringRow, TrialToPaidRow};
use crate::{ClientError, ClientResult};

pub(crate) struct ReportInput<'a> {
    pub(crate) account: &'a str,
    pub(crate) generated_at: &'a str,
    pub(crate) policy_version: &'a str,
    pub(crate) recurring: &'a [RecurringRow],
    pub(crate) price_creep: &'a [PriceCreepRow],
    pub(crate) trial_to_paid: &'a [TrialToPaidRow],
}

struct Section {
    title: &'static str,
    badge: &'static str,
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

/// Page model for `templates/report.html`. Askama escapes every value
/// interpolated into it.
#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    account: &'a str,
    generated_at: &'a str,
    policy_version: &'a str,
    sections: [Section; 3],
}

/// Renders a standalone HTML page.
pub(crate) fn render_report(input: &ReportInput<'_>) -> ClientResult<String> {
    let sections = [
        Section {
            title: "Monthly recurring candidates",
            badge: "Subscriptions",
            headers: &["merchant", "count", "typical_amount", "last_date"],
            rows: input
                .recurring
                .iter()
                .map(|row| {
                    vec![
                        row.merchant.clone(),
                        row.count.to_string(),
                        format!("{:.2}", row.typical_amount),
                        row.last_date.clone(),
                    ]
                })
                .collect(),
        },
        Section {
            title: "Price creep candidates",
            badge: "Increases",
            headers: &["merchant", "old_median", "new_median", "increase_pct"],
            rows: input
                .price_creep
                .iter()
                .map(|row| {
                    vec![
                        row.merchant.clone(),
                        format!("{:.2}", row.old_median),
                        format!("{:.2}", row.new_median),
                        format!("{:.1}%", row.increase_pct),
                    ]
                })
                .collect(),
        },
        Section {
            title: "Trial \u{2192} paid candidates",
            badge: "Conversions",
            headers: &[
                "merchant",
                "trial_date",
                "trial_amount",
                "paid_date",
                "paid_amount",
                "days_between",
            ],
            rows: input
                .trial_to_paid
                .iter()
                .map(|row| {
                    vec![
                        row.merchant.clone(),
                        row.trial_date.clone(),
                        format!("{:.2}", row.trial_amount),
                        row.paid_date.clone(),
                        format!("{:.2}", row.paid_amount),
                        row.days_between.to_string(),
                    ]
                })
                .collect(),
        },
    ];

    let page = ReportPage {
        account: input.account,
        generated_at: input.generated_at,
        policy_version: input.policy_version,
        sections,
    };
    page.render().map_err(|error| ClientError::internal_serialization(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::contracts::types::{PriceCreepRow, RecurringRow};

    use super::{ReportInput, render_report};

    #[test]
    fn report_escapes_account_and_merchants() {
        let recurring = vec![RecurringRow {
            merchant: "<script>".to_string(),
            count: 3,
            typical_amount: 9.5,
            last_date: "2026-03-01".to_string(),
        }];
        let rendered = render_report(&ReportInput {
            account: "joint & \"family\"",
            generated_at: "2026-03-02 10:00",
            policy_version: "leaks/v1",
            recurring: &recurring,
            price_creep: &[],
            trial_to_paid: &[],
        });

        assert!(rendered.is_ok());
        if let Ok(html) = rendered {
            assert!(!html.contains("<script>"));
            assert!(html.contains("&lt;script&gt;"));
            assert!(html.contains("joint &amp; &quot;family&quot;"));
            assert!(!html.contains("joint & \"family\""));
            assert!(html.contains("<td>9.50</td>"));
        }
    }

    #[test]
    fn empty_sections_say_none_found() {
        let creep = vec![PriceCreepRow {
            merchant: "Music".to_string(),
            old_median: 10.0,
            new_median: 11.01,
            increase_pct: 10.1,
        }];
        let rendered = render_report(&ReportInput {
            account: "default",
            generated_at: "2026-03-02 10:00",
            policy_version: "leaks/v1",
            recurring: &[],
            price_creep: &creep,
            trial_to_paid: &[],
        });

        assert!(rendered.is_ok());
        if let Ok(html) = rendered {
            assert_eq!(html.matches("None found.").count(), 2);
            assert!(html.contains("<td>10.1%</td>"));
            assert!(html.contains("<th>increase_pct</th>"));
            assert!(html.starts_with("<!doctype html>"));
        }
    }
}
