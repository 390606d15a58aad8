//! Plain-text rendering of list pages and dashboard widgets

use sdrcrm_core::types::stage::Stage;
use sdrcrm_core::types::{Deal, Lead, MasterRecord, Task, Ticket, User};
use sdrcrm_core::utils::{format_inr, format_inr_compact};
use sdrcrm_views::dashboard::widgets::{self, Ranking};
use sdrcrm_views::{DashboardSnapshot, ListView, MiniPagination, WidgetState};
use std::fmt::Write;

/// Columns of a record in list output
pub(crate) trait Row {
    /// Column titles
    const HEADERS: &'static [&'static str];

    /// Cell values, one per header
    fn cells(&self) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

const fn active_label(active: bool) -> &'static str {
    if active { "yes" } else { "no" }
}

impl Row for Deal {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "COMPANY", "STAGE", "VALUE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.company.clone(),
            self.stage.label().to_string(),
            format_inr(self.value),
        ]
    }
}

impl Row for Lead {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "COMPANY", "STAGE", "SOURCE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.company.clone(),
            or_dash(Some(self.stage.as_str())),
            or_dash(self.source.as_deref()),
        ]
    }
}

impl Row for Task {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "STATUS", "DUE", "ASSIGNED"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.status.to_string(),
            self.due_date.map_or_else(|| "-".to_string(), |d| d.to_string()),
            or_dash(self.assigned_to.as_deref()),
        ]
    }
}

impl Row for Ticket {
    const HEADERS: &'static [&'static str] = &["ID", "SUBJECT", "CUSTOMER", "STATUS", "PRIORITY"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.subject.clone(),
            or_dash(self.customer.as_deref()),
            or_dash(Some(self.status.as_str())),
            or_dash(self.priority.as_deref()),
        ]
    }
}

impl Row for User {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "EMAIL", "ROLE", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.role.clone(),
            active_label(self.is_active).to_string(),
        ]
    }
}

impl Row for MasterRecord {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "CODE", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            or_dash(self.code.as_deref()),
            active_label(self.is_active).to_string(),
        ]
    }
}

fn line<S: AsRef<str>>(cells: impl Iterator<Item = S>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Left-aligned table with a header line
pub(crate) fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = line(headers.iter(), &widths);
    for row in rows {
        out.push('\n');
        out.push_str(&line(row.iter(), &widths));
    }
    out
}

fn page_footer(pagination: &MiniPagination, matching: usize) -> String {
    format!(
        "page {}/{} ({matching} matching)",
        pagination.page(),
        pagination.total_pages()
    )
}

/// Text for one state of a list page
pub(crate) fn list<T: Row>(view: &ListView<'_, T>, noun: &str) -> String {
    match view {
        ListView::Loading => "Loading...".to_string(),
        ListView::Error(message) => format!("Failed to load {noun}: {message}"),
        ListView::Empty => format!("No {noun} yet."),
        ListView::NoResults => format!("No {noun} match the current filters."),
        ListView::Rows {
            rows,
            matching,
            pagination,
        } => {
            let cells: Vec<Vec<String>> = rows.iter().map(|r| r.cells()).collect();
            format!(
                "{}\n\n{}",
                table(T::HEADERS, &cells),
                page_footer(pagination, *matching)
            )
        }
    }
}

fn section<T>(out: &mut String, title: &str, state: &WidgetState<T>, body: impl FnOnce(&T) -> String) {
    let _ = writeln!(out, "== {title} ==");
    match state {
        WidgetState::Ready(view) => {
            let _ = writeln!(out, "{}", body(view));
        }
        WidgetState::NoData => {
            let _ = writeln!(out, "No data available");
        }
    }
    out.push('\n');
}

fn change_label(change: i64) -> String {
    if change >= 0 {
        format!("+{change}%")
    } else {
        format!("{change}%")
    }
}

/// Every dashboard widget as text, top lists paged at `page_size`
pub(crate) fn dashboard(snapshot: &DashboardSnapshot, page_size: usize) -> String {
    let mut out = String::new();

    section(&mut out, "Overview", &widgets::kpi_cards(snapshot), |cards| {
        let rows: Vec<Vec<String>> = cards
            .iter()
            .map(|c| {
                vec![
                    c.label.to_string(),
                    c.value.clone(),
                    c.change.map_or_else(String::new, change_label),
                ]
            })
            .collect();
        table(&["METRIC", "VALUE", "CHANGE"], &rows)
    });

    section(&mut out, "Revenue trend", &widgets::revenue_trend(snapshot), |trend| {
        let rows: Vec<Vec<String>> = trend
            .points
            .iter()
            .map(|p| vec![p.month.clone(), format_inr_compact(p.revenue), p.count.to_string()])
            .collect();
        format!(
            "{}\nmonth over month: {}",
            table(&["MONTH", "REVENUE", "DEALS"], &rows),
            change_label(trend.month_over_month)
        )
    });

    section(&mut out, "Deal funnel", &widgets::deal_funnel(snapshot), |funnel| {
        let rows: Vec<Vec<String>> = funnel
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.stage.to_string(),
                    r.count.to_string(),
                    format_inr(r.value),
                    format!("{}%", r.share),
                ]
            })
            .collect();
        table(&["STAGE", "DEALS", "VALUE", "SHARE"], &rows)
    });

    section(&mut out, "Win rate", &widgets::win_rate(snapshot), |w| {
        format!("{}% ({} won, {} lost)", w.rate, w.won, w.lost)
    });

    section(&mut out, "Lead funnel", &widgets::lead_funnel(snapshot), |(funnel, conversion)| {
        let rows: Vec<Vec<String>> = funnel
            .rows
            .iter()
            .map(|r| vec![r.stage.to_string(), r.count.to_string(), format!("{}%", r.share)])
            .collect();
        format!(
            "{}\nconversion: {conversion}%",
            table(&["STAGE", "LEADS", "SHARE"], &rows)
        )
    });

    for (title, ranking) in [
        ("Top products", Ranking::Products),
        ("Top partners", Ranking::Partners),
        ("Top salespeople", Ranking::Salespeople),
    ] {
        section(&mut out, title, &widgets::ranked(snapshot, ranking, 1, page_size), |t| {
            let rows: Vec<Vec<String>> = t
                .rows
                .iter()
                .map(|r| {
                    vec![
                        r.rank.to_string(),
                        r.name.clone(),
                        r.count.to_string(),
                        format_inr(r.amount),
                        format!("{}%", r.share),
                    ]
                })
                .collect();
            table(&["#", "NAME", "SALES", "AMOUNT", "SHARE"], &rows)
        });
    }

    section(&mut out, "Targets", &widgets::targets(snapshot, 1, page_size), |t| {
        let rows: Vec<Vec<String>> = t
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    format_inr(r.target),
                    format_inr(r.achieved),
                    format!("{}%", r.pct),
                ]
            })
            .collect();
        table(&["NAME", "TARGET", "ACHIEVED", "%"], &rows)
    });

    section(&mut out, "My summary", &widgets::my_summary(snapshot), |s| {
        format!(
            "open tasks: {}\nmeetings today: {}\nleads today: {}\nclosing this month: {} ({})",
            s.open_tasks, s.meetings_today, s.todays_leads, s.deals_closing_this_month, s.closing_value
        )
    });

    section(&mut out, "Growth", &widgets::growth(snapshot), |rows| {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|g| {
                vec![
                    g.metric.to_string(),
                    format_inr_compact(g.current),
                    format_inr_compact(g.previous),
                    change_label(g.change),
                ]
            })
            .collect();
        table(&["METRIC", "CURRENT", "PREVIOUS", "CHANGE"], &rows)
    });

    section(&mut out, "Tasks", &widgets::task_completion(snapshot), |t| {
        format!("{}/{} completed ({}%), {} overdue", t.completed, t.total, t.pct, t.overdue)
    });

    section(&mut out, "Payments", &widgets::payment_summary(snapshot), |p| {
        format!("received {} ({}%), pending {}", p.received, p.received_pct, p.pending)
    });

    out.trim_end().to_string()
}
