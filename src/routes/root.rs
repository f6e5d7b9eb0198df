use indexmap::IndexMap;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::error::AppError;
use crate::models::{Field, IssueRecord, IssueType, Priority, Status};
use crate::renderer::{Renderer, DEFAULT_STYLE};
use crate::service_desk_client::IssueQuery;
use crate::stats::SummaryStats;
use crate::view::{ViewAction, ViewMode, ViewParams, ViewState, COLUMNS};
use crate::AppState;

fn link(state: &ViewState, action: ViewAction, label: &str) -> Markup {
    html! {
        a href=(state.clone().update(action).href()) { (label) }
    }
}

fn priority_class(priority: &str) -> &'static str {
    match priority.parse::<Priority>() {
        Ok(Priority::High) => "priority-high",
        Ok(Priority::Normal) => "priority-normal",
        Ok(Priority::Low) => "priority-low",
        Err(_) => "priority-unknown",
    }
}

fn select<T: Copy + PartialEq + ToString>(name: &str, label: &str, options: &[T], selected: Option<T>) -> Markup {
    html! {
        select name=(name) {
            option value="" { "All " (label) }
            @for option in options {
                option value=(option.to_string()) selected[selected == Some(*option)] {
                    (option.to_string())
                }
            }
        }
    }
}

// Submitting the form replaces the filters but keeps layout choices.
fn render_filters(state: &ViewState) -> Markup {
    let layout = ViewState {
        priority: None,
        status: None,
        issue_type: None,
        organization_search: None,
        ..state.clone()
    };

    html! {
        form.filters method="get" action="/" {
            (select("priority", "Priorities", Priority::ALL, state.priority))
            (select("status", "Statuses", Status::ALL, state.status))
            (select("type", "Types", IssueType::ALL, state.issue_type))
            input type="text" name="organization" placeholder="Search organisation id"
                value=(state.organization_search.as_deref().unwrap_or_default());
            @for (key, value) in layout.query_pairs() {
                input type="hidden" name=(key) value=(value);
            }
            button type="submit" { "Apply" }
        }
    }
}

fn render_column_toggles(state: &ViewState) -> Markup {
    html! {
        div.columns {
            "Columns: "
            @for (field, label) in COLUMNS {
                @let mark = if state.hidden_columns.contains(&field) { "☐" } else { "☑" };
                (link(state, ViewAction::ToggleColumn(field), &format!("{} {}", mark, label)))
                " "
            }
        }
    }
}

fn render_details(issue: &IssueRecord, colspan: usize) -> Markup {
    let via = issue.via.clone().unwrap_or_default();
    let details = [
        ("Via Channel", via.channel),
        ("Source Name", via.source.from.name.unwrap_or_default()),
        ("Source Email", via.source.from.email.unwrap_or_default()),
        ("Organization ID", issue.field(Field::OrganizationId)),
        (
            "Ticket Form ID",
            issue.ticket_form_id.map(|id| id.to_string()).unwrap_or_default(),
        ),
        (
            "Satisfaction Score",
            issue
                .satisfaction_score()
                .map(|score| score.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
    ];

    html! {
        tr.details {
            td colspan=(colspan) {
                div.detail-grid {
                    @for (label, value) in &details {
                        div { strong { (label) ":" } " " (value) }
                    }
                }
            }
        }
    }
}

fn render_table(state: &ViewState, issues: &[&IssueRecord]) -> Markup {
    let columns = state.visible_columns().collect::<Vec<_>>();
    let sort_label = format!("Priority {}", state.priority_direction.arrow());

    html! {
        table {
            thead {
                tr {
                    th {}
                    @for (field, label) in &columns {
                        @if *field == Field::Priority {
                            th.sortable { (link(state, ViewAction::TogglePriorityDirection, &sort_label)) }
                        } @else {
                            th { (label) }
                        }
                    }
                }
            }
            tbody {
                @for issue in issues {
                    @let expanded = state.expanded_rows.contains(&issue.id);
                    tr {
                        td.expand {
                            (link(state, ViewAction::ToggleRow(issue.id), if expanded { "▾" } else { "▸" }))
                        }
                        @for (field, _) in &columns {
                            @if *field == Field::Priority {
                                td { span class=(priority_class(&issue.priority)) { (issue.priority) } }
                            } @else {
                                td { (issue.field(*field)) }
                            }
                        }
                    }
                    @if expanded {
                        (render_details(issue, columns.len() + 1))
                    }
                }
            }
        }
    }
}

fn render_breakdown(title: &str, counts: &IndexMap<String, usize>) -> Markup {
    let bars = counts
        .iter()
        .map(|(label, count)| (label.as_str(), *count))
        .collect::<Vec<_>>();
    let chart = Renderer::new(320, 22, 110, 4).render_bar_chart(&bars, &DEFAULT_STYLE);

    html! {
        div.breakdown {
            h3 { (title) }
            (PreEscaped(chart))
            table {
                @for (label, count) in counts {
                    tr { td { (label) } td { (count) } }
                }
            }
        }
    }
}

fn render_summary(issues: &[&IssueRecord]) -> Markup {
    let stats = SummaryStats::from_records(issues.iter().copied());
    html! {
        section.summary {
            h2 { "Service Desk Summary" }
            div.summary-grid {
                (render_breakdown("Tickets by Priority", &stats.by_priority))
                (render_breakdown("Tickets by Type", &stats.by_type))
                (render_breakdown("Tickets by Status", &stats.by_status))
                (render_breakdown("Satisfaction Ratings", &stats.satisfaction_ratings))
            }
        }
    }
}

pub fn render_dashboard(state: &ViewState, issues: &[IssueRecord]) -> Markup {
    let visible = state.apply(issues);
    let switch_label = match state.mode {
        ViewMode::Table => "Switch to Summary View",
        ViewMode::Summary => "Switch to Table View",
    };

    html! {
        (DOCTYPE)
        html {
            head {
                title { "Service Desk Issues" }
                link rel="stylesheet" href="/static/dashboard.css";
            }
            body {
                h1 { "Service Desk Issues" }
                (render_filters(state))
                (render_column_toggles(state))
                (render_table(state, &visible))
                div.view-switch { (link(state, ViewAction::ToggleMode, switch_label)) }
                @if state.mode == ViewMode::Summary {
                    (render_summary(&visible))
                }
            }
        }
    }
}

pub async fn root(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Query(params): axum::extract::Query<ViewParams>,
) -> Result<Markup, AppError> {
    let view = ViewState::from(params);
    let issues = state
        .client
        .fetch_issues(&IssueQuery::with_datapoints(state.config.dashboard_datapoints))
        .await?;

    Ok(render_dashboard(&view, &issues))
}
