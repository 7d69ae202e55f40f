//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthStr;

use scrumkit_core::Priority;
use scrumkit_core::canvas::{
    ActionStatus, BusinessModelCanvas, CanvasKind, CanvasStatus, GapAnalysis, ValuePropositionCanvas,
    ValueStreamMap,
};
use scrumkit_core::epic::model::{Epic, EpicProgress, EpicStatus};
use scrumkit_core::project::model::{Project, ProjectStatus};
use scrumkit_core::sprint::model::{Sprint, SprintStatus, SprintSummary};
use scrumkit_core::story::model::{Story, StoryStatus};
use scrumkit_core::team::model::TeamMember;

/// Board columns, left to right.
const BOARD_COLUMNS: [StoryStatus; 4] = [
    StoryStatus::Todo,
    StoryStatus::InProgress,
    StoryStatus::Review,
    StoryStatus::Done,
];

/// First eight characters of an id.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Print projects as a table. The current project is marked.
pub fn print_projects_table(projects: &[Project], current: Option<&str>) {
    if projects.is_empty() {
        println!("{}", "No projects found.".dimmed());
        return;
    }

    println!("  {:<10} {:<32} {:<10} {}", "ID", "Name", "Status", "Updated");
    println!("{}", "─".repeat(70));

    for project in projects {
        let marker = if current == Some(project.id.as_str()) {
            "▸".cyan().bold()
        } else {
            " ".normal()
        };
        let status = match project.status {
            ProjectStatus::Active => "active".green(),
            ProjectStatus::Archived => "archived".dimmed(),
        };
        println!(
            "{} {:<10} {} {:<10} {}",
            marker,
            short_id(&project.id),
            pad_right(&truncate_visual(&project.name, 32), 32),
            status,
            project.updated_at.format("%Y-%m-%d").to_string().dimmed()
        );
    }
}

/// Print a single project.
pub fn print_project(project: &Project) {
    println!("{} {}", project.name.cyan().bold(), format!("({})", project.id).dimmed());
    if !project.description.is_empty() {
        println!();
        println!("{}", project.description);
    }
    println!();
    println!("{}: {}", "Status".bold(), project.status.as_str().yellow());
    println!("{}: {}", "Created".bold(), project.created_at.format("%Y-%m-%d %H:%M"));
}

/// Print epics as a table.
pub fn print_epics_table(epics: &[Epic]) {
    if epics.is_empty() {
        println!("{}", "No epics found.".dimmed());
        return;
    }

    println!("{:<10} {:<30} {:<12} {:<9} {:>5} {:>6}", "ID", "Title", "Status", "Priority", "Value", "Effort");
    println!("{}", "─".repeat(78));

    for epic in epics {
        println!(
            "{:<10} {} {} {} {:>5} {:>6}",
            short_id(&epic.id),
            pad_right(&truncate_visual(&epic.title, 30), 30),
            pad_colored(epic_status_colored(epic.status), 12),
            pad_colored(priority_colored(epic.priority), 9),
            epic.business_value,
            epic.effort
        );
    }

    println!();
    println!("{} epic(s) total", epics.len());
}

/// Print an epic with its delivery progress.
pub fn print_epic(epic: &Epic, progress: &EpicProgress) {
    println!("{} {}", epic.title.cyan().bold(), format!("({})", epic.id).dimmed());
    if !epic.description.is_empty() {
        println!();
        println!("{}", epic.description);
    }
    println!();
    println!("{}: {}", "Status".bold(), epic_status_colored(epic.status));
    println!("{}: {}", "Priority".bold(), priority_colored(epic.priority));
    println!("{}: {}/10  {}: {}/10", "Value".bold(), epic.business_value, "Effort".bold(), epic.effort);
    println!("{}: {}", "Color".bold(), epic.color);
    println!();
    println!(
        "{} {} {}/{} stories, {}/{} points",
        "Progress".bold(),
        progress_bar(progress.percent_complete, 20),
        progress.done_count,
        progress.story_count,
        progress.points_done,
        progress.points_total
    );
}

/// Print stories as a table.
pub fn print_stories_table(stories: &[Story]) {
    if stories.is_empty() {
        println!("{}", "No stories found.".dimmed());
        return;
    }

    println!("{:<10} {:<34} {:<12} {:<9} {:>6}", "ID", "Title", "Status", "Priority", "Points");
    println!("{}", "─".repeat(75));

    for story in stories {
        let points = story.story_points.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {} {} {} {:>6}",
            short_id(&story.id),
            pad_right(&truncate_visual(&story.title, 34), 34),
            pad_colored(story_status_colored(story.status), 12),
            pad_colored(priority_colored(story.priority), 9),
            points
        );
    }

    let points: u32 = stories.iter().filter_map(|s| s.story_points).sum();
    println!();
    println!("{} story(ies), {} point(s)", stories.len(), points);
}

/// Print a single story.
pub fn print_story(story: &Story) {
    println!("{} {}", story.title.cyan().bold(), format!("({})", story.id).dimmed());
    if !story.description.is_empty() {
        println!();
        println!("{}", story.description);
    }
    println!();
    println!("{}: {}", "Status".bold(), story_status_colored(story.status));
    println!("{}: {}", "Priority".bold(), priority_colored(story.priority));
    if let Some(points) = story.story_points {
        println!("{}: {}", "Points".bold(), points);
    }
    println!("{}: {}", "Epic".bold(), short_id(&story.epic_id));
    match &story.sprint_id {
        Some(sprint) => println!("{}: {}", "Sprint".bold(), short_id(sprint)),
        None => println!("{}: {}", "Sprint".bold(), "backlog".dimmed()),
    }
    if !story.tags.is_empty() {
        println!("{}: {}", "Tags".bold(), story.tags.join(", "));
    }
    if !story.acceptance_criteria.is_empty() {
        println!();
        println!("{}", "Acceptance Criteria".bold());
        for (i, criterion) in story.acceptance_criteria.iter().enumerate() {
            println!("  {}. {}", i + 1, criterion);
        }
    }
}

/// Print sprints as a table.
pub fn print_sprints_table(sprints: &[Sprint]) {
    if sprints.is_empty() {
        println!("{}", "No sprints found.".dimmed());
        return;
    }

    println!("{:<10} {:<24} {:<11} {:<23} {:>8}", "ID", "Name", "Status", "Dates", "Velocity");
    println!("{}", "─".repeat(80));

    for sprint in sprints {
        let velocity = sprint.velocity.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {} {} {} → {} {:>8}",
            short_id(&sprint.id),
            pad_right(&truncate_visual(&sprint.name, 24), 24),
            pad_colored(sprint_status_colored(sprint.status), 11),
            sprint.start_date,
            sprint.end_date,
            velocity
        );
    }
}

/// Print a sprint's commitment against its capacity.
pub fn print_sprint_summary(sprint: &Sprint, summary: &SprintSummary) {
    println!("{} {}", sprint.name.cyan().bold(), format!("({})", sprint.id).dimmed());
    if !sprint.goal.is_empty() {
        println!("{}", sprint.goal.italic());
    }
    println!();
    println!("{}: {}", "Status".bold(), sprint_status_colored(sprint.status));
    println!(
        "{}: {} → {} ({} days)",
        "Dates".bold(),
        sprint.start_date,
        sprint.end_date,
        sprint.duration_days()
    );
    println!("{}: {}/{} done", "Stories".bold(), summary.done_count, summary.story_count);

    let percent = if summary.committed_points > 0 {
        summary.completed_points as f64 / summary.committed_points as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "{}: {} {}/{} points",
        "Burn".bold(),
        progress_bar(percent, 20),
        summary.completed_points,
        summary.committed_points
    );

    if let Some(capacity) = summary.capacity {
        match summary.overcommitted_by() {
            Some(over) => println!(
                "{}: {} ({})",
                "Capacity".bold(),
                capacity,
                format!("over by {}", over).red().bold()
            ),
            None => println!("{}: {}", "Capacity".bold(), capacity.to_string().green()),
        }
    }
}

/// Print the team as a table.
pub fn print_team_table(members: &[TeamMember]) {
    if members.is_empty() {
        println!("{}", "No team members yet.".dimmed());
        return;
    }

    println!("{:<10} {:<24} {:<16} {:<28} {:>8}", "ID", "Name", "Role", "Email", "Capacity");
    println!("{}", "─".repeat(90));

    for member in members {
        let capacity = member.capacity.map(|c| c.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {} {:<16} {} {:>8}",
            short_id(&member.id),
            pad_right(&truncate_visual(&member.name, 24), 24),
            member.role.as_str(),
            pad_right(&truncate_visual(&member.email, 28), 28),
            capacity
        );
    }

    let total: u32 = members.iter().filter_map(|m| m.capacity).sum();
    println!();
    println!("{} member(s), {} point(s) of capacity per sprint", members.len(), total);
}

/// Print which canvases a project has filled in.
pub fn print_canvas_status(status: &CanvasStatus) {
    println!("{}", "Discovery Canvases".bold());
    println!();
    for kind in CanvasKind::ALL {
        let mark = if status.has(kind) { "✓".green() } else { "·".dimmed() };
        println!("  {} {:<26} {}", mark, kind.title(), kind.slug().dimmed());
    }
    println!();
    println!("{}/{} completed", status.completed(), CanvasKind::ALL.len());
}

pub fn print_business_model(canvas: &BusinessModelCanvas) {
    println!("{}", CanvasKind::BusinessModel.title().cyan().bold());
    for (title, text) in canvas.blocks() {
        println!();
        println!("{}", title.bold());
        if text.trim().is_empty() {
            println!("  {}", "(empty)".dimmed());
        } else {
            for line in text.lines() {
                println!("  {}", line);
            }
        }
    }
    println!();
    println!("{}/9 blocks filled", canvas.filled_blocks());
}

pub fn print_value_proposition(canvas: &ValuePropositionCanvas) {
    println!("{}", CanvasKind::ValueProposition.title().cyan().bold());
    let sections: [(&str, &[String]); 6] = [
        ("Customer Jobs", &canvas.customer_jobs),
        ("Pains", &canvas.pains),
        ("Gains", &canvas.gains),
        ("Products & Services", &canvas.products_and_services),
        ("Pain Relievers", &canvas.pain_relievers),
        ("Gain Creators", &canvas.gain_creators),
    ];
    for (title, items) in sections {
        println!();
        println!("{}", title.bold());
        if items.is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for item in items {
            println!("  - {}", item);
        }
    }
    println!();
    let fit = if canvas.has_fit() { "yes".green() } else { "no".yellow() };
    println!("{}: {}", "Problem/solution fit".bold(), fit);
}

pub fn print_value_stream(map: &ValueStreamMap) {
    let title = if map.name.is_empty() { CanvasKind::ValueStream.title() } else { map.name.as_str() };
    println!("{}", title.cyan().bold());
    if !map.description.is_empty() {
        println!("{}", map.description.dimmed());
    }
    println!();

    if map.steps.is_empty() {
        println!("{}", "No process steps.".dimmed());
        return;
    }

    let metrics = map.metrics();
    let bottleneck = metrics.bottleneck.as_ref().map(|s| s.id.as_str());

    println!("{:<10} {:<28} {:>9} {:>9}  {}", "ID", "Step", "Process", "Wait", "VA");
    println!("{}", "─".repeat(66));
    for step in &map.steps {
        let va = if step.value_adding { "✓".green() } else { "·".dimmed() };
        let wait = format!("{:>9.1}", step.wait_time);
        let wait = if bottleneck == Some(step.id.as_str()) { wait.red().bold() } else { wait.normal() };
        println!(
            "{:<10} {} {:>9.1} {}  {}",
            short_id(&step.id),
            pad_right(&truncate_visual(&step.name, 28), 28),
            step.process_time,
            wait,
            va
        );
    }

    println!();
    println!("{}: {:.1}", "Lead time".bold(), metrics.lead_time);
    println!(
        "{}: {:.1} process + {:.1} wait",
        "Breakdown".bold(),
        metrics.total_process_time,
        metrics.total_wait_time
    );
    println!("{}: {:.1}", "Value-added time".bold(), metrics.value_added_time);
    println!(
        "{}: {}",
        "Process cycle efficiency".bold(),
        format!("{:.1}%", metrics.process_cycle_efficiency).cyan()
    );
    if let Some(step) = &metrics.bottleneck {
        println!("{}: {} ({:.1} waiting)", "Bottleneck".bold(), step.name.red(), step.wait_time);
    }
}

pub fn print_gap_analysis(gap: &GapAnalysis) {
    let title = if gap.title.is_empty() { CanvasKind::GapAnalysis.title() } else { gap.title.as_str() };
    println!("{}", title.cyan().bold());
    println!();
    println!("{}: {}", "Current".bold(), gap.current_state);
    println!("{}: {}", "Desired".bold(), gap.desired_state);

    println!();
    println!("{}", "Gaps".bold());
    if gap.gap_items.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for item in &gap.gap_items {
        println!(
            "  {} {} {} {}",
            priority_indicator(item.priority),
            item.area.bold(),
            short_id(&item.id).dimmed(),
            format!("{} → {}", item.current, item.desired).dimmed()
        );
        if !item.gap.is_empty() {
            println!("     {}", item.gap);
        }
    }

    println!();
    println!("{}", "Actions".bold());
    if gap.action_items.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for action in &gap.action_items {
        let mark = match action.status {
            ActionStatus::Open => "○".normal(),
            ActionStatus::InProgress => "◐".yellow(),
            ActionStatus::Done => "●".green(),
        };
        let due = action.due_date.map(|d| format!(" due {}", d)).unwrap_or_default();
        let owner = if action.owner.is_empty() { String::new() } else { format!(" @{}", action.owner) };
        println!(
            "  {} {} {}{}",
            mark,
            action.description,
            short_id(&action.id).dimmed(),
            format!("{}{}", owner, due).dimmed()
        );
    }

    println!();
    println!(
        "{}: {}",
        "Completion".bold(),
        progress_bar(gap.completion_rate() * 100.0, 20)
    );
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Print the sprint board: stories in columns by status.
pub fn print_board(sprint: &Sprint, stories: &[Story]) {
    println!(
        "{} {} {}",
        sprint.name.cyan().bold(),
        sprint_status_colored(sprint.status),
        format!("{} → {}", sprint.start_date, sprint.end_date).dimmed()
    );
    println!();

    if stories.is_empty() {
        println!("{}", "No stories in this sprint. Add some with 'scrumkit story assign <id> <sprint>'.".dimmed());
        return;
    }

    let columns: Vec<(StoryStatus, Vec<&Story>)> = BOARD_COLUMNS
        .iter()
        .map(|status| (*status, stories.iter().filter(|s| s.status == *status).collect()))
        .collect();

    let width = term_width();
    if width < 60 {
        print_board_compact(&columns);
    } else {
        print_board_wide(&columns, width);
    }

    let total = stories.len();
    let done = stories.iter().filter(|s| s.status == StoryStatus::Done).count();
    let points: u32 = stories.iter().filter_map(|s| s.story_points).sum();
    println!(
        " {} {} stories {} {} points {} {} done ({}%)",
        "■".cyan(),
        total.to_string().bold(),
        "·".dimmed(),
        points,
        "·".dimmed(),
        done.to_string().green(),
        done * 100 / total
    );
}

fn print_board_wide(columns: &[(StoryStatus, Vec<&Story>)], term_w: usize) {
    let num_cols = columns.len();
    let available = term_w.saturating_sub(num_cols + 1);
    let col_width = (available / num_cols).clamp(12, 35);

    print_rule('┌', '┬', '┐', num_cols, col_width);

    print!("{}", "│".dimmed());
    for (i, (status, stories)) in columns.iter().enumerate() {
        let plain = column_header_plain(*status, stories.len(), col_width);
        let padding = col_width.saturating_sub(UnicodeWidthStr::width(plain.as_str()));
        let left_pad = padding / 2;
        print!(
            "{}{}{}",
            " ".repeat(left_pad),
            column_color(*status, plain),
            " ".repeat(padding - left_pad)
        );
        if i < num_cols - 1 {
            print!("{}", "│".dimmed());
        }
    }
    println!("{}", "│".dimmed());

    print_rule('├', '┼', '┤', num_cols, col_width);

    let max_rows = columns.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
    let title_w = col_width.saturating_sub(3).max(1);
    for row in 0..max_rows {
        print!("{}", "│".dimmed());
        for (ci, (status, stories)) in columns.iter().enumerate() {
            match stories.get(row) {
                Some(story) => {
                    let title = pad_right(&truncate_visual(&story.title, title_w), title_w);
                    match status {
                        StoryStatus::Done => print!("{} {}", "✓ ".green(), title.green().dimmed()),
                        StoryStatus::InProgress => print!("{} {}", priority_indicator(story.priority), title.yellow()),
                        StoryStatus::Review => print!("{} {}", priority_indicator(story.priority), title.magenta()),
                        _ => print!("{} {}", priority_indicator(story.priority), title),
                    }
                }
                None => print!("{}", " ".repeat(col_width)),
            }
            if ci < num_cols - 1 {
                print!("{}", "│".dimmed());
            }
        }
        println!("{}", "│".dimmed());
    }

    print_rule('└', '┴', '┘', num_cols, col_width);
}

/// Compact vertical board layout for narrow terminals.
fn print_board_compact(columns: &[(StoryStatus, Vec<&Story>)]) {
    for (status, stories) in columns {
        if stories.is_empty() {
            continue;
        }
        let header = column_header_plain(*status, stories.len(), 30);
        println!(" {} {}", "▸".dimmed(), column_color(*status, header));
        for story in stories {
            println!(
                "   {} {} {}",
                priority_indicator(story.priority),
                story.title,
                short_id(&story.id).dimmed()
            );
        }
        println!();
    }
}

fn print_rule(left: char, mid: char, right: char, num_cols: usize, col_width: usize) {
    print!("{}", left.to_string().dimmed());
    for i in 0..num_cols {
        print!("{}", "─".repeat(col_width).dimmed());
        if i < num_cols - 1 {
            print!("{}", mid.to_string().dimmed());
        }
    }
    println!("{}", right.to_string().dimmed());
}

/// Column header text (plain, for width calculation).
fn column_header_plain(status: StoryStatus, count: usize, max_width: usize) -> String {
    let name = match status {
        StoryStatus::InProgress if max_width < 16 => "IN_PROG".to_string(),
        other => other.as_str().to_uppercase(),
    };
    truncate_visual(&format!("{} {}", name, count), max_width)
}

fn column_color(status: StoryStatus, label: String) -> ColoredString {
    match status {
        StoryStatus::Todo => label.blue().bold(),
        StoryStatus::InProgress => label.yellow().bold(),
        StoryStatus::Review => label.magenta().bold(),
        StoryStatus::Done => label.green().bold(),
        StoryStatus::Archived => label.dimmed(),
    }
}

fn priority_indicator(priority: Priority) -> ColoredString {
    match priority {
        Priority::Critical => "!!".red().bold(),
        Priority::High => "! ".yellow(),
        Priority::Medium => "· ".dimmed(),
        Priority::Low => "  ".normal(),
    }
}

fn priority_colored(priority: Priority) -> ColoredString {
    match priority {
        Priority::Critical => priority.as_str().red().bold(),
        Priority::High => priority.as_str().yellow(),
        Priority::Medium => priority.as_str().normal(),
        Priority::Low => priority.as_str().dimmed(),
    }
}

fn story_status_colored(status: StoryStatus) -> ColoredString {
    match status {
        StoryStatus::Todo => status.as_str().normal(),
        StoryStatus::InProgress => status.as_str().yellow(),
        StoryStatus::Review => status.as_str().cyan(),
        StoryStatus::Done => status.as_str().green(),
        StoryStatus::Archived => status.as_str().dimmed(),
    }
}

fn epic_status_colored(status: EpicStatus) -> ColoredString {
    match status {
        EpicStatus::Backlog => status.as_str().normal(),
        EpicStatus::InProgress => status.as_str().yellow(),
        EpicStatus::Done => status.as_str().green(),
        EpicStatus::Archived => status.as_str().dimmed(),
    }
}

fn sprint_status_colored(status: SprintStatus) -> ColoredString {
    match status {
        SprintStatus::Planned => status.as_str().blue(),
        SprintStatus::Active => status.as_str().yellow().bold(),
        SprintStatus::Completed => status.as_str().green(),
    }
}

/// Pad a colored label to a column width. Padding is computed on the
/// plain text so escape codes do not count.
fn pad_colored(label: ColoredString, width: usize) -> String {
    let visual = UnicodeWidthStr::width(&*label);
    format!("{}{}", label, " ".repeat(width.saturating_sub(visual)))
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

/// Fixed-width bar followed by the percentage.
fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!(
        "{}{} {:>3.0}%",
        "█".repeat(filled).green(),
        "░".repeat(width - filled).dimmed(),
        clamped
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_visual_respects_wide_chars() {
        assert_eq!(truncate_visual("short", 10), "short");
        assert_eq!(truncate_visual("Sprint planning board", 10), "Sprint p..");
        // Each CJK character is two columns wide.
        let cut = truncate_visual("看板看板看板看板", 9);
        assert!(UnicodeWidthStr::width(cut.as_str()) <= 9);
        assert!(cut.ends_with(".."));
    }

    #[test]
    fn test_pad_right() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_right("abcdef", 4), "abcdef");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_progress_bar_clamps() {
        colored::control::set_override(false);
        assert_eq!(progress_bar(50.0, 4), "██░░  50%");
        assert_eq!(progress_bar(150.0, 2), "██ 100%");
        assert_eq!(progress_bar(-5.0, 2), "░░   0%");
    }

    #[test]
    fn test_column_header_abbreviates_in_progress() {
        assert_eq!(column_header_plain(StoryStatus::InProgress, 3, 12), "IN_PROG 3");
        assert_eq!(column_header_plain(StoryStatus::InProgress, 3, 30), "IN_PROGRESS 3");
        assert_eq!(column_header_plain(StoryStatus::Todo, 0, 30), "TODO 0");
    }
}
