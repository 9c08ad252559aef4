use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};

use crate::app::{App, FocusPane, InputMode, View};
use crate::loader::MANIFEST_HEADER;
use crate::model::Scope;
use crate::tree::{NodeTag, TreeNode};
use crate::viewer::{LOADING_TITLE, TabState};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_D: Color = Color::Rgb(82, 24, 124);
const KEY: Color = Color::Rgb(103, 232, 249);
const VALUE: Color = Color::Rgb(147, 197, 253);

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
    if let Some(notice) = app.notice() {
        render_notice_modal(frame, notice);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let left_line = build_left_header_line(app);
    let right_line = build_right_header_line(app);
    let right_width = spans_width(&right_line.spans) as u16;
    if area.width < 42 || right_width == 0 || right_width >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right_line).style(Style::default().bg(BG)),
        chunks[1],
    );
}

fn build_left_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    let Some(view) = app.active_view() else {
        push_powerline_segment(&mut spans, " 󱃾 kubetree ", Color::White, PL_A, BG);
        return Line::from(spans);
    };
    push_powerline_segment(&mut spans, " 󱃾 kubetree ", Color::White, PL_A, PL_B);

    let source = format!(" 󰈙 {} ", compact_text(&view.label(), 24));
    match view.session() {
        Some(session) => {
            push_powerline_segment(&mut spans, source, Color::White, PL_B, PL_C);
            push_powerline_segment(
                &mut spans,
                format!(" 󰠳 {} ", compact_text(session.context(), 28)),
                Color::White,
                PL_C,
                PL_D,
            );
            push_powerline_segment(
                &mut spans,
                format!(
                    " 󰒍 {} ",
                    compact_text(&display_cluster_endpoint(session.cluster_url()), 36)
                ),
                Color::White,
                PL_D,
                BG,
            );
        }
        None => {
            push_powerline_segment(&mut spans, source, Color::White, PL_B, WARN);
            push_powerline_segment(&mut spans, " connecting… ", Color::Black, WARN, BG);
        }
    }
    Line::from(spans)
}

fn build_right_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    let mut next_bg = BG;
    for (index, view) in app.views().iter().enumerate().take(9) {
        let active = index == app.active_index();
        let bg = if active {
            Color::Rgb(59, 130, 246)
        } else if view.session().is_some() {
            Color::Rgb(67, 56, 202)
        } else {
            Color::Rgb(30, 41, 59)
        };
        let fg = if active { Color::Black } else { Color::White };
        push_powerline_segment_rtl(&mut spans, view_slot_label(index + 1, active), fg, bg, next_bg);
        next_bg = bg;
    }
    if !spans.is_empty() {
        spans.push(Span::styled(" ", Style::default().bg(next_bg)));
    }
    Line::from(spans)
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let Some(view) = app.active_view() else {
        render_welcome(frame, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(36), Constraint::Percentage(64)])
        .split(area);
    render_tree(frame, chunks[0], app, view, app.focus() == FocusPane::Tree);
    render_detail(frame, chunks[1], view, app.focus() == FocusPane::Detail);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No cluster open",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Type :open <kubeconfig> to browse a cluster, ? for help.",
            Style::default().fg(MUTED),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .style(Style::default().bg(PANEL));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        area,
    );
}

fn render_tree(frame: &mut Frame, area: Rect, app: &App, view: &View, focused: bool) {
    let tree = view.tree();
    let rows = view.rows();
    let items = rows
        .iter()
        .filter_map(|row| {
            let node = tree.get(row.id)?;
            Some(ListItem::new(tree_line(app, view, node, row.depth)))
        })
        .collect::<Vec<_>>();

    let title = if view.session().is_some() {
        format!(" Resources ({}) ", view.label())
    } else {
        format!(" Opening {} ", view.label())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL));
    let list = List::new(items)
        .block(block)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(30, 64, 175))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▌");

    let selected = (!rows.is_empty()).then_some(view.cursor());
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn tree_line(app: &App, view: &View, node: &TreeNode, depth: usize) -> Line<'static> {
    let marker = if node.is_folder() || node.has_children() {
        if node.expanded { "▾" } else { "▸" }
    } else {
        " "
    };
    let mut spans = vec![
        Span::raw("  ".repeat(depth)),
        Span::styled(format!("{marker} "), Style::default().fg(MUTED)),
        Span::styled(
            format!("{} ", kind_icon(node.icon_key)),
            Style::default().fg(if node.is_folder() { WARN } else { ACCENT }),
        ),
        Span::raw(node.label.clone()),
    ];
    if let NodeTag::Folder { code, namespace } = &node.tag
        && let Some(kind) = app.catalog().lookup(code)
        && view
            .in_flight()
            .is_busy(kind.code, &Scope::for_kind(kind, namespace.as_deref()))
    {
        spans.push(Span::styled(" loading…", Style::default().fg(MUTED)));
    }
    Line::from(spans)
}

fn render_detail(frame: &mut Frame, area: Rect, view: &View, focused: bool) {
    let viewer = view.viewer();
    let border = if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(MUTED)
    };
    let Some(tab) = viewer.selected() else {
        let block = Block::default()
            .title(" Details ")
            .borders(Borders::ALL)
            .border_style(border)
            .style(Style::default().bg(PANEL));
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Select an object and press Enter to describe it.",
                Style::default().fg(MUTED),
            ))
            .block(block),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let titles = viewer
        .tabs()
        .iter()
        .map(|tab| {
            let style = if tab.is_error() {
                Style::default().fg(ERROR)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(compact_text(&tab.title, 28), style))
        })
        .collect::<Vec<_>>();
    frame.render_widget(
        Tabs::new(titles)
            .select(viewer.selected_index())
            .style(Style::default().bg(BG).fg(MUTED))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .divider(Span::styled("│", Style::default().fg(MUTED))),
        chunks[0],
    );

    let text = match tab.state {
        TabState::Loading => Text::from(Span::styled(LOADING_TITLE, Style::default().fg(MUTED))),
        TabState::Shown => highlight_document(&tab.body),
    };
    let block = Block::default()
        .title(format!(" {} ", tab.title))
        .borders(Borders::ALL)
        .border_style(if tab.is_error() {
            Style::default().fg(ERROR)
        } else {
            border
        })
        .style(Style::default().bg(PANEL));
    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((tab.scroll, 0));
    frame.render_widget(paragraph, chunks[1]);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    if matches!(app.mode(), InputMode::Command) {
        let mut spans = Vec::new();
        push_powerline_segment(&mut spans, " 󰘳 cmd ", Color::Black, ACCENT, PL_B);
        push_powerline_segment(
            &mut spans,
            format!(" :{} ", app.input()),
            Color::White,
            PL_B,
            BG,
        );
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let status_text = app.status().to_string();
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " 󰈈 ro ", Color::White, PL_A, PL_B);
    let status_width_hint = area.width.saturating_sub(24).min(120) as usize;
    push_powerline_segment(
        &mut spans,
        format!(
            " {} {} ",
            footer_status_icon(&status_text),
            compact_text(&status_text, status_width_hint.max(24))
        ),
        Color::White,
        PL_B,
        BG,
    );

    let right_spans = build_footer_glance_spans(app);
    let right_width = (spans_width(&right_spans) as u16).min(area.width.saturating_sub(28));
    if right_width == 0 {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(Style::default().bg(BG))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn build_footer_glance_spans(app: &App) -> Vec<Span<'static>> {
    let Some(view) = app.active_view() else {
        return Vec::new();
    };
    let mut spans = vec![Span::styled(
        format!("󰓩 {} ", view.viewer().len()),
        Style::default().fg(MUTED),
    )];
    let loading = view.in_flight().len();
    if loading > 0 {
        spans.push(Span::styled(
            format!("󰔟 {loading} "),
            Style::default().fg(WARN),
        ));
    }
    spans.push(Span::styled("? help ", Style::default().fg(MUTED)));
    spans
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = ["failed", "error", "unknown", "no view", "forbidden"]
        .iter()
        .any(|needle| status.contains(needle));
    if has_failure { "󰅚" } else { "󰄬" }
}

fn highlight_document(body: &str) -> Text<'static> {
    let mut in_manifest = false;
    let lines = body
        .lines()
        .map(|line| {
            if !in_manifest && line == MANIFEST_HEADER {
                in_manifest = true;
                return Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                ));
            }
            if in_manifest {
                manifest_line(line)
            } else {
                header_line(line)
            }
        })
        .collect::<Vec<_>>();
    Text::from(lines)
}

fn header_line(line: &str) -> Line<'static> {
    if let Some(entry) = line.strip_prefix("    ") {
        let mut spans = vec![Span::raw("    ")];
        match entry.split_once('=') {
            Some((key, value)) => {
                spans.push(Span::styled(key.to_string(), Style::default().fg(KEY)));
                spans.push(Span::styled("=", Style::default().fg(MUTED)));
                spans.push(Span::styled(value.to_string(), Style::default().fg(VALUE)));
            }
            None => spans.push(Span::styled(entry.to_string(), Style::default().fg(VALUE))),
        }
        return Line::from(spans);
    }

    let (bullet, field) = match line.strip_prefix("- ") {
        Some(rest) => ("- ", rest),
        None => ("", line),
    };
    let mut spans = Vec::new();
    if !bullet.is_empty() {
        spans.push(Span::styled(bullet, Style::default().fg(MUTED)));
    }
    match field.split_once(':') {
        Some((name, value)) => {
            let style = if bullet.is_empty() {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(KEY)
            };
            spans.push(Span::styled(format!("{name}:"), style));
            spans.push(Span::styled(value.to_string(), Style::default().fg(Color::White)));
        }
        None => spans.push(Span::raw(field.to_string())),
    }
    Line::from(spans)
}

fn manifest_line(line: &str) -> Line<'static> {
    let content = line.trim_start_matches(' ');
    let indent = &line[..line.len() - content.len()];
    let mut spans = vec![Span::raw(indent.to_string())];

    let content = match content.strip_prefix("- ") {
        Some(rest) => {
            spans.push(Span::styled("- ", Style::default().fg(MUTED)));
            rest
        }
        None => content,
    };
    match split_yaml_key_value(content) {
        Some((key, value)) => {
            spans.push(Span::styled(key.to_string(), Style::default().fg(KEY)));
            spans.push(Span::styled(":", Style::default().fg(MUTED)));
            let value = value.trim();
            if !value.is_empty() {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    value.to_string(),
                    Style::default().fg(scalar_color(value)),
                ));
            }
        }
        None => spans.push(Span::styled(
            content.to_string(),
            Style::default().fg(scalar_color(content)),
        )),
    }
    Line::from(spans)
}

fn split_yaml_key_value(content: &str) -> Option<(&str, &str)> {
    let (key, value) = content.split_once(':')?;
    if key.is_empty() || key.contains(' ') || key.starts_with(['"', '\'', '{', '[']) {
        return None;
    }
    if !value.is_empty() && !value.starts_with(' ') {
        return None;
    }
    Some((key, value))
}

fn scalar_color(value: &str) -> Color {
    if value.starts_with("<redacted") {
        WARN
    } else if value.starts_with('"') || value.starts_with('\'') {
        Color::Rgb(125, 211, 252)
    } else if matches!(value, "true" | "false" | "null" | "~") {
        WARN
    } else if value.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else {
        VALUE
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn push_powerline_segment_rtl(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
}

fn view_slot_label(slot: usize, active: bool) -> String {
    if active {
        format!("◉{slot}")
    } else {
        slot.to_string()
    }
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn render_notice_modal(frame: &mut Frame, notice: &str) {
    let area = frame
        .area()
        .centered(Constraint::Percentage(64), Constraint::Percentage(30));
    frame.render_widget(Clear, area);

    let mut lines = notice
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect::<Vec<_>>();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter / Esc to dismiss",
        Style::default().fg(MUTED),
    )));

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Error ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ERROR))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = frame
        .area()
        .centered(Constraint::Percentage(70), Constraint::Percentage(64));
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "kubetree help  mode:{}  views:{}",
            help_mode_label(app.mode()),
            app.views().len()
        )),
        Line::from(""),
    ];
    for line in help_lines() {
        lines.push(Line::from(line));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn help_lines() -> [&'static str; 9] {
    [
        "Tree: j/k or ↑/↓ move  l/→ expand  h/← collapse  g/G top/bottom",
        "Enter: expand a folder, or describe the selected object",
        "R: list the selected folder again",
        "Tab: switch focus between tree and details (j/k scroll details)",
        "Details: [ / ] previous/next tab  x close tab",
        "Views: 1..9 switch view",
        "Commands: :open <kubeconfig>  :close  :quit",
        "Folders load once; use R to refresh them",
        "q quit  ? toggle help",
    ]
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::Command => "command",
    }
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn display_cluster_endpoint(cluster: &str) -> String {
    let trimmed = cluster.trim().trim_end_matches('/');
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .to_string()
}

fn kind_icon(icon_key: &str) -> &'static str {
    match icon_key {
        crate::tree::FOLDER_ICON => "󰉋",
        "ns" => "󰉖",
        "node" => "󰣇",
        "pod" => "󰋊",
        "cj" => "󰃰",
        "ds" => "󰠱",
        "deploy" => "󰹑",
        "rs" => "󰹍",
        "rc" => "󰐌",
        "sts" => "󰛨",
        "jobs" => "󰁨",
        "svc" => "󰒓",
        "ing" => "󰇚",
        "cm" => "󰈙",
        "pvc" => "󱃞",
        "secrets" => "󰌋",
        "sc" => "󰆼",
        "pv" => "󱃔",
        "sa" => "󰯃",
        "role" => "󰒃",
        "rolebinding" => "󰑖",
        "clusterrole" => "󰒄",
        "clusterrolebinding" => "󰑗",
        "netpol" => "󰅙",
        "event" => "󱐋",
        "crds" => "󰚜",
        _ => "󰈔",
    }
}
