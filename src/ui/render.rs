use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
};
use tui_popup::Popup;

use crate::{
    app::{App, ViewMode},
    keymap,
    project::{ChangeSummary, Project, Validity},
    ui::confirm::Decision,
    utils,
};

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const HEADER: Color = Color::Rgb(0x8b, 0xa4, 0xb0);
const TEXT: Color = Color::Rgb(0xdc, 0xd7, 0xba);
const SUCCESS: Color = Color::Rgb(0x87, 0xa9, 0x87);
const ERROR: Color = Color::Rgb(0xc4, 0x74, 0x6e);
const WARNING: Color = Color::Rgb(0xb6, 0x92, 0x7b);

impl App {
    pub fn draw(&mut self, f: &mut Frame) {
        match self.mode {
            ViewMode::Detail => self.draw_output(f),
            ViewMode::Table | ViewMode::Confirming => self.draw_table_view(f),
        }
    }

    fn draw_table_view(&mut self, f: &mut Frame) {
        let help_height = if self.show_help { keymap::FULL_HELP.len() as u16 } else { 1 };
        let gauge_height = if self.gauge_visible() { 1 } else { 0 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(gauge_height),
                Constraint::Length(help_height),
            ])
            .split(f.area());

        self.draw_project_table(f, chunks[0]);
        self.draw_table_footer(f, chunks[1]);
        self.draw_status(f, chunks[2]);
        if gauge_height > 0 {
            self.draw_progress(f, chunks[3]);
        }
        self.draw_help(f, chunks[4]);

        if self.mode == ViewMode::Confirming {
            self.draw_confirmation(f);
        }
    }

    fn draw_project_table(&mut self, f: &mut Frame, area: Rect) {
        let header = Row::new(["", "Name", "Path", "Valid", "Add", "Change", "Destroy", "Last Modified"])
            .style(Style::default().fg(HEADER).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .table
            .visible_rows()
            .map(|p| project_row(p, self.table.is_selected(&p.path)))
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Fill(3),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Terraform Projects"))
            .style(Style::default().fg(TEXT))
            .row_highlight_style(
                Style::default()
                    .fg(Color::Rgb(0x18, 0x16, 0x16))
                    .bg(Color::Rgb(0x7a, 0x83, 0x82))
                    .add_modifier(Modifier::BOLD),
            );

        f.render_stateful_widget(table, area, self.table.state_mut());
    }

    fn draw_table_footer(&self, f: &mut Frame, area: Rect) {
        let mut text = format!(
            "# Projects: {} | Shown: {} | Selected: {}",
            self.table.len(),
            self.table.visible_len(),
            self.table.selected_len()
        );

        if self.table.is_filtering() || !self.table.filter().is_empty() {
            text.push_str(&format!(" | Filter: {}", self.table.filter()));
            if self.table.is_filtering() {
                text.push('▏');
            }
        }

        let footer = Paragraph::new(text)
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Right);
        f.render_widget(footer, area);
    }

    fn draw_status(&self, f: &mut Frame, area: Rect) {
        let line = if self.working {
            let frame = SPINNER[self.spinner_frame % SPINNER.len()];
            Line::from(vec![
                Span::styled(format!(" {frame} "), Style::default().fg(SUCCESS)),
                Span::raw(format!("{}...", self.message)),
            ])
        } else {
            Line::from(Span::raw(format!(" {}", self.message)))
        };

        f.render_widget(Paragraph::new(line), area);
    }

    fn gauge_visible(&self) -> bool {
        self.batches
            .progress()
            .is_some_and(|progress| progress.shows_gauge())
    }

    fn draw_progress(&self, f: &mut Frame, area: Rect) {
        let Some(progress) = self.batches.progress() else {
            return;
        };

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(SUCCESS))
            .ratio(progress.fraction().clamp(0.0, 1.0))
            .label(format!("{} {}/{}", progress.kind.title(), progress.completed, progress.total));
        f.render_widget(gauge, area);
    }

    fn draw_help(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = if self.show_help {
            keymap::FULL_HELP
                .iter()
                .map(|entries| Line::from(keymap::help_line(entries)))
                .collect()
        } else {
            vec![Line::from(keymap::help_line(keymap::SHORT_HELP))]
        };

        let help = Paragraph::new(lines).style(Style::default().add_modifier(Modifier::DIM));
        f.render_widget(help, area);
    }

    fn draw_confirmation(&self, f: &mut Frame) {
        let (yes, no) = match self.confirm.choice() {
            Decision::Yes => ("[ Yes ]", "  No  "),
            Decision::No => ("  Yes  ", "[ No ]"),
        };
        let targets = self.pending.as_ref().map_or(0, |pending| pending.targets.len());
        let body = format!(
            "{}\n{} project(s)\n\n{}   {}",
            self.confirm.question(),
            targets,
            yes,
            no
        );

        let popup = Popup::new(body.as_str())
            .title(" Terraform Apply ")
            .style(Style::default().fg(WARNING));
        f.render_widget(&popup, f.area());
    }

    fn draw_output(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(f.area());

        let header = Paragraph::new(self.output.header())
            .style(Style::default().fg(HEADER).add_modifier(Modifier::BOLD));
        f.render_widget(header, chunks[0]);

        let body = Paragraph::new(self.output.content().to_string())
            .wrap(Wrap { trim: false })
            .scroll((self.output.scroll(), 0));
        f.render_widget(body, chunks[1]);

        let percent = self.output.scroll_percent(chunks[1].height as usize);
        let footer = Paragraph::new(format!("{:3.0}%", percent))
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Right);
        f.render_widget(footer, chunks[2]);
    }
}

fn project_row(project: &Project, selected: bool) -> Row<'static> {
    let marker = if selected { " * " } else { "   " };
    let [add, change, destroy] = project.changes.cells();
    let change_style = match project.changes {
        ChangeSummary::PlanError => Style::default().fg(ERROR),
        ChangeSummary::DriftError => Style::default().fg(WARNING),
        _ => Style::default(),
    };
    let validity_style = match project.validity {
        Validity::Valid => Style::default().fg(SUCCESS),
        Validity::Invalid => Style::default().fg(ERROR),
        Validity::Unknown => Style::default().add_modifier(Modifier::DIM),
    };

    Row::new(vec![
        Cell::from(marker),
        Cell::from(project.name.clone()).style(Style::default().fg(Color::Rgb(0x88, 0x88, 0xff))),
        Cell::from(utils::get_relative_path(&project.path))
            .style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM)),
        Cell::from(project.validity.symbol()).style(validity_style),
        Cell::from(add).style(change_style),
        Cell::from(change).style(change_style),
        Cell::from(destroy).style(change_style),
        Cell::from(project.format_last_modified()).style(Style::default().add_modifier(Modifier::DIM)),
    ])
}
