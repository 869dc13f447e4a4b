//! # Console Interface Module
//!
//! Interactive terminal monitor for the SRAM controller. The clock only advances on
//! request (single step) or while free-running, so every cycle can be inspected.
//!
//! ## Keys
//! - `0`-`9`, `a`-`f`: set the write data nibble
//! - `w` / `r`: assert a write / read request, `n`: drop `enable`
//! - `space`: one clock edge, `p`: toggle free-running clock
//! - `x`: pulse reset, `h`: help, `q` / `Esc`: quit

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::SimResult;
use crate::pin::PinValue;
use crate::testbench::{TraceEntry, Testbench};

/// Console configuration structure, read from the `console` section of a bench config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub refresh_rate_ms: u64,
    /// Clock period while free-running, in wall-clock milliseconds.
    pub run_step_ms: u64,
    pub trace_rows: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 50,
            run_step_ms: 250,
            trace_rows: 12,
        }
    }
}

/// Console UI application state
pub struct ConsoleApp {
    bench: Testbench,
    config: ConsoleConfig,
    running: bool,
    free_running: bool,
    show_help: bool,
    data_in: u8,
    enable: bool,
    read_not_write: bool,
    status: String,
}

impl ConsoleApp {
    pub fn new(bench: Testbench, config: ConsoleConfig) -> Self {
        Self {
            bench,
            config,
            running: false,
            free_running: false,
            show_help: false,
            data_in: 0,
            enable: false,
            read_not_write: false,
            status: "Ready".to_string(),
        }
    }

    pub fn run(&mut self) -> SimResult<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);
        let restored = restore_terminal(&mut terminal);

        result.and(restored)
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> SimResult<()> {
        self.running = true;
        let refresh = Duration::from_millis(self.config.refresh_rate_ms.max(1));
        let run_step = Duration::from_millis(self.config.run_step_ms.max(1));
        let mut last_step = Instant::now();

        while self.running {
            terminal.draw(|f| self.draw_ui(f))?;

            if event::poll(refresh)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key.code);
                    }
                }
            }

            if self.free_running && last_step.elapsed() >= run_step {
                self.step();
                last_step = Instant::now();
            }
        }

        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyCode) {
        if self.show_help {
            // Any key returns to the main view
            self.show_help = false;
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.running = false;
                self.free_running = false;
            }
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('w') | KeyCode::Char('W') => {
                self.enable = true;
                self.read_not_write = false;
                self.apply_inputs();
                self.status = format!("Write {:X} requested", self.data_in);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.enable = true;
                self.read_not_write = true;
                self.apply_inputs();
                self.status = "Read requested".to_string();
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.enable = false;
                self.apply_inputs();
                self.status = "Enable released".to_string();
            }
            KeyCode::Char(' ') => self.step(),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.free_running = !self.free_running;
                self.status = if self.free_running {
                    "Clock running".to_string()
                } else {
                    "Clock paused".to_string()
                };
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.enable = false;
                match self.bench.apply_reset(1) {
                    Ok(()) => self.status = "Reset pulsed".to_string(),
                    Err(e) => self.status = e.to_string(),
                }
            }
            KeyCode::Char(c) if c.is_ascii_hexdigit() => {
                if let Some(d) = c.to_digit(16) {
                    self.data_in = d as u8;
                    self.apply_inputs();
                    self.status = format!("Data set to {:X}", self.data_in);
                }
            }
            _ => {}
        }
    }

    fn apply_inputs(&mut self) {
        self.bench
            .set_inputs(self.enable, self.read_not_write, self.data_in);
    }

    fn step(&mut self) {
        match self.bench.step() {
            Ok(report) => {
                self.status = format!("Cycle {}", report.cycle);
            }
            Err(e) => {
                info!(error = %e, "console step stopped by monitor");
                self.free_running = false;
                self.status = e.to_string();
            }
        }
    }

    pub fn bench(&self) -> &Testbench {
        &self.bench
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Text shown in the controller pane.
    pub fn controller_lines(&self) -> Vec<String> {
        let dut = self.bench.dut();
        let signals = dut.signals();
        let (data_out, ready) = self.bench.get_outputs();
        vec![
            format!("Cycle:     {}", self.bench.clock().cycle()),
            format!("Sim time:  {} ns", self.bench.clock().elapsed().as_nanos()),
            format!("Reset:     {}", if dut.in_reset() { "asserted" } else { "released" }),
            format!("State:     {}", dut.state().to_str()),
            format!("Ready:     {}", ready as u8),
            format!(
                "WL/WE/RE:  {}/{}/{}",
                signals.wordline as u8, signals.write_enable as u8, signals.read_enable as u8
            ),
            format!("data_out:  {:b} ({:X})", data_out, data_out),
            format!("uo_out:    {:08b}", dut.uo_out()),
            format!("Accepted:  {}  Dropped: {}", dut.accepted_requests(), dut.dropped_requests()),
        ]
    }

    /// Text shown in the bus pane.
    pub fn bus_lines(&self) -> Vec<String> {
        let dut = self.bench.dut();
        let bus = dut.bus_lines();
        let mut lines = vec![format!("BL  (3..0): {}", bus.bl_string())];
        lines.push(format!("BLB (3..0): {}", bus.blb_string()));
        lines.push(format!(
            "Contention: {}",
            if dut.bus_contention() { "YES" } else { "no" }
        ));
        lines.push(format!("Cells:      {:b}", dut.storage().contents()));
        let uio: String = dut.uio_pins().iter().rev().map(PinValue::to_char).collect();
        lines.push(format!("uio:        {}", uio));
        lines
    }

    /// Text shown in the input pane.
    pub fn input_lines(&self) -> Vec<String> {
        vec![
            format!("enable:     {}", self.enable as u8),
            format!("read/write: {}", if self.read_not_write { "read" } else { "write" }),
            format!("data_in:    {:04b} ({:X})", self.data_in, self.data_in),
            format!("ui_in:      {:08b}", self.bench.dut().ui_in()),
            format!("Violations: {}", self.bench.violations().len()),
        ]
    }

    fn draw_ui(&self, f: &mut Frame) {
        let size = f.size();

        if self.show_help {
            self.draw_help_screen(f);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Title bar
                Constraint::Length(11), // Signals
                Constraint::Min(5),    // Trace
                Constraint::Length(3), // Status bar
            ])
            .split(size);

        let title_text = vec![
            Line::from(vec![Span::styled(
                "4-bit SRAM Controller Console",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(vec![
                Span::styled("0-f", Style::default().fg(Color::Yellow)),
                Span::raw("=data, "),
                Span::styled("w/r/n", Style::default().fg(Color::Yellow)),
                Span::raw("=write/read/release, "),
                Span::styled("space", Style::default().fg(Color::Yellow)),
                Span::raw("=tick, "),
                Span::styled("h", Style::default().fg(Color::Yellow)),
                Span::raw("=help"),
            ]),
        ];
        let title = Paragraph::new(title_text)
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        f.render_widget(title, chunks[0]);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(chunks[1]);

        Self::draw_text_pane(f, panes[0], "Controller", self.controller_lines());
        Self::draw_text_pane(f, panes[1], "Bitline Bus", self.bus_lines());
        Self::draw_text_pane(f, panes[2], "Inputs", self.input_lines());

        self.draw_trace(f, chunks[2]);

        let status_bar = Paragraph::new(self.status.as_str())
            .style(Style::default().fg(Color::White))
            .block(Block::default().borders(Borders::ALL).title("Message"));
        f.render_widget(status_bar, chunks[3]);
    }

    fn draw_text_pane(f: &mut Frame, area: Rect, title: &str, lines: Vec<String>) {
        let text: Vec<Line> = lines.into_iter().map(Line::from).collect();
        let widget = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false });
        f.render_widget(widget, area);
    }

    fn draw_trace(&self, f: &mut Frame, area: Rect) {
        let mut rows = vec![Line::from(Span::styled(
            TraceEntry::header(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        let entries: Vec<&TraceEntry> = self.bench.trace().collect();
        let skip = entries.len().saturating_sub(self.config.trace_rows);
        rows.extend(
            entries
                .into_iter()
                .skip(skip)
                .map(|e| Line::from(e.to_row())),
        );

        let widget = Paragraph::new(rows)
            .block(Block::default().borders(Borders::ALL).title("Trace"));
        f.render_widget(widget, area);
    }

    fn draw_help_screen(&self, f: &mut Frame) {
        let size = f.size();
        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(k, Style::default().fg(Color::Yellow)),
                Span::raw(what),
            ])
        };
        let help_text = vec![
            Line::from(vec![Span::styled(
                "4-bit SRAM Controller Console Help",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            key("  0-9, a-f", " - Set write data nibble"),
            key("  w", " - Assert enable with a write request"),
            key("  r", " - Assert enable with a read request"),
            key("  n", " - Release enable"),
            key("  space", " - Advance one clock edge"),
            key("  p", " - Start/stop the free-running clock"),
            key("  x", " - Pulse reset (rst_n low for one cycle)"),
            key("  q, Esc", " - Quit"),
            Line::from(""),
            Line::from(vec![Span::raw(
                "Requests made while ready is low are dropped and counted as violations.",
            )]),
            Line::from(""),
            Line::from(vec![Span::raw("Press any key to return to main view...")]),
        ];

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Help"));
        f.render_widget(help, size);
    }
}

/// Runs every restore step even if an earlier one fails and returns the first error.
fn restore_terminal<W: io::Write>(terminal: &mut Terminal<CrosstermBackend<W>>) -> SimResult<()> {
    let steps = [
        disable_raw_mode(),
        execute!(terminal.backend_mut(), LeaveAlternateScreen),
        terminal.show_cursor(),
    ];
    first_error(steps)
}

fn first_error(steps: impl IntoIterator<Item = io::Result<()>>) -> SimResult<()> {
    let mut first = None;
    for step in steps {
        if let Err(e) = step {
            first.get_or_insert(e);
        }
    }
    match first {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Public interface for launching the console
pub fn run_console(bench: Testbench, config: ConsoleConfig) -> SimResult<()> {
    let mut app = ConsoleApp::new(bench, config);
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::types::Nibble;

    fn app() -> ConsoleApp {
        ConsoleApp::new(Testbench::new(), ConsoleConfig::default())
    }

    #[test]
    fn test_write_then_read_through_keys() {
        let mut app = app();
        for key in ['a', 'w', ' ', 'n', ' ', 'r', ' ', 'n', ' '] {
            app.handle_key_event(KeyCode::Char(key));
        }
        assert_eq!(app.bench().dut().data_out(), Nibble::new(0xA));
        assert!(app.bench().dut().ready());
        assert!(app.bench().violations().is_empty());
        assert_eq!(app.status(), "Cycle 4");
    }

    #[test]
    fn test_help_toggles_and_swallows_next_key() {
        let mut app = app();
        app.handle_key_event(KeyCode::Char('h'));
        app.handle_key_event(KeyCode::Char('w'));
        assert_eq!(app.bench().dut().ui_in(), 0);
        app.handle_key_event(KeyCode::Char('w'));
        assert_eq!(app.bench().dut().ui_in(), 0x20);
    }

    #[test]
    fn test_reset_key_clears_output() {
        let mut app = app();
        for key in ['5', 'w', ' ', 'n', ' ', 'r', ' ', 'n', ' '] {
            app.handle_key_event(KeyCode::Char(key));
        }
        assert_eq!(app.bench().dut().data_out(), Nibble::new(0x5));
        app.handle_key_event(KeyCode::Char('x'));
        assert_eq!(app.bench().dut().data_out(), Nibble::ZERO);
        assert_eq!(app.status(), "Reset pulsed");
    }

    #[test]
    fn test_pane_text() {
        let mut app = app();
        app.handle_key_event(KeyCode::Char('3'));
        app.handle_key_event(KeyCode::Char('w'));
        app.handle_key_event(KeyCode::Char(' '));
        assert!(app.bus_lines()[0].ends_with("0011"));
        assert!(app.bus_lines()[1].ends_with("1100"));
        assert!(app.controller_lines()[3].ends_with("ACTIVE"));
        assert!(app.input_lines()[2].contains("0011"));
    }

    #[test]
    fn test_restore_keeps_first_failure() {
        let failed = |msg: &str| -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, msg.to_string()))
        };
        let err = first_error(vec![failed("raw mode"), Ok(()), failed("cursor")]).unwrap_err();
        assert!(matches!(err, SimError::Terminal(_)));
        assert_eq!(err.to_string(), "terminal error: raw mode");

        assert!(first_error(vec![Ok(()), Ok(())]).is_ok());
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        app.handle_key_event(KeyCode::Esc);
        assert!(!app.is_running());
    }
}
