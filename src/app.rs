use crate::config::{Config, TransportKind};
use crate::render::PlainRenderer;
use crate::state::{ChatEngine, TranscriptUpdate};
use crate::transport::{DeliveryEvent, PollTransport, PushTransport, Transport};
use crate::{terminal, ui};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct App {
    config: Config,
    engine: ChatEngine,
    delivery_rx: mpsc::UnboundedReceiver<DeliveryEvent>,
    input: String,
    cursor_byte: usize,
    scroll: usize,
    quit: bool,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();

        let transport = match config.transport {
            TransportKind::Push => {
                let mut push = PushTransport::new(&config.server_url, delivery_tx);
                push.connect().await?;
                Transport::Push(push)
            }
            TransportKind::Poll => Transport::Poll(PollTransport::new(
                &config.server_url,
                config.poll_interval_ms,
                delivery_tx,
            )),
        };

        // The terminal draws entry text directly, so the engine renders
        // plain source rather than HTML markup.
        let engine = ChatEngine::new(transport, Arc::new(PlainRenderer));

        Ok(Self {
            config,
            engine,
            delivery_rx,
            input: String::new(),
            cursor_byte: 0,
            scroll: 0,
            quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut term = terminal::setup()?;
        let result = self.run_loop(&mut term).await;
        terminal::restore()?;
        result
    }

    async fn run_loop(&mut self, term: &mut terminal::TerminalType) -> Result<()> {
        let (update_tx, mut update_rx) = mpsc::unbounded_channel::<TranscriptUpdate>();
        let mut dirty = true;

        while !self.quit {
            while let Ok(delivery) = self.delivery_rx.try_recv() {
                self.engine.handle_delivery(delivery, Some(&update_tx));
            }
            while update_rx.try_recv().is_ok() {
                dirty = true;
            }

            if event::poll(INPUT_POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key, &update_tx).await?;
                        dirty = true;
                    }
                }
            }

            if dirty {
                self.draw(term)?;
                dirty = false;
            }
        }

        self.engine.dispose(Some(&update_tx));
        Ok(())
    }

    async fn handle_key(
        &mut self,
        key: KeyEvent,
        update_tx: &mpsc::UnboundedSender<TranscriptUpdate>,
    ) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true;
            }
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                self.cursor_byte = 0;
                self.engine.submit(&text, Some(update_tx)).await?;
            }
            KeyCode::Backspace => {
                if self.cursor_byte > 0 {
                    let start = ui::prev_char_boundary(&self.input, self.cursor_byte);
                    self.input.replace_range(start..self.cursor_byte, "");
                    self.cursor_byte = start;
                }
            }
            KeyCode::Left => {
                self.cursor_byte = ui::prev_char_boundary(&self.input, self.cursor_byte);
            }
            KeyCode::Right => {
                self.cursor_byte = ui::next_char_boundary(&self.input, self.cursor_byte);
            }
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert(self.cursor_byte, ch);
                self.cursor_byte += ch.len_utf8();
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, term: &mut terminal::TerminalType) -> Result<()> {
        let lines = ui::transcript_lines(self.engine.log().entries());
        let status = self.status_line();
        let input = self.input.clone();
        let cursor_byte = self.cursor_byte;
        let scroll = self.scroll;

        term.draw(|frame| {
            let (transcript_area, input_area, status_area) = ui::split_layout(frame.area());
            ui::render_transcript(frame, transcript_area, &lines, scroll);
            ui::render_input(frame, input_area, &input, cursor_byte);
            ui::render_status_line(frame, status_area, &status);
        })?;
        Ok(())
    }

    fn status_line(&self) -> String {
        let mode = match self.config.transport {
            TransportKind::Push => "push",
            TransportKind::Poll => "poll",
        };
        match self.engine.pending_submission() {
            Some(text) => format!("transport:{mode} waiting on \"{text}\""),
            None => format!("transport:{mode} ready {}", self.config.server_url),
        }
    }
}
