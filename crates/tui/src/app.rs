use std::{
    io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use taleweaver_core::{
    select_hand, AssetSource, CardAssets, Effect, ImagePool, Msg, Timings, WidgetState, HAND_SIZE,
};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};

use crate::view::{self, HitMap, Target, Theme, ViewContext};

const FRAME_RATE: Duration = Duration::from_millis(33);

enum AppEvent {
    Input(Event),
    Tick,
    Widget(Msg),
}

/// Turns delayed messages into events on the loop's channel.
trait Scheduler {
    fn schedule(&self, after: Duration, msg: Msg);
}

struct TokioScheduler {
    sender: mpsc::Sender<AppEvent>,
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, after: Duration, msg: Msg) {
        let sender = self.sender.clone();
        spawn(async move {
            tokio::time::sleep(after).await;
            let _ = sender.send(AppEvent::Widget(msg)).await;
        });
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Widget(Msg),
    Focus(isize),
    FlipFocused,
    Quit,
}

/// Terminal frontend owning the widget state and its side effects.
pub struct TaleWeaverApp {
    widget: WidgetState,
    pool: ImagePool,
    assets: CardAssets,
    rng: StdRng,
    theme: Theme,
    hits: HitMap,
    focus: usize,
    should_quit: bool,
}

impl TaleWeaverApp {
    pub fn new(pool: ImagePool, assets: CardAssets, rng: StdRng, timings: Timings) -> Self {
        Self {
            widget: WidgetState::new(timings),
            pool,
            assets,
            rng,
            theme: Theme::default(),
            hits: HitMap::default(),
            focus: 0,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        let scheduler = TokioScheduler {
            sender: event_tx.clone(),
        };

        self.dispatch(Msg::Mounted, &scheduler, &event_tx);

        // Ticks repaint only while an animation ran in the last frame or runs now.
        let mut redraw = true;
        let mut animating = false;
        let result = loop {
            if redraw {
                let now = Instant::now();
                let ctx = ViewContext {
                    theme: &self.theme,
                    now,
                    focus: self.focus,
                };
                let widget = &self.widget;
                let mut hits = HitMap::default();
                if let Err(err) = terminal.draw(|frame| hits = view::draw(frame, widget, &ctx)) {
                    break Err(err).context("failed to draw frame");
                }
                self.hits = hits;
                animating = self.widget.is_animating(now);
            }

            if self.should_quit {
                break Ok(());
            }

            redraw = match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    self.handle_input(event, &scheduler, &event_tx);
                    true
                }
                Some(AppEvent::Tick) => animating || self.widget.is_animating(Instant::now()),
                Some(AppEvent::Widget(msg)) => {
                    self.dispatch(msg, &scheduler, &event_tx);
                    true
                }
                None => break Ok(()),
            };
        };

        restore_terminal(&mut terminal)?;
        result
    }

    fn handle_input(
        &mut self,
        event: Event,
        scheduler: &impl Scheduler,
        sender: &mpsc::Sender<AppEvent>,
    ) {
        let action = match event {
            Event::Key(key) => map_key(&key),
            Event::Mouse(mouse) => self.map_mouse(&mouse),
            Event::Resize(_, _) | Event::FocusGained | Event::FocusLost | Event::Paste(_) => None,
        };
        let Some(action) = action else {
            return;
        };
        if self.widget.about_visible() && !allowed_under_overlay(&action) {
            debug!(?action, "Ignoring input behind the About overlay");
            return;
        }

        match action {
            Action::Quit => {
                info!("Quit requested");
                self.should_quit = true;
            }
            Action::Focus(delta) => self.move_focus(delta),
            Action::FlipFocused => self.dispatch(Msg::CardClicked(self.focus), scheduler, sender),
            Action::Widget(msg) => {
                if let Msg::CardClicked(index) = msg {
                    self.focus = index;
                }
                self.dispatch(msg, scheduler, sender);
            }
        }
    }

    fn map_mouse(&self, mouse: &MouseEvent) -> Option<Action> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }
        let msg = match self.hits.target(mouse.column, mouse.row)? {
            Target::Card(index) => Msg::CardClicked(index),
            Target::Reshuffle => Msg::Reshuffle,
            Target::About => Msg::ToggleAbout,
            Target::Close => Msg::CloseAbout,
        };
        Some(Action::Widget(msg))
    }

    fn move_focus(&mut self, delta: isize) {
        let len = self.widget.hand().len();
        if len == 0 {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len as isize) as usize;
    }

    /// Feed `msg` to the widget and carry out every effect it produces.
    fn dispatch(&mut self, msg: Msg, scheduler: &impl Scheduler, sender: &mpsc::Sender<AppEvent>) {
        let mut queue = vec![msg];
        while let Some(msg) = queue.pop() {
            debug!(?msg, "Widget message");
            for effect in self.widget.update(msg, Instant::now()) {
                match effect {
                    Effect::Schedule { after, msg } => scheduler.schedule(after, msg),
                    Effect::Deal => {
                        let dealt = select_hand(&self.pool, HAND_SIZE, &mut self.rng);
                        if let Err(err) = &dealt {
                            error!(%err, "Could not deal a hand");
                        }
                        queue.push(Msg::Dealt(dealt));
                    }
                    Effect::LoadFace {
                        generation,
                        slot,
                        image,
                    } => {
                        let assets = self.assets.clone();
                        let sender = sender.clone();
                        spawn(async move {
                            let result = assets.load(image).await;
                            let msg = Msg::FaceLoaded {
                                generation,
                                slot,
                                result,
                            };
                            let _ = sender.send(AppEvent::Widget(msg)).await;
                        });
                    }
                }
            }
        }
        let len = self.widget.hand().len();
        if self.focus >= len {
            self.focus = len.saturating_sub(1);
        }
    }
}

/// The overlay covers the hand, so only quitting and closing it get through.
fn allowed_under_overlay(action: &Action) -> bool {
    matches!(
        action,
        Action::Quit | Action::Widget(Msg::ToggleAbout) | Action::Widget(Msg::CloseAbout)
    )
}

fn map_key(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            if index >= HAND_SIZE {
                return None;
            }
            Action::Widget(Msg::CardClicked(index))
        }
        KeyCode::Char('r') | KeyCode::Char(' ') => Action::Widget(Msg::Reshuffle),
        KeyCode::Char('a') => Action::Widget(Msg::ToggleAbout),
        KeyCode::Esc => Action::Widget(Msg::CloseAbout),
        KeyCode::Left | KeyCode::Char('h') => Action::Focus(-1),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => Action::Focus(1),
        KeyCode::Enter => Action::FlipFocused,
        _ => return None,
    };
    Some(action)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(FRAME_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingScheduler {
        scheduled: RefCell<Vec<(Duration, Msg)>>,
    }

    impl Scheduler for RecordingScheduler {
        fn schedule(&self, after: Duration, msg: Msg) {
            self.scheduled.borrow_mut().push((after, msg));
        }
    }

    impl RecordingScheduler {
        fn fire_all(&self, app: &mut TaleWeaverApp, sender: &mpsc::Sender<AppEvent>) {
            loop {
                let pending: Vec<_> = self.scheduled.borrow_mut().drain(..).collect();
                if pending.is_empty() {
                    break;
                }
                for (_, msg) in pending {
                    app.dispatch(msg, self, sender);
                }
            }
        }
    }

    fn app() -> TaleWeaverApp {
        TaleWeaverApp::new(
            ImagePool::standard(),
            CardAssets::for_root(None),
            StdRng::seed_from_u64(3),
            Timings::default(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(map_key(&key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(
            map_key(&key(KeyCode::Char('2'))),
            Some(Action::Widget(Msg::CardClicked(1)))
        );
        assert_eq!(map_key(&key(KeyCode::Char('7'))), None);
        assert_eq!(
            map_key(&key(KeyCode::Char(' '))),
            Some(Action::Widget(Msg::Reshuffle))
        );
        assert_eq!(
            map_key(&key(KeyCode::Esc)),
            Some(Action::Widget(Msg::CloseAbout))
        );
        assert_eq!(map_key(&key(KeyCode::Left)), Some(Action::Focus(-1)));
        assert_eq!(map_key(&key(KeyCode::Enter)), Some(Action::FlipFocused));
    }

    #[tokio::test]
    async fn mount_deals_and_loads_faces() {
        let (tx, mut rx) = mpsc::channel(16);
        let scheduler = RecordingScheduler::default();
        let mut app = app();

        app.dispatch(Msg::Mounted, &scheduler, &tx);
        assert!(app.widget.is_loading());
        assert_eq!(app.widget.hand().len(), HAND_SIZE);
        scheduler.fire_all(&mut app, &tx);
        assert!(!app.widget.is_loading());

        for _ in 0..HAND_SIZE {
            match rx.recv().await {
                Some(AppEvent::Widget(msg @ Msg::FaceLoaded { .. })) => {
                    app.dispatch(msg, &scheduler, &tx)
                }
                _ => panic!("expected a face load"),
            }
        }
        assert!(app
            .widget
            .hand()
            .iter()
            .all(|card| matches!(card.face, taleweaver_core::FaceStatus::Ready(_))));
    }

    #[tokio::test]
    async fn focus_wraps_and_enter_flips() {
        let (tx, _rx) = mpsc::channel(16);
        let scheduler = RecordingScheduler::default();
        let mut app = app();
        app.dispatch(Msg::Mounted, &scheduler, &tx);
        scheduler.fire_all(&mut app, &tx);

        app.handle_input(Event::Key(key(KeyCode::Left)), &scheduler, &tx);
        assert_eq!(app.focus, HAND_SIZE - 1);
        app.handle_input(Event::Key(key(KeyCode::Enter)), &scheduler, &tx);
        assert_eq!(app.widget.flipped(), Some(HAND_SIZE - 1));

        app.handle_input(Event::Key(key(KeyCode::Char('r'))), &scheduler, &tx);
        assert_eq!(app.widget.flipped(), None);
        let before = app.widget.generation();
        scheduler.fire_all(&mut app, &tx);
        assert_eq!(app.widget.generation(), before + 1);

        app.handle_input(Event::Key(key(KeyCode::Char('q'))), &scheduler, &tx);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn about_overlay_blocks_card_keys() {
        let (tx, _rx) = mpsc::channel(16);
        let scheduler = RecordingScheduler::default();
        let mut app = app();
        app.dispatch(Msg::Mounted, &scheduler, &tx);
        scheduler.fire_all(&mut app, &tx);

        app.handle_input(Event::Key(key(KeyCode::Char('a'))), &scheduler, &tx);
        assert!(app.widget.about_visible());
        for code in [
            KeyCode::Char('1'),
            KeyCode::Enter,
            KeyCode::Char('r'),
            KeyCode::Right,
        ] {
            app.handle_input(Event::Key(key(code)), &scheduler, &tx);
        }
        assert_eq!(app.widget.flipped(), None);
        assert!(!app.widget.is_shuffling());
        assert_eq!(app.focus, 0);
        assert!(scheduler.scheduled.borrow().is_empty());

        app.handle_input(Event::Key(key(KeyCode::Esc)), &scheduler, &tx);
        assert!(!app.widget.about_visible());
        app.handle_input(Event::Key(key(KeyCode::Char('1'))), &scheduler, &tx);
        assert_eq!(app.widget.flipped(), Some(0));
    }
}
