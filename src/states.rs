//! Screen state machine.
//!
//! Exactly one [`State`] is active. A handler asks for a change through
//! [`TransitionSlot::request_transition`]; the [`StateManager`] applies the
//! request as soon as the delegated call returns, before any further input
//! is processed. There is no queue: if one call requests twice, the last
//! request wins. The outgoing state is simply dropped.

use std::time::Duration;

use crate::compute::{init_arena, player_fire, tick, Arena, Verdict};
use crate::display::{Align, Backdrop, Canvas, Sprite, TextStyle};
use crate::entities::{DEFAULT_HP, FIELD_HEIGHT, FIELD_WIDTH};
use crate::error::Result;
use crate::input::{HeldKeys, Key};
use crate::score::{now_ts, Leaderboard, MAX_NAME_LEN};
use crate::session::Session;

const CX: i32 = FIELD_WIDTH / 2;
const CY: i32 = FIELD_HEIGHT / 2;
const LINE: i32 = 40;

// ── Identifiers and payloads ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateId {
    Boot,
    Info,
    Play,
    Win,
    Lose,
    GlobalLose,
    Fin,
    Ranking,
}

/// A destination state together with the data its `enter` needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Boot,
    /// Tutorial screen shown before `level`.
    Info { level: usize, hp: Option<i32> },
    /// `hp: None` starts the level with the default HP.
    Play { level: usize, hp: Option<i32> },
    Win { next: Option<usize>, hp: i32 },
    Lose { level: usize, hp: i32 },
    GlobalLose { level: usize },
    Fin { score: i32 },
    Ranking,
}

impl Transition {
    pub fn id(&self) -> StateId {
        match self {
            Transition::Boot => StateId::Boot,
            Transition::Info { .. } => StateId::Info,
            Transition::Play { .. } => StateId::Play,
            Transition::Win { .. } => StateId::Win,
            Transition::Lose { .. } => StateId::Lose,
            Transition::GlobalLose { .. } => StateId::GlobalLose,
            Transition::Fin { .. } => StateId::Fin,
            Transition::Ranking => StateId::Ranking,
        }
    }
}

/// Holds at most one pending transition.
#[derive(Debug, Default)]
pub struct TransitionSlot {
    pending: Option<Transition>,
}

impl TransitionSlot {
    /// Record a transition, replacing any earlier request from the same call.
    pub fn request_transition(&mut self, next: Transition) {
        if let Some(previous) = self.pending.replace(next) {
            tracing::debug!(?previous, "transition request superseded");
        }
    }

    pub fn pending(&self) -> Option<&Transition> {
        self.pending.as_ref()
    }

    pub fn take(&mut self) -> Option<Transition> {
        self.pending.take()
    }
}

/// Where "start level N" leads: through INFO when the level has a briefing.
pub fn enter_level(session: &Session, level: usize, hp: Option<i32>) -> Transition {
    if session.levels.has_briefing(level) {
        Transition::Info { level, hp }
    } else {
        Transition::Play { level, hp }
    }
}

/// A lost HP either retries the level or ends the run.
pub fn lose_transition(level: usize, hp: i32) -> Transition {
    if hp < 0 {
        Transition::GlobalLose { level }
    } else {
        Transition::Lose { level, hp }
    }
}

/// A cleared level leads to WIN, or straight to FIN after the last level.
pub fn clear_transition(session: &Session, level: usize, hp: i32) -> Transition {
    match session.levels.next_index(level) {
        Some(next) => Transition::Win {
            next: Some(next),
            hp,
        },
        None => Transition::Fin {
            score: session.run.ledger.final_score(hp),
        },
    }
}

// ── Boot ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Play,
    Ranking,
}

#[derive(Debug)]
pub struct BootState {
    pub selected: MenuItem,
}

impl BootState {
    fn enter() -> Self {
        BootState {
            selected: MenuItem::Play,
        }
    }

    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        match key {
            Key::Up | Key::Down => {
                self.selected = match self.selected {
                    MenuItem::Play => MenuItem::Ranking,
                    MenuItem::Ranking => MenuItem::Play,
                };
            }
            Key::Enter => match self.selected {
                MenuItem::Play => {
                    session.new_game();
                    slot.request_transition(enter_level(session, 0, None));
                }
                MenuItem::Ranking => slot.request_transition(Transition::Ranking),
            },
            k if k.is_quit() => session.request_quit(),
            _ => {}
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.backdrop(Backdrop::Space);
        canvas.text("T A R G E T   S H O O T E R", CX, CY - 3 * LINE, Align::Center, TextStyle::Title);
        let items = [(MenuItem::Play, "Play"), (MenuItem::Ranking, "Ranking")];
        for (i, (item, label)) in items.iter().enumerate() {
            let (text, style) = if *item == self.selected {
                (format!("> {label} <"), TextStyle::Highlight)
            } else {
                (label.to_string(), TextStyle::Body)
            };
            canvas.text(&text, CX, CY + i as i32 * LINE, Align::Center, style);
        }
        canvas.text("↑ ↓ choose   ENTER select", CX, CY + 3 * LINE, Align::Center, TextStyle::Hint);
    }
}

// ── Info ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InfoState {
    pub level: usize,
    pub hp: Option<i32>,
    pub lines: Vec<String>,
}

impl InfoState {
    fn enter(session: &Session, level: usize, hp: Option<i32>) -> Result<Self> {
        let lines = session.levels.get(level)?.briefing.clone();
        Ok(InfoState { level, hp, lines })
    }

    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        match key {
            Key::Enter => slot.request_transition(Transition::Play {
                level: self.level,
                hp: self.hp,
            }),
            k if k.is_quit() => session.request_quit(),
            _ => {}
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.backdrop(Backdrop::Plain);
        let title = format!("Level {}", self.level + 1);
        let top = CY - (self.lines.len() as i32 + 2) * LINE / 2;
        canvas.text(&title, CX, top, Align::Center, TextStyle::Title);
        for (i, line) in self.lines.iter().enumerate() {
            canvas.text(line, CX, top + (i as i32 + 2) * LINE, Align::Center, TextStyle::Body);
        }
        let bottom = top + (self.lines.len() as i32 + 3) * LINE;
        canvas.text("ENTER to start", CX, bottom, Align::Center, TextStyle::Hint);
    }
}

// ── Play ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct PlayState {
    pub arena: Arena,
    pub elapsed: Duration,
}

impl PlayState {
    fn enter(session: &Session, level: usize, hp: Option<i32>) -> Result<Self> {
        let loaded = session.levels.load(level, &session.run.collected_hp)?;
        let hp = hp.unwrap_or(DEFAULT_HP);
        Ok(PlayState {
            arena: init_arena(loaded, hp, session.field),
            elapsed: Duration::ZERO,
        })
    }

    fn handle_event(&mut self, key: Key, session: &mut Session) {
        if key.is_fire() {
            player_fire(&mut self.arena, &session.run);
        } else if key.is_quit() {
            session.request_quit();
        }
    }

    fn update(&mut self, dt: Duration, held: HeldKeys, session: &mut Session, slot: &mut TransitionSlot) {
        self.elapsed += dt;
        let level = self.arena.level.index;
        for verdict in tick(&mut self.arena, held, &mut session.run) {
            let next = match verdict {
                Verdict::Lost { hp } => lose_transition(level, hp),
                Verdict::Cleared { hp } => clear_transition(session, level, hp),
            };
            slot.request_transition(next);
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas, session: &Session) {
        let arena = &self.arena;
        canvas.backdrop(Backdrop::Space);

        for target in &arena.level.targets {
            canvas.sprite(Sprite::Target { dead: target.dead }, target.rect);
        }
        for turret in &arena.level.turrets {
            let sprite = Sprite::Turret {
                direction: turret.direction,
                active: turret.active,
            };
            canvas.sprite(sprite, turret.rect);
        }
        for powerup in arena.level.powerups.iter().filter(|p| !p.collected) {
            canvas.sprite(Sprite::PowerUp(powerup.kind), powerup.rect);
        }
        for shot in arena.player_shots.iter().chain(&arena.enemy_shots) {
            let sprite = Sprite::Projectile {
                direction: shot.direction,
                source: shot.source,
            };
            canvas.sprite(sprite, shot.rect);
        }
        canvas.sprite(Sprite::Ship(arena.ship.facing), arena.ship.rect);

        let hud = format!(
            "Level {}/{}   HP {}   Ammo {}   Bank {}   {:>4.1}s",
            arena.level.index + 1,
            session.levels.count(),
            arena.hp,
            arena.level.ammo,
            session.run.ledger.unused_ammo,
            self.elapsed.as_secs_f32(),
        );
        canvas.text(&hud, 0, 0, Align::Left, TextStyle::Hud);
    }
}

// ── Win ───────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WinState {
    pub next: Option<usize>,
    pub hp: i32,
}

impl WinState {
    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        match key {
            Key::Enter => {
                let next = match self.next {
                    Some(level) => enter_level(session, level, Some(self.hp)),
                    None => Transition::Fin {
                        score: session.run.ledger.final_score(self.hp),
                    },
                };
                slot.request_transition(next);
            }
            k if k.is_quit() => session.request_quit(),
            _ => {}
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.backdrop(Backdrop::Plain);
        canvas.text("You win!", CX, CY - LINE, Align::Center, TextStyle::Title);
        canvas.text(&format!("HP left: {}", self.hp), CX, CY, Align::Center, TextStyle::Body);
        canvas.text("ENTER continue   ESC quit", CX, CY + LINE, Align::Center, TextStyle::Hint);
    }
}

// ── Lose ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LoseState {
    pub level: usize,
    pub hp: i32,
}

impl LoseState {
    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        match key {
            Key::Enter | Key::Char('r') | Key::Char('R') => slot.request_transition(Transition::Play {
                level: self.level,
                hp: Some(self.hp),
            }),
            k if k.is_quit() => session.request_quit(),
            _ => {}
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.backdrop(Backdrop::Plain);
        canvas.text("You lost!", CX, CY - LINE, Align::Center, TextStyle::Title);
        canvas.text(&format!("HP left: {}", self.hp), CX, CY, Align::Center, TextStyle::Body);
        canvas.text("ENTER/R retry   ESC quit", CX, CY + LINE, Align::Center, TextStyle::Hint);
    }
}

// ── Global lose ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct GlobalLoseState {
    pub level: usize,
}

impl GlobalLoseState {
    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        match key {
            Key::Enter => {
                session.new_game();
                slot.request_transition(enter_level(session, 0, None));
            }
            k if k.is_quit() => session.request_quit(),
            _ => {}
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.backdrop(Backdrop::Plain);
        canvas.text("GAME OVER", CX, CY - LINE, Align::Center, TextStyle::Title);
        let reached = format!("Reached level {}", self.level + 1);
        canvas.text(&reached, CX, CY, Align::Center, TextStyle::Body);
        canvas.text("ENTER start over   ESC quit", CX, CY + LINE, Align::Center, TextStyle::Hint);
    }
}

// ── Finished ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum FinPhase {
    NameEntry { name: String },
    Board(Leaderboard),
}

#[derive(Debug)]
pub struct FinState {
    pub score: i32,
    pub phase: FinPhase,
}

impl FinState {
    fn enter(score: i32) -> Self {
        FinState {
            score,
            phase: FinPhase::NameEntry {
                name: String::new(),
            },
        }
    }

    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        if key == Key::Escape {
            session.request_quit();
            return;
        }
        match &mut self.phase {
            FinPhase::NameEntry { name } => match key {
                Key::Char(c) if !c.is_control() && name.chars().count() < MAX_NAME_LEN => {
                    name.push(c);
                }
                Key::Backspace => {
                    name.pop();
                }
                Key::Enter if !name.is_empty() => {
                    let name = name.clone();
                    self.phase = FinPhase::Board(record_score(session, &name, self.score));
                }
                _ => {}
            },
            FinPhase::Board(_) => match key {
                Key::Enter => {
                    session.new_game();
                    slot.request_transition(enter_level(session, 0, None));
                }
                k if k.is_quit() => session.request_quit(),
                _ => {}
            },
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.backdrop(Backdrop::Plain);
        match &self.phase {
            FinPhase::NameEntry { name } => {
                canvas.text("Game complete!", CX, CY - 2 * LINE, Align::Center, TextStyle::Title);
                let score = format!("Score: {}", self.score);
                canvas.text(&score, CX, CY - LINE, Align::Center, TextStyle::Highlight);
                canvas.text(&format!("Name: {name}_"), CX, CY + LINE, Align::Center, TextStyle::Body);
                canvas.text("type your name, ENTER to save", CX, CY + 2 * LINE, Align::Center, TextStyle::Hint);
            }
            FinPhase::Board(board) => {
                draw_board(canvas, board);
                canvas.text("ENTER play again   ESC quit", CX, FIELD_HEIGHT - 2 * LINE, Align::Center, TextStyle::Hint);
            }
        }
    }
}

/// Persist the result; if the store fails, show the result on the last
/// board we could read instead.
fn record_score(session: &mut Session, name: &str, score: i32) -> Leaderboard {
    match session.scores.save(name, score) {
        Ok(board) => board,
        Err(e) => {
            tracing::warn!(error = %e, "failed to save score");
            let mut board = session.scores.load().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to reload scores, showing this result alone");
                Leaderboard::default()
            });
            board.insert(name, score, now_ts());
            board
        }
    }
}

fn draw_board(canvas: &mut dyn Canvas, board: &Leaderboard) {
    canvas.text("RANKING", CX, 3 * LINE, Align::Center, TextStyle::Title);
    if board.entries().is_empty() {
        canvas.text("no scores yet", CX, 5 * LINE, Align::Center, TextStyle::Body);
    }
    for (i, entry) in board.entries().iter().enumerate() {
        let line = format!("{:>2}. {:<10} {:>6}", i + 1, entry.name, entry.score);
        canvas.text(&line, CX, (5 + i as i32) * LINE, Align::Center, TextStyle::Body);
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct RankingState {
    pub board: Leaderboard,
}

impl RankingState {
    fn enter(session: &Session) -> Self {
        let board = session.scores.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load scores");
            Leaderboard::default()
        });
        RankingState { board }
    }

    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        match key {
            Key::Enter | Key::Backspace => slot.request_transition(Transition::Boot),
            k if k.is_quit() => session.request_quit(),
            _ => {}
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.backdrop(Backdrop::Plain);
        draw_board(canvas, &self.board);
        canvas.text("ENTER back   ESC quit", CX, FIELD_HEIGHT - 2 * LINE, Align::Center, TextStyle::Hint);
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum State {
    Boot(BootState),
    Info(InfoState),
    Play(Box<PlayState>),
    Win(WinState),
    Lose(LoseState),
    GlobalLose(GlobalLoseState),
    Fin(FinState),
    Ranking(RankingState),
}

impl State {
    /// Build the state a transition names. All setup happens here; nothing
    /// is inherited from the state being replaced.
    pub fn enter(transition: Transition, session: &Session) -> Result<State> {
        let state = match transition {
            Transition::Boot => State::Boot(BootState::enter()),
            Transition::Info { level, hp } => State::Info(InfoState::enter(session, level, hp)?),
            Transition::Play { level, hp } => State::Play(Box::new(PlayState::enter(session, level, hp)?)),
            Transition::Win { next, hp } => State::Win(WinState { next, hp }),
            Transition::Lose { level, hp } => State::Lose(LoseState { level, hp }),
            Transition::GlobalLose { level } => State::GlobalLose(GlobalLoseState { level }),
            Transition::Fin { score } => State::Fin(FinState::enter(score)),
            Transition::Ranking => State::Ranking(RankingState::enter(session)),
        };
        Ok(state)
    }

    pub fn id(&self) -> StateId {
        match self {
            State::Boot(_) => StateId::Boot,
            State::Info(_) => StateId::Info,
            State::Play(_) => StateId::Play,
            State::Win(_) => StateId::Win,
            State::Lose(_) => StateId::Lose,
            State::GlobalLose(_) => StateId::GlobalLose,
            State::Fin(_) => StateId::Fin,
            State::Ranking(_) => StateId::Ranking,
        }
    }

    fn handle_event(&mut self, key: Key, session: &mut Session, slot: &mut TransitionSlot) {
        match self {
            State::Boot(s) => s.handle_event(key, session, slot),
            State::Info(s) => s.handle_event(key, session, slot),
            State::Play(s) => s.handle_event(key, session),
            State::Win(s) => s.handle_event(key, session, slot),
            State::Lose(s) => s.handle_event(key, session, slot),
            State::GlobalLose(s) => s.handle_event(key, session, slot),
            State::Fin(s) => s.handle_event(key, session, slot),
            State::Ranking(s) => s.handle_event(key, session, slot),
        }
    }

    fn update(&mut self, dt: Duration, held: HeldKeys, session: &mut Session, slot: &mut TransitionSlot) {
        if let State::Play(s) = self {
            s.update(dt, held, session, slot);
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas, session: &Session) {
        match self {
            State::Boot(s) => s.draw(canvas),
            State::Info(s) => s.draw(canvas),
            State::Play(s) => s.draw(canvas, session),
            State::Win(s) => s.draw(canvas),
            State::Lose(s) => s.draw(canvas),
            State::GlobalLose(s) => s.draw(canvas),
            State::Fin(s) => s.draw(canvas),
            State::Ranking(s) => s.draw(canvas),
        }
    }
}

// ── Manager ───────────────────────────────────────────────────────────────────

pub struct StateManager {
    state: State,
    session: Session,
    slot: TransitionSlot,
}

impl StateManager {
    pub fn new(session: Session, first: Transition) -> Result<Self> {
        tracing::info!(to = ?first.id(), "initial state");
        let state = State::enter(first, &session)?;
        Ok(StateManager {
            state,
            session,
            slot: TransitionSlot::default(),
        })
    }

    /// Replace the active state immediately.
    pub fn change(&mut self, next: Transition) -> Result<()> {
        tracing::info!(from = ?self.state.id(), to = ?next.id(), payload = ?next, "state change");
        self.state = State::enter(next, &self.session)?;
        Ok(())
    }

    pub fn handle_event(&mut self, key: Key) -> Result<()> {
        self.state.handle_event(key, &mut self.session, &mut self.slot);
        self.apply_pending()
    }

    pub fn update(&mut self, dt: Duration, held: HeldKeys) -> Result<()> {
        self.state.update(dt, held, &mut self.session, &mut self.slot);
        self.apply_pending()
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        self.state.draw(canvas, &self.session);
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn should_quit(&self) -> bool {
        self.session.should_quit()
    }

    fn apply_pending(&mut self) -> Result<()> {
        match self.slot.take() {
            Some(next) => self.change(next),
            None => Ok(()),
        }
    }
}
