//! Page state machine: turns decoded input into resistance changes, page
//! transitions, hardware writes and display updates.
//!
//! All state lives in one owned `PotController`. `dispatch` takes a single
//! `Event` and returns the `Intent`s the caller must carry out; no I/O happens
//! here. Display updates are deferred: handlers only mark lines dirty and the
//! next `Event::Tick` renders whatever is dirty from current state.

use digipot_traits::{Level, Timestamp};

use crate::accel::{Acceleration, speed_from_interval};
use crate::config::{AccelCfg, DebounceCfg, Preset, RangeCfg, UiCfg, default_presets};
use crate::debounce::DebounceGate;
use crate::display::{DETAIL, DirtyLines, HEADER, OHMS, STATUS};
use crate::error::{BuildError, Result};
use crate::event::{Event, Intent};
use crate::page::{Page, Subscriptions, VarConst};
use crate::quadrature::{Direction, EncoderPin, QuadratureDecoder};
use crate::units::UnitConverter;
use crate::util::fit_line;

/// Result of the last successful write, shown until the value changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confirmation {
    pub channel: usize,
    pub requested_ohms: i32,
    pub approx_ohms: f64,
}

impl Confirmation {
    /// True when the wiper landed within 0.05 ohm of the request.
    pub fn is_exact(&self) -> bool {
        (self.approx_ohms - f64::from(self.requested_ohms)).abs() < 0.05
    }
}

#[derive(Debug)]
pub struct PotController {
    range: RangeCfg,
    ui: UiCfg,
    presets: Vec<Preset>,
    converter: UnitConverter,
    accel: Acceleration,

    page: Page,
    subscriptions: Subscriptions,
    decoder: QuadratureDecoder,
    menu_gate: DebounceGate,
    adjust_gate: DebounceGate,
    button_gate: DebounceGate,
    press_started: Option<Timestamp>,

    menu_selection: usize,
    var_const: VarConst,
    constant_selection: usize,
    selected_channel: usize,
    target_ohms: i32,
    pending_write: Option<i32>,
    confirmation: Option<Confirmation>,
    dirty: DirtyLines,
}

impl PotController {
    pub fn builder() -> PotControllerBuilder {
        PotControllerBuilder::default()
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn target_ohms(&self) -> i32 {
        self.target_ohms
    }

    /// Step the current target maps to.
    pub fn target_step(&self) -> u32 {
        self.converter.target_step(self.target_ohms)
    }

    pub fn selected_channel(&self) -> usize {
        self.selected_channel
    }

    pub fn menu_selection(&self) -> usize {
        self.menu_selection
    }

    pub fn var_const(&self) -> VarConst {
        self.var_const
    }

    pub fn constant_selection(&self) -> usize {
        self.constant_selection
    }

    pub fn selected_preset(&self) -> Option<&Preset> {
        self.presets.get(self.constant_selection)
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn subscriptions(&self) -> Subscriptions {
        self.subscriptions
    }

    pub fn dirty(&self) -> DirtyLines {
        self.dirty
    }

    pub fn confirmation(&self) -> Option<Confirmation> {
        self.confirmation
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    pub fn range(&self) -> &RangeCfg {
        &self.range
    }

    pub fn ui(&self) -> &UiCfg {
        &self.ui
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Feed one event; returns the side effects to perform, possibly none.
    pub fn dispatch(&mut self, event: Event) -> Vec<Intent> {
        match event {
            Event::RotationEdge {
                pin,
                level,
                timestamp,
            } => {
                self.on_rotation_edge(pin, level, timestamp);
                Vec::new()
            }
            Event::ButtonEdge {
                level: Level::High,
                timestamp,
            } => self.on_press(timestamp),
            Event::ButtonEdge {
                level: Level::Low,
                timestamp,
            } => {
                self.on_release(timestamp);
                Vec::new()
            }
            Event::Tick => self.flush(),
        }
    }

    /// Report the outcome of a `WriteStep` the runner completed.
    pub fn confirm_write(&mut self, channel: usize, approx_ohms: f64) {
        let Some(requested_ohms) = self.pending_write.take() else {
            tracing::debug!(channel, "write confirmation with nothing pending");
            return;
        };
        self.confirmation = Some(Confirmation {
            channel,
            requested_ohms,
            approx_ohms,
        });
        self.dirty.mark(STATUS);
        self.dirty.mark(DETAIL);
    }

    fn on_rotation_edge(&mut self, pin: EncoderPin, level: Level, t: Timestamp) {
        // The decoder follows the pins even while rotation is detached so it
        // never resumes from a stale electrical state.
        let Some(detent) = self.decoder.on_edge(pin, level, t) else {
            return;
        };
        if !self.subscriptions.rotation {
            return;
        }
        let gate = if self.page.is_menu() {
            &mut self.menu_gate
        } else {
            &mut self.adjust_gate
        };
        let Some(accepted) = gate.offer(detent.timestamp) else {
            return;
        };
        tracing::trace!(
            page = %self.page,
            direction = ?detent.direction,
            speed = speed_from_interval(accepted.interval_us),
            "detent"
        );
        self.on_detent(detent.direction, accepted.interval_us);
    }

    fn on_detent(&mut self, direction: Direction, interval_us: Option<u64>) {
        match self.page {
            Page::MainSelect => {
                self.menu_selection ^= 1;
                self.dirty.mark(OHMS);
                self.dirty.mark(STATUS);
            }
            Page::VarConstChoice => {
                self.var_const = self.var_const.toggled();
                self.dirty.mark(OHMS);
                self.dirty.mark(STATUS);
            }
            Page::PotAdjust => {
                let Some(change) = self.accel.change_for_interval(interval_us) else {
                    tracing::debug!(
                        speed = speed_from_interval(interval_us),
                        "detent above speed limit ignored"
                    );
                    return;
                };
                let candidate = self
                    .target_ohms
                    .saturating_add(direction.sign().saturating_mul(change));
                if !(self.range.min_ohms..=self.range.max_ohms).contains(&candidate) {
                    tracing::debug!(
                        ohms = self.target_ohms,
                        candidate,
                        "resistance change out of range discarded"
                    );
                    return;
                }
                self.target_ohms = candidate;
                self.confirmation = None;
                self.dirty.mark(OHMS);
                self.dirty.mark(STATUS);
                self.dirty.mark(DETAIL);
            }
            Page::ConstantSelect => {
                let n = self.presets.len();
                if n == 0 {
                    return;
                }
                self.constant_selection = match direction {
                    Direction::Clockwise => (self.constant_selection + 1) % n,
                    Direction::CounterClockwise => (self.constant_selection + n - 1) % n,
                };
                self.confirmation = None;
                self.dirty.mark(OHMS);
                self.dirty.mark(STATUS);
                self.dirty.mark(DETAIL);
            }
        }
    }

    fn on_press(&mut self, t: Timestamp) -> Vec<Intent> {
        if !self.subscriptions.press {
            return Vec::new();
        }
        if self.button_gate.offer(t).is_none() {
            return Vec::new();
        }
        if self.subscriptions.release {
            self.press_started = Some(t);
        }
        match self.page {
            Page::MainSelect => {
                self.selected_channel = self.menu_selection;
                let next = if self.ui.mode_select {
                    Page::VarConstChoice
                } else {
                    Page::PotAdjust
                };
                self.transition(next);
                Vec::new()
            }
            Page::VarConstChoice => {
                let next = match self.var_const {
                    VarConst::Variable => Page::PotAdjust,
                    VarConst::Constant => Page::ConstantSelect,
                };
                self.transition(next);
                Vec::new()
            }
            Page::PotAdjust => self.write_ohms(self.target_ohms),
            Page::ConstantSelect => match self.selected_preset().map(|p| p.ohms) {
                Some(ohms) => self.write_ohms(ohms),
                None => Vec::new(),
            },
        }
    }

    fn on_release(&mut self, t: Timestamp) {
        self.button_gate.observe(t);
        if !self.subscriptions.release {
            return;
        }
        let Some(start) = self.press_started.take() else {
            return;
        };
        let hold_us = t.micros_since(start);
        if hold_us < self.ui.long_press_us {
            return;
        }
        tracing::info!(page = %self.page, hold_us, "long press: reset and return");
        match self.page {
            Page::PotAdjust => self.target_ohms = self.range.default_ohms,
            Page::ConstantSelect => self.constant_selection = self.ui.default_preset,
            Page::MainSelect | Page::VarConstChoice => return,
        }
        self.transition(Page::MainSelect);
    }

    fn write_ohms(&mut self, ohms: i32) -> Vec<Intent> {
        let step = self.converter.target_step(ohms);
        let channel = self.selected_channel;
        tracing::info!(channel, ohms, step, "write requested");
        self.pending_write = Some(ohms);
        vec![Intent::WriteStep { channel, step }]
    }

    // ── Page lifecycle ───────────────────────────────────────────────────────

    fn transition(&mut self, next: Page) {
        let from = self.page;
        self.exit();
        self.page = next;
        self.enter();
        tracing::debug!(%from, to = %next, channel = self.selected_channel, "page transition");
    }

    /// Detach every subscription of the current page.
    fn exit(&mut self) {
        self.subscriptions = Subscriptions::NONE;
        self.press_started = None;
        self.pending_write = None;
    }

    /// Reset the new page's rotation timing, apply its entry state, then
    /// attach its subscriptions.
    fn enter(&mut self) {
        if self.page.is_menu() {
            self.menu_gate.reset();
        } else {
            self.adjust_gate.reset();
        }
        self.decoder.reset_timing();
        self.confirmation = None;
        match self.page {
            Page::MainSelect => {}
            Page::VarConstChoice => self.var_const = VarConst::Variable,
            Page::PotAdjust => self.target_ohms = self.range.default_ohms,
            Page::ConstantSelect => self.constant_selection = self.ui.default_preset,
        }
        self.subscriptions = self.page.subscriptions(self.ui.channels);
        self.dirty.mark_all();
    }

    // ── Rendering ────────────────────────────────────────────────────────────

    fn flush(&mut self) -> Vec<Intent> {
        self.dirty
            .take()
            .into_iter()
            .map(|line| Intent::SetDisplayLine {
                line,
                text: fit_line(&self.render_line(line), self.ui.width),
            })
            .collect()
    }

    /// Text of `line` for the current state, unpadded.
    pub fn render_line(&self, line: usize) -> String {
        let pot = self.selected_channel + 1;
        match (self.page, line) {
            (Page::MainSelect, HEADER) => "Select a Pot:".to_string(),
            (Page::MainSelect, OHMS) => marked(self.menu_selection == 0, "Pot 1"),
            (Page::MainSelect, STATUS) if self.ui.channels > 1 => {
                marked(self.menu_selection == 1, "Pot 2")
            }

            (Page::VarConstChoice, HEADER) => format!("Pot {pot}: mode"),
            (Page::VarConstChoice, OHMS) => marked(
                self.var_const == VarConst::Variable,
                VarConst::Variable.label(),
            ),
            (Page::VarConstChoice, STATUS) => marked(
                self.var_const == VarConst::Constant,
                VarConst::Constant.label(),
            ),

            (Page::PotAdjust, HEADER) => format!("Pot {pot}"),
            (Page::PotAdjust, OHMS) => format!("Ohms: {}", self.target_ohms),
            (Page::ConstantSelect, HEADER) => format!("Pot {pot}: constant"),
            (Page::ConstantSelect, OHMS) => match self.selected_preset() {
                Some(p) => format!("> {} Ohms", p.label),
                None => String::new(),
            },

            (Page::PotAdjust | Page::ConstantSelect, STATUS) => match self.confirmation {
                Some(c) if c.is_exact() => "Value set!".to_string(),
                Some(_) => "Approx set!".to_string(),
                None => "Press to set".to_string(),
            },
            (Page::PotAdjust | Page::ConstantSelect, DETAIL) => match self.confirmation {
                Some(c) => format!("Pot {}: {:.1} Ohms", c.channel + 1, c.approx_ohms),
                None => format!("Step: {}", self.pending_step()),
            },

            _ => String::new(),
        }
    }

    fn pending_step(&self) -> u32 {
        match self.page {
            Page::ConstantSelect => self
                .selected_preset()
                .map_or(0, |p| self.converter.target_step(p.ohms)),
            _ => self.target_step(),
        }
    }
}

fn marked(selected: bool, label: &str) -> String {
    if selected {
        format!("> {label}")
    } else {
        format!("  {label}")
    }
}

/// Builder for `PotController`; every field has a default.
#[derive(Debug, Default)]
pub struct PotControllerBuilder {
    range: Option<RangeCfg>,
    debounce: Option<DebounceCfg>,
    accel: Option<AccelCfg>,
    ui: Option<UiCfg>,
    presets: Option<Vec<Preset>>,
}

impl PotControllerBuilder {
    pub fn with_range(mut self, range: RangeCfg) -> Self {
        self.range = Some(range);
        self
    }
    pub fn with_debounce(mut self, debounce: DebounceCfg) -> Self {
        self.debounce = Some(debounce);
        self
    }
    pub fn with_accel(mut self, accel: AccelCfg) -> Self {
        self.accel = Some(accel);
        self
    }
    pub fn with_ui(mut self, ui: UiCfg) -> Self {
        self.ui = Some(ui);
        self
    }
    pub fn with_presets(mut self, presets: Vec<Preset>) -> Self {
        self.presets = Some(presets);
        self
    }

    /// Validate and build. The controller starts on `MainSelect` with its
    /// subscriptions attached and every display line dirty.
    pub fn try_build(self) -> Result<PotController> {
        let range = self.range.unwrap_or_default();
        let debounce = self.debounce.unwrap_or_default();
        let accel = self.accel.unwrap_or_default();
        let ui = self.ui.unwrap_or_default();
        let presets = self.presets.unwrap_or_else(default_presets);

        let invalid = |msg: &'static str| eyre::Report::new(BuildError::InvalidConfig(msg));
        if range.max_ohms <= 0 {
            return Err(invalid("max_ohms must be > 0"));
        }
        if range.min_ohms < 0 || range.min_ohms > range.max_ohms {
            return Err(invalid("min_ohms must be in [0, max_ohms]"));
        }
        if range.max_steps == 0 || range.max_steps > u32::from(u8::MAX) {
            return Err(invalid("max_steps must be in [1, 255]"));
        }
        if !(range.min_ohms..=range.max_ohms).contains(&range.default_ohms) {
            return Err(invalid("default_ohms must be in [min_ohms, max_ohms]"));
        }
        if accel.speed_threshold == 0 || accel.speed_limit == 0 {
            return Err(invalid("speed_threshold and speed_limit must be >= 1"));
        }
        if accel.fine_ohms <= 0 || accel.coarse_ohms <= 0 {
            return Err(invalid("fine_ohms and coarse_ohms must be > 0"));
        }
        if !(1..=2).contains(&ui.channels) {
            return Err(invalid("channels must be 1 or 2"));
        }
        if ui.long_press_us == 0 {
            return Err(invalid("long_press_us must be >= 1"));
        }
        if ui.mode_select && ui.default_preset >= presets.len() {
            return Err(invalid("default_preset must index into presets"));
        }
        if presets.iter().any(|p| !(0..=range.max_ohms).contains(&p.ohms)) {
            return Err(invalid("presets must be in [0, max_ohms]"));
        }

        let mut ctl = PotController {
            range,
            converter: UnitConverter::from(&range),
            accel: Acceleration::new(accel),
            presets,

            page: Page::MainSelect,
            subscriptions: Subscriptions::NONE,
            decoder: QuadratureDecoder::new(),
            menu_gate: DebounceGate::new(debounce.menu_us),
            adjust_gate: DebounceGate::new(debounce.adjust_us),
            button_gate: DebounceGate::new(debounce.button_us),
            press_started: None,

            menu_selection: 0,
            var_const: VarConst::Variable,
            constant_selection: ui.default_preset,
            selected_channel: 0,
            target_ohms: range.default_ohms,
            pending_write: None,
            confirmation: None,
            dirty: DirtyLines::clean(),
            ui,
        };
        ctl.enter();
        Ok(ctl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::LINE_COUNT;

    fn ctl() -> PotController {
        PotController::builder().try_build().unwrap()
    }

    #[test]
    fn starts_on_main_select_with_everything_dirty() {
        let c = ctl();
        assert_eq!(c.page(), Page::MainSelect);
        assert_eq!(c.target_ohms(), 5_000);
        assert_eq!(c.dirty().take(), vec![HEADER, OHMS, STATUS, DETAIL]);
    }

    #[test]
    fn first_tick_renders_main_menu() {
        let mut c = ctl();
        let out = c.dispatch(Event::Tick);
        assert_eq!(out.len(), LINE_COUNT);
        assert_eq!(
            out[0],
            Intent::SetDisplayLine {
                line: HEADER,
                text: fit_line("Select a Pot:", 20)
            }
        );
        assert!(c.dispatch(Event::Tick).is_empty());
    }

    #[test]
    fn rejects_bad_range() {
        let err = PotController::builder()
            .with_range(RangeCfg {
                default_ohms: 20_000,
                ..RangeCfg::default()
            })
            .try_build()
            .unwrap_err();
        assert!(format!("{err}").contains("default_ohms"));
    }

    #[test]
    fn single_channel_never_toggles_menu() {
        let mut c = PotController::builder()
            .with_ui(UiCfg {
                channels: 1,
                ..UiCfg::default()
            })
            .try_build()
            .unwrap();
        assert!(!c.subscriptions().rotation);
        // one full clockwise click: 0 -> 1 -> 3 -> 2 -> 0
        let t = Timestamp::from_micros(1_000);
        for (pin, level) in [
            (EncoderPin::B, Level::High),
            (EncoderPin::A, Level::High),
            (EncoderPin::B, Level::Low),
            (EncoderPin::A, Level::Low),
        ] {
            c.dispatch(Event::RotationEdge {
                pin,
                level,
                timestamp: t,
            });
        }
        assert_eq!(c.menu_selection(), 0);
        // the decoder still followed the pins and completed the click
        assert_eq!(c.decoder.last_detent(), Some(t));
        assert!(c.menu_gate.last_accepted().is_none());
        assert_eq!(c.render_line(STATUS), "");
    }

    #[test]
    fn confirmation_without_pending_write_is_ignored() {
        let mut c = ctl();
        c.dispatch(Event::Tick);
        c.confirm_write(0, 5_000.0);
        assert!(c.confirmation().is_none());
        assert!(c.dirty().is_clean());
    }
}
