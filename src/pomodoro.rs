use crate::config::PomodoroSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::Break => "Break",
        }
    }
}

/// Countdown that alternates focus and break phases. It is advanced one second at a time by
/// whoever owns the clock and stops by itself when a phase runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pomodoro {
    settings: PomodoroSettings,
    phase: Phase,
    remaining_seconds: u32,
    running: bool,
}

impl Pomodoro {
    pub fn new(settings: PomodoroSettings) -> Self {
        Self {
            remaining_seconds: settings.work_minutes * 60,
            settings,
            phase: Phase::Focus,
            running: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Focus;
        self.remaining_seconds = self.phase_seconds(Phase::Focus);
    }

    /// Advances one second. Returns the phase that just finished, if any; the timer is then
    /// stopped with the other phase loaded.
    pub fn tick(&mut self) -> Option<Phase> {
        if !self.running {
            return None;
        }

        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
            return None;
        }

        let finished = self.phase;
        self.running = false;
        self.phase = match finished {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        };
        self.remaining_seconds = self.phase_seconds(self.phase);
        Some(finished)
    }

    /// Share of the current phase already elapsed, 0 to 100.
    pub fn progress_percent(&self) -> f64 {
        let total = self.phase_seconds(self.phase);
        if total == 0 {
            return 0.0;
        }
        f64::from(total - self.remaining_seconds.min(total)) / f64::from(total) * 100.0
    }

    /// New durations apply to the loaded phase only while the timer is stopped.
    pub fn apply_settings(&mut self, settings: PomodoroSettings) {
        self.settings = settings;
        if !self.running {
            self.remaining_seconds = self.phase_seconds(self.phase);
        }
    }

    fn phase_seconds(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.settings.work_minutes * 60,
            Phase::Break => self.settings.break_minutes * 60,
        }
    }
}
