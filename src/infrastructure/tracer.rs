use crate::domain::entities::{Phase, TraceTimings};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct PhaseClock {
    started: Option<Instant>,
    duration: Duration,
}

/// Records DNS, TCP connect and TLS handshake timings for one request.
///
/// The connector calls the `*_start`/`*_done` hooks as each phase runs.
/// Phases that never run (for example TLS on plain http) stay at zero.
#[derive(Debug)]
pub struct Tracer {
    origin: Instant,
    dns: PhaseClock,
    connect: PhaseClock,
    tls: PhaseClock,
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            dns: PhaseClock::default(),
            connect: PhaseClock::default(),
            tls: PhaseClock::default(),
        }
    }

    pub fn dns_start(&mut self) {
        self.dns.started = Some(Instant::now());
    }

    pub fn dns_done(&mut self) {
        Self::finish(&mut self.dns);
    }

    pub fn connect_start(&mut self) {
        self.connect.started = Some(Instant::now());
    }

    pub fn connect_done(&mut self) {
        Self::finish(&mut self.connect);
    }

    pub fn tls_start(&mut self) {
        self.tls.started = Some(Instant::now());
    }

    pub fn tls_done(&mut self) {
        Self::finish(&mut self.tls);
    }

    fn finish(clock: &mut PhaseClock) {
        if let Some(started) = clock.started {
            clock.duration = started.elapsed();
        }
    }

    pub fn timings(&self, total: Duration) -> TraceTimings {
        TraceTimings {
            dns: self.phase(&self.dns),
            connect: self.phase(&self.connect),
            tls: self.phase(&self.tls),
            total,
        }
    }

    fn phase(&self, clock: &PhaseClock) -> Phase {
        Phase {
            start: clock.started.map(|s| s.saturating_duration_since(self.origin)),
            duration: clock.duration,
        }
    }

    /// Logs the phase breakdown and returns it
    pub fn report(&self, total: Duration) -> TraceTimings {
        let timings = self.timings(total);
        tracing::info!(
            dns_ms = millis(timings.dns.duration),
            connect_ms = millis(timings.connect.duration),
            tls_ms = millis(timings.tls.duration),
            total_ms = millis(total),
            "request timings"
        );
        timings
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
