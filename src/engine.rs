// src/engine.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};

use crate::config::ScopeConfig;
use crate::serial::SerialSession;
use crate::signal::QueueSource;
use crate::simulator::Simulator;
use crate::types::{ConnectionMode, TransportEvent};

const FULL_QUEUE_BACKOFF: Duration = Duration::from_millis(2);
const SIM_NOISE: f64 = 0.5;

/// Owns the transport thread. Dropping it stops and joins the thread.
///
/// The thread is the only producer of the bounded line queue; every channel
/// pipeline stays on the thread that drains the matching `QueueSource`.
pub struct TransportHandle {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    description: String,
}

impl TransportHandle {
    pub fn open(
        config: &ScopeConfig,
        mode: ConnectionMode,
        port_name: &str,
        events: Sender<TransportEvent>,
    ) -> Result<(Self, QueueSource)> {
        config.validate()?;
        let (tx, rx) = sync_channel(config.queue_capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let (description, worker) = match mode {
            ConnectionMode::Hardware => {
                let session =
                    SerialSession::connect(port_name, config.baud_rate, config.read_timeout())?;
                let description = format!("{} @ {} baud", session.port_name(), config.baud_rate);
                let stop = stop.clone();
                let events = events.clone();
                let worker = thread::Builder::new()
                    .name("serial-reader".into())
                    .spawn(move || run_serial(session, tx, stop, events))
                    .context("failed to spawn serial reader thread")?;
                (description, worker)
            }
            ConnectionMode::Simulation => {
                let pace = simulator_pace(config);
                let stop = stop.clone();
                let events = events.clone();
                let worker = thread::Builder::new()
                    .name("simulator".into())
                    .spawn(move || run_simulator(Simulator::new(SIM_NOISE), pace, tx, stop, events))
                    .context("failed to spawn simulator thread")?;
                ("simulator".to_owned(), worker)
            }
        };
        info!("transport opened: {description}");
        events.send(TransportEvent::Status(true)).ok();
        events
            .send(TransportEvent::Log(format!("✅ Connected: {description}")))
            .ok();
        let handle = Self {
            stop,
            worker: Some(worker),
            description,
        };
        Ok((handle, QueueSource::new(rx)))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    pub fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("transport thread for {} panicked", self.description);
            }
            info!("transport closed: {}", self.description);
        }
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_serial(
    mut session: SerialSession,
    tx: SyncSender<String>,
    stop: Arc<AtomicBool>,
    events: Sender<TransportEvent>,
) {
    while !stop.load(Ordering::Relaxed) {
        match session.read_line() {
            Ok(Some(line)) => {
                if !deliver(&tx, line, &stop) {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => {
                error!("{err:#}");
                events
                    .send(TransportEvent::Log(format!("❌ {err:#}")))
                    .ok();
                break;
            }
        }
    }
    events.send(TransportEvent::Status(false)).ok();
}

fn run_simulator(
    mut simulator: Simulator,
    pace: Duration,
    tx: SyncSender<String>,
    stop: Arc<AtomicBool>,
    events: Sender<TransportEvent>,
) {
    while !stop.load(Ordering::Relaxed) {
        if !deliver(&tx, simulator.next_line(), &stop) {
            break;
        }
        thread::sleep(pace);
    }
    events.send(TransportEvent::Status(false)).ok();
}

// One line per assumed sample period, so the frequency readout matches the
// generated waveform.
fn simulator_pace(config: &ScopeConfig) -> Duration {
    Duration::from_secs_f64(1.0 / config.pipeline.sampling_rate_hz)
}

/// Blocks while the queue is full. False once the consumer is gone or a stop
/// was requested.
fn deliver(tx: &SyncSender<String>, mut line: String, stop: &AtomicBool) -> bool {
    loop {
        match tx.try_send(line) {
            Ok(()) => return true,
            Err(TrySendError::Full(back)) => {
                if stop.load(Ordering::Relaxed) {
                    return false;
                }
                line = back;
                thread::sleep(FULL_QUEUE_BACKOFF);
            }
            Err(TrySendError::Disconnected(_)) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{PipelineConfig, UpdateLoop};
    use std::sync::mpsc::channel;
    use std::time::Instant;

    #[test]
    fn simulated_transport_feeds_the_update_loop() {
        let (events_tx, events_rx) = channel();
        let config = ScopeConfig {
            pipeline: PipelineConfig {
                sampling_rate_hz: 500.0,
                ..PipelineConfig::default()
            },
            queue_capacity: 8,
            ..ScopeConfig::default()
        };
        let (handle, source) =
            TransportHandle::open(&config, ConnectionMode::Simulation, "", events_tx).unwrap();
        assert!(handle.is_running());
        let mut update_loop = UpdateLoop::with_source(&config.pipeline, source).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut ticks = 0;
        while ticks < 5 && Instant::now() < deadline {
            let report = update_loop.tick();
            assert_eq!(report.rejected, 0);
            ticks += report.ticks;
            thread::sleep(Duration::from_millis(5));
        }
        assert!(ticks >= 5);

        drop(handle);
        let events: Vec<TransportEvent> = events_rx.try_iter().collect();
        assert!(matches!(events.first(), Some(TransportEvent::Status(true))));
        assert!(matches!(events.last(), Some(TransportEvent::Status(false))));

        // Whatever was still queued drains, then the loop sees the closed transport.
        while !update_loop.tick().is_idle() {}
        assert!(update_loop.transport_lost());
    }

    #[test]
    fn simulator_runs_at_the_assumed_sample_rate() {
        let mut config = ScopeConfig::default();
        assert_eq!(simulator_pace(&config), Duration::from_secs_f64(1.0 / 29.0));
        config.pipeline.sampling_rate_hz = 100.0;
        assert_eq!(simulator_pace(&config), Duration::from_millis(10));
    }

    #[test]
    fn missing_serial_port_fails_to_open() {
        let (events_tx, _events_rx) = channel();
        let result = TransportHandle::open(
            &ScopeConfig::default(),
            ConnectionMode::Hardware,
            "/dev/does-not-exist-scope",
            events_tx,
        );
        assert!(result.is_err());
    }

    #[test]
    fn deliver_gives_up_when_stopped_on_full_queue() {
        let (tx, _rx) = sync_channel(1);
        let stop = AtomicBool::new(false);
        assert!(deliver(&tx, "a".into(), &stop));
        stop.store(true, Ordering::Relaxed);
        assert!(!deliver(&tx, "b".into(), &stop));
    }

    #[test]
    fn deliver_waits_for_room_on_full_queue() {
        let (tx, rx) = sync_channel(1);
        let stop = AtomicBool::new(false);
        assert!(deliver(&tx, "a".into(), &stop));
        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let first = rx.recv().unwrap();
            let second = rx.recv().unwrap();
            (first, second)
        });
        let started = Instant::now();
        assert!(deliver(&tx, "b".into(), &stop));
        assert!(started.elapsed() >= Duration::from_millis(10));
        assert_eq!(consumer.join().unwrap(), ("a".to_owned(), "b".to_owned()));
    }

    #[test]
    fn deliver_reports_dropped_consumer() {
        let (tx, rx) = sync_channel(1);
        drop(rx);
        let stop = AtomicBool::new(false);
        assert!(!deliver(&tx, "a".into(), &stop));
    }
}
