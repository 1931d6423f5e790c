use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::capture_result::CapturedWindow;
use crate::models::config::{CaptureConfiguration, UseMode};
use crate::models::error::CaptureError;
use crate::models::sample::{Baseline, CaptureDiagnostics, Sample};
use crate::models::state::CaptureState;
use crate::models::trigger::TriggerSettings;
use crate::processing::baseline::BaselineEstimator;
use crate::processing::double_buffer::DoubleBuffer;
use crate::processing::ring_buffer::{SampleRingBuffer, WindowRead};
use crate::processing::threshold::ThresholdEngine;
use crate::processing::window::WindowSpec;
use crate::session::commands::{CommandProcessor, SharedSettings};
use crate::session::reader::SampleReader;
use crate::session::shutdown::ShutdownSignal;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::command_channel::CommandChannel;
use crate::traits::result_sink::ResultSink;
use crate::traits::sample_source::SampleSource;

/// Internal session status, protected by `parking_lot::Mutex`.
#[derive(Debug)]
struct SessionState {
    state: CaptureState,
    baseline: Option<Baseline>,
}

/// Read-only view of a session that may be running on another thread.
#[derive(Clone)]
pub struct SessionMonitor {
    session_state: Arc<Mutex<SessionState>>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
}

impl SessionMonitor {
    pub fn state(&self) -> CaptureState {
        self.session_state.lock().state.clone()
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.session_state.lock().baseline
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.diagnostics.lock().clone()
    }
}

/// Acquisition / trigger / capture orchestrator.
///
/// Generic over the sensor and the result transport:
/// ```text
/// [SampleSource] → [SampleReader] → [x/y/z SampleRingBuffer] ─┐
///                                 └→ [ThresholdEngine] ───────┴→ window read → [ResultSink]
///
/// [CommandChannel] → [CommandProcessor] → SharedSettings (read by the loop above)
/// ```
///
/// The three ring buffers are owned by the acquisition loop and advanced in
/// lock-step, so a window read at one anchor slot is sample-aligned across axes.
pub struct CaptureSession<S: SampleSource, K: ResultSink> {
    source: S,
    sink: K,
    config: CaptureConfiguration,
    settings: SharedSettings,
    shutdown: ShutdownSignal,
    reader: SampleReader,
    rings: [SampleRingBuffer; 3],
    session_state: Arc<Mutex<SessionState>>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
}

impl<S: SampleSource, K: ResultSink> CaptureSession<S, K> {
    /// Validate `config` and allocate the ring buffers.
    pub fn new(source: S, sink: K, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        let rings = [
            SampleRingBuffer::new(config.buffer_capacity)?,
            SampleRingBuffer::new(config.buffer_capacity)?,
            SampleRingBuffer::new(config.buffer_capacity)?,
        ];
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let window = WindowSpec::new(
            config.time_before_ms,
            config.time_after_ms,
            config.sample_rate_hz(),
        );
        if window.total_samples() > config.buffer_capacity {
            log::warn!(
                "Capture window of {} samples exceeds ring capacity {}; captures will be truncated",
                window.total_samples(),
                config.buffer_capacity
            );
        }

        let shutdown = ShutdownSignal::new();
        let reader = SampleReader::new(
            config.read_mode,
            shutdown.clone(),
            config.ready_timeout_ms.map(Duration::from_millis),
        );

        Ok(Self {
            source,
            sink,
            settings: Arc::new(Mutex::new(TriggerSettings {
                threshold: config.threshold,
                window,
            })),
            config,
            shutdown,
            reader,
            rings,
            session_state: Arc::new(Mutex::new(SessionState {
                state: CaptureState::Idle,
                baseline: None,
            })),
            diagnostics: Arc::new(Mutex::new(CaptureDiagnostics::default())),
            delegate: None,
        })
    }

    /// Share an existing shutdown signal, e.g. one also set by a signal handler.
    pub fn with_shutdown_signal(mut self, shutdown: ShutdownSignal) -> Self {
        self.reader = SampleReader::new(
            self.config.read_mode,
            shutdown.clone(),
            self.config.ready_timeout_ms.map(Duration::from_millis),
        );
        self.shutdown = shutdown;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Handle to the live trigger settings.
    pub fn settings(&self) -> SharedSettings {
        Arc::clone(&self.settings)
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor {
            session_state: Arc::clone(&self.session_state),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.session_state.lock().state.clone()
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.session_state.lock().baseline
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.diagnostics.lock().clone()
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    /// A command processor wired to this session's settings and shutdown signal.
    pub fn command_processor<C: CommandChannel>(&self, channel: C) -> CommandProcessor<C> {
        CommandProcessor::new(
            channel,
            self.settings(),
            self.shutdown_signal(),
            Arc::clone(&self.diagnostics),
        )
    }

    /// Establish the rest-state baseline. Transitions: idle → calibrating → idle.
    pub fn calibrate(&mut self) -> Result<Baseline, CaptureError> {
        if !self.source.is_available() {
            let err = CaptureError::DeviceNotAvailable(self.source.device_name());
            self.set_state(CaptureState::Failed(err.clone()));
            return Err(err);
        }

        self.set_state(CaptureState::Calibrating);
        let estimator = BaselineEstimator::new(self.config.calibration_samples);
        log::info!(
            "Calibrating baseline from {} samples of {}",
            estimator.sample_count(),
            self.source.device_name()
        );

        let result = estimator.estimate(|| self.acquire());

        match result {
            Ok(baseline) => {
                log::info!(
                    "Baseline x={} y={} z={}",
                    baseline.x,
                    baseline.y,
                    baseline.z
                );
                self.session_state.lock().baseline = Some(baseline);
                self.set_state(CaptureState::Idle);
                Ok(baseline)
            }
            Err(CaptureError::Cancelled) => {
                self.set_state(CaptureState::Stopped);
                Err(CaptureError::Cancelled)
            }
            Err(e) => {
                let err = CaptureError::CalibrationFailed(e.to_string());
                self.set_state(CaptureState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Run the acquisition loop until shutdown is requested.
    ///
    /// In triggered mode the baseline is calibrated first if that has not
    /// happened yet. A shutdown observed mid-poll ends the loop cleanly.
    pub fn run(&mut self) -> Result<CaptureDiagnostics, CaptureError> {
        let result = match self.config.use_mode {
            UseMode::Triggered => {
                let baseline = match self.baseline() {
                    Some(baseline) => baseline,
                    None => match self.calibrate() {
                        Ok(baseline) => baseline,
                        Err(CaptureError::Cancelled) => return Ok(self.diagnostics()),
                        Err(e) => return Err(e),
                    },
                };
                self.run_triggered(baseline)
            }
            UseMode::Streaming => self.run_streaming(),
        };

        match result {
            Ok(()) | Err(CaptureError::Cancelled) => {
                log::info!("Acquisition stopped");
                self.set_state(CaptureState::Stopped);
                Ok(self.diagnostics())
            }
            Err(e) => {
                log::error!("Acquisition failed: {}", e);
                self.set_state(CaptureState::Failed(e.clone()));
                if let Some(ref delegate) = self.delegate {
                    delegate.on_error(&e);
                }
                Err(e)
            }
        }
    }

    /// Run the acquisition loop on a dedicated thread.
    pub fn spawn(
        mut self,
    ) -> Result<thread::JoinHandle<Result<CaptureDiagnostics, CaptureError>>, CaptureError>
    where
        S: 'static,
        K: 'static,
    {
        thread::Builder::new()
            .name("acquisition".into())
            .spawn(move || self.run())
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn acquisition thread: {}", e)))
    }

    // --- Internal helpers ---

    /// Armed → PostTrigger → Emit → Armed, forever.
    fn run_triggered(&mut self, baseline: Baseline) -> Result<(), CaptureError> {
        let mut engine = ThresholdEngine::new(baseline);
        self.set_state(CaptureState::Armed);

        loop {
            if self.shutdown.is_requested() {
                return Ok(());
            }

            // Snapshot once per iteration; commands land between samples.
            let settings = *self.settings.lock();

            let sample = self.acquire()?;
            let trigger_slot = self.push(&sample);
            if !engine.evaluate(&sample, &settings.threshold) {
                continue;
            }

            // The window is frozen for the rest of this capture.
            let window = settings.window;
            log::debug!(
                "Trigger at slot {} ({:?}), collecting {} more samples",
                trigger_slot,
                sample,
                window.samples_after()
            );
            self.diagnostics.lock().triggers += 1;

            let mut remaining = window.samples_after();
            self.set_state(CaptureState::PostTrigger {
                trigger_slot,
                remaining,
            });
            while remaining > 0 {
                let sample = self.acquire()?;
                self.push(&sample);
                remaining -= 1;
                if remaining > 0 {
                    self.set_state(CaptureState::PostTrigger {
                        trigger_slot,
                        remaining,
                    });
                }
            }

            self.set_state(CaptureState::Emit { trigger_slot });
            let capture = self.extract_window(trigger_slot, &window, baseline);
            self.sink.send_capture(&capture)?;
            self.diagnostics.lock().captures_emitted += 1;
            if let Some(ref delegate) = self.delegate {
                delegate.on_capture_emitted(&capture);
            }

            self.set_state(CaptureState::Armed);
        }
    }

    /// Forward every sample through a two-slot buffer.
    fn run_streaming(&mut self) -> Result<(), CaptureError> {
        let mut slots: DoubleBuffer<Sample> = DoubleBuffer::new();
        self.set_state(CaptureState::Streaming);

        loop {
            if self.shutdown.is_requested() {
                return Ok(());
            }

            let sample = self.acquire()?;
            let ready = *slots.fill_and_flip(sample);
            self.sink.send_sample(&ready)?;
            self.diagnostics.lock().samples_streamed += 1;
        }
    }

    fn acquire(&mut self) -> Result<Sample, CaptureError> {
        let result = self.reader.next_sample(&mut self.source);
        let polls = self.reader.take_not_ready_polls();

        let mut diagnostics = self.diagnostics.lock();
        diagnostics.not_ready_polls += polls;
        if result.is_ok() {
            diagnostics.samples_acquired += 1;
        }
        result
    }

    /// Push one sample into all three rings; returns the shared slot index.
    fn push(&mut self, sample: &Sample) -> usize {
        let [x, y, z] = &mut self.rings;
        let slot = x.push(sample.x);
        let slot_y = y.push(sample.y);
        let slot_z = z.push(sample.z);
        debug_assert!(slot == slot_y && slot == slot_z, "ring buffers out of step");
        slot
    }

    fn extract_window(
        &mut self,
        trigger_slot: usize,
        window: &WindowSpec,
        baseline: Baseline,
    ) -> CapturedWindow {
        let mut axes: [Vec<i16>; 3] = Default::default();
        let mut read = None;
        for (ring, out) in self.rings.iter().zip(axes.iter_mut()) {
            read = Some(ring.read_window(
                trigger_slot,
                window.samples_before(),
                window.total_samples(),
                out,
            ));
        }

        let truncated = read.is_some_and(|r| r.is_truncated());
        if let Some(read) = read.filter(WindowRead::is_truncated) {
            let delivered = read.delivered();
            log::warn!(
                "Capture window truncated: requested {} samples, ring holds {}",
                window.total_samples(),
                delivered
            );
            self.diagnostics.lock().truncated_windows += 1;
            if let Some(ref delegate) = self.delegate {
                delegate.on_window_truncated(window.total_samples(), delivered);
            }
        }

        CapturedWindow::new(
            baseline,
            axes,
            window.samples_before(),
            window.samples_after(),
            truncated,
        )
    }

    fn set_state(&self, new_state: CaptureState) {
        log::debug!("State → {:?}", new_state);
        self.session_state.lock().state = new_state.clone();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{OutputDataRate, ReadMode};
    use crate::session::commands::ConfigCommand;
    use crate::models::sample::{AxisMask, RawSample};
    use crate::models::trigger::{CombineLogic, EdgePolicy, ThresholdConfig, TriggerMode};
    use std::collections::VecDeque;
    use std::sync::mpsc;
    use std::time::Instant;

    fn raw(sample: Sample) -> RawSample {
        sample.to_raw()
    }

    /// Plays back a fixed list of samples, then requests shutdown.
    struct ScriptedSource {
        samples: VecDeque<Sample>,
        shutdown: ShutdownSignal,
    }

    impl ScriptedSource {
        fn new(samples: Vec<Sample>, shutdown: &ShutdownSignal) -> Self {
            Self {
                samples: samples.into(),
                shutdown: shutdown.clone(),
            }
        }
    }

    impl SampleSource for ScriptedSource {
        fn poll_sync(&mut self) -> Result<Option<RawSample>, CaptureError> {
            match self.samples.pop_front() {
                Some(sample) => Ok(Some(raw(sample))),
                None => {
                    self.shutdown.request();
                    Ok(None)
                }
            }
        }

        fn read_async(&mut self) -> Result<RawSample, CaptureError> {
            match self.samples.pop_front() {
                Some(sample) => Ok(raw(sample)),
                None => {
                    self.shutdown.request();
                    Err(CaptureError::Cancelled)
                }
            }
        }

        fn device_name(&self) -> String {
            "scripted".into()
        }
    }

    /// Emits the same sample forever.
    struct ConstantSource(Sample);

    impl SampleSource for ConstantSource {
        fn poll_sync(&mut self) -> Result<Option<RawSample>, CaptureError> {
            Ok(Some(raw(self.0)))
        }

        fn read_async(&mut self) -> Result<RawSample, CaptureError> {
            Ok(raw(self.0))
        }

        fn device_name(&self) -> String {
            "constant".into()
        }
    }

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn poll_sync(&mut self) -> Result<Option<RawSample>, CaptureError> {
            Err(CaptureError::Transport("bus error".into()))
        }

        fn read_async(&mut self) -> Result<RawSample, CaptureError> {
            Err(CaptureError::Transport("bus error".into()))
        }

        fn device_name(&self) -> String {
            "failing".into()
        }
    }

    /// Scripted source that applies a command to the live settings just
    /// before handing out the sample at index `at`.
    struct ReconfiguringSource {
        inner: ScriptedSource,
        pulled: usize,
        at: usize,
        command: ConfigCommand,
        settings: Arc<Mutex<Option<SharedSettings>>>,
    }

    impl SampleSource for ReconfiguringSource {
        fn poll_sync(&mut self) -> Result<Option<RawSample>, CaptureError> {
            if self.pulled == self.at {
                if let Some(settings) = self.settings.lock().as_ref() {
                    self.command.apply(&mut settings.lock());
                }
            }
            let raw = self.inner.poll_sync()?;
            if raw.is_some() {
                self.pulled += 1;
            }
            Ok(raw)
        }

        fn read_async(&mut self) -> Result<RawSample, CaptureError> {
            self.inner.read_async()
        }

        fn device_name(&self) -> String {
            "reconfiguring".into()
        }
    }

    struct FailingSink;

    impl ResultSink for FailingSink {
        fn send_sample(&mut self, _sample: &Sample) -> Result<(), CaptureError> {
            Err(CaptureError::Transport("broken pipe".into()))
        }

        fn send_capture(&mut self, _capture: &CapturedWindow) -> Result<(), CaptureError> {
            Err(CaptureError::Transport("broken pipe".into()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        samples: Arc<Mutex<Vec<Sample>>>,
        captures: Arc<Mutex<Vec<CapturedWindow>>>,
    }

    impl ResultSink for RecordingSink {
        fn send_sample(&mut self, sample: &Sample) -> Result<(), CaptureError> {
            self.samples.lock().push(*sample);
            Ok(())
        }

        fn send_capture(&mut self, capture: &CapturedWindow) -> Result<(), CaptureError> {
            self.captures.lock().push(capture.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingDelegate {
        states: Mutex<Vec<CaptureState>>,
        truncations: Mutex<Vec<(usize, usize)>>,
        emitted: Mutex<usize>,
        errors: Mutex<Vec<CaptureError>>,
    }

    impl CaptureDelegate for RecordingDelegate {
        fn on_state_changed(&self, state: &CaptureState) {
            self.states.lock().push(state.clone());
        }

        fn on_capture_emitted(&self, _capture: &CapturedWindow) {
            *self.emitted.lock() += 1;
        }

        fn on_window_truncated(&self, requested: usize, delivered: usize) {
            self.truncations.lock().push((requested, delivered));
        }

        fn on_error(&self, error: &CaptureError) {
            self.errors.lock().push(error.clone());
        }
    }

    struct ChannelCommands(mpsc::Receiver<String>);

    impl CommandChannel for ChannelCommands {
        fn recv_command(&mut self) -> Result<Option<String>, CaptureError> {
            Ok(self.0.recv().ok())
        }
    }

    /// 100 Hz, 30 ms before (3 samples), 20 ms after (2 samples), X rising past 1000.
    fn config() -> CaptureConfiguration {
        CaptureConfiguration {
            output_data_rate: OutputDataRate::HZ_100,
            use_mode: UseMode::Triggered,
            read_mode: ReadMode::Sync,
            buffer_capacity: 64,
            threshold: ThresholdConfig {
                mode: TriggerMode::Fixed,
                edge: EdgePolicy::Positive,
                logic: CombineLogic::Or,
                axes: AxisMask::X,
                fixed_thresholds: [1000; 3],
                offsets: [0; 3],
            },
            time_before_ms: 30,
            time_after_ms: 20,
            calibration_samples: 4,
            ..Default::default()
        }
    }

    fn stream(xs: &[i16]) -> Vec<Sample> {
        xs.iter().map(|&x| Sample::new(x, -x, 7)).collect()
    }

    fn run_script(
        config: CaptureConfiguration,
        xs: &[i16],
    ) -> (RecordingSink, Arc<RecordingDelegate>, Result<CaptureDiagnostics, CaptureError>) {
        let shutdown = ShutdownSignal::new();
        let sink = RecordingSink::default();
        let delegate = Arc::new(RecordingDelegate::default());
        let mut session = CaptureSession::new(
            ScriptedSource::new(stream(xs), &shutdown),
            sink.clone(),
            config,
        )
        .unwrap()
        .with_shutdown_signal(shutdown);
        session.set_delegate(delegate.clone());
        let result = session.run();
        (sink, delegate, result)
    }

    #[test]
    fn rejects_non_power_of_two_capacity() {
        let config = CaptureConfiguration {
            buffer_capacity: 100,
            ..config()
        };
        let err = CaptureSession::new(
            ConstantSource(Sample::default()),
            RecordingSink::default(),
            config,
        )
        .err()
        .unwrap();
        assert_eq!(err, CaptureError::InvalidCapacity(100));
    }

    #[test]
    fn end_to_end_capture_window() {
        let xs = [
            0, 0, 0, 0, // calibration
            10, 20, 30, 40, 50, 60, 70, 80, 90, 100, // armed, no trigger
            1500, // trigger
            20, 21, // post-trigger
            30, 31, // armed again
        ];
        let (sink, _, result) = run_script(config(), &xs);
        let diagnostics = result.unwrap();

        let captures = sink.captures.lock();
        assert_eq!(captures.len(), 1);
        let capture = &captures[0];

        assert_eq!(capture.baseline, Baseline::new(0, 0, 7));
        assert_eq!(capture.total_samples(), 6);
        assert_eq!(capture.trigger_offset(), 4);
        assert!(!capture.truncated);
        assert_eq!(capture.x, vec![80, 90, 100, 1500, 20, 21]);
        assert_eq!(capture.y, vec![-80, -90, -100, -1500, -20, -21]);
        assert_eq!(capture.z, vec![7; 6]);
        assert_eq!(capture.trigger_sample(), Some(Sample::new(1500, -1500, 7)));

        assert_eq!(diagnostics.triggers, 1);
        assert_eq!(diagnostics.captures_emitted, 1);
        assert_eq!(diagnostics.samples_acquired, xs.len() as u64);
    }

    #[test]
    fn post_trigger_phase_does_not_retrigger() {
        let xs = [
            0, 0, 0, 0, // calibration
            1, 2, 3, // pre-trigger history
            5000, // trigger
            6000, 7000, // above threshold, but collected as post-trigger
            8000, // re-armed: second trigger
            9, 10, // its post-trigger samples
        ];
        let (sink, _, result) = run_script(config(), &xs);
        assert_eq!(result.unwrap().triggers, 2);

        let captures = sink.captures.lock();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[0].x, vec![1, 2, 3, 5000, 6000, 7000]);
        assert_eq!(captures[1].x, vec![5000, 6000, 7000, 8000, 9, 10]);
    }

    #[test]
    fn shutdown_during_post_trigger_drops_capture() {
        let xs = [0, 0, 0, 0, 1, 2, 3, 5000, 6000];
        let (sink, delegate, result) = run_script(config(), &xs);
        assert!(result.is_ok());
        assert!(sink.captures.lock().is_empty());
        assert_eq!(*delegate.states.lock().last().unwrap(), CaptureState::Stopped);
    }

    #[test]
    fn oversized_window_is_truncated_but_emitted() {
        let config = CaptureConfiguration {
            buffer_capacity: 4,
            ..config()
        };
        let xs = [0, 0, 0, 0, 1, 2, 3, 5000, 6, 7];
        let (sink, delegate, result) = run_script(config, &xs);
        assert_eq!(result.unwrap().truncated_windows, 1);

        let captures = sink.captures.lock();
        let capture = &captures[0];
        assert!(capture.truncated);
        assert_eq!(capture.total_samples(), 4);
        assert_eq!(capture.requested_total, 6);
        // 3 + 1 + 2 samples do not fit into 4 slots; the two oldest were overwritten.
        assert_eq!(capture.x, vec![3, 5000, 6, 7]);
        assert_eq!(capture.trigger_sample(), Some(Sample::new(5000, -5000, 7)));
        assert_eq!(*delegate.truncations.lock(), vec![(6, 4)]);
    }

    #[test]
    fn truncation_past_the_trigger_keeps_newest_samples() {
        // 10 ms before and 50 ms after at 100 Hz: 1 + 1 + 5 samples into 4 slots.
        let config = CaptureConfiguration {
            buffer_capacity: 4,
            time_before_ms: 10,
            time_after_ms: 50,
            ..config()
        };
        let xs = [0, 0, 0, 0, 1, 5000, 11, 12, 13, 14, 15];
        let (sink, _, result) = run_script(config, &xs);
        assert!(result.is_ok());

        let captures = sink.captures.lock();
        let capture = &captures[0];
        assert!(capture.truncated);
        assert_eq!(capture.x, vec![12, 13, 14, 15]);
        assert_eq!(capture.trigger_offset(), 2);
        assert_eq!(capture.trigger_sample(), None);
    }

    #[test]
    fn state_transitions_are_reported() {
        let xs = [0, 0, 0, 0, 1, 5000, 2, 3];
        let (_, delegate, result) = run_script(config(), &xs);
        assert!(result.is_ok());

        let states = delegate.states.lock().clone();
        // Calibration samples are not buffered; the trigger is the second armed sample.
        let slot = 1;
        assert_eq!(
            states,
            vec![
                CaptureState::Calibrating,
                CaptureState::Idle,
                CaptureState::Armed,
                CaptureState::PostTrigger { trigger_slot: slot, remaining: 2 },
                CaptureState::PostTrigger { trigger_slot: slot, remaining: 1 },
                CaptureState::Emit { trigger_slot: slot },
                CaptureState::Armed,
                CaptureState::Stopped,
            ]
        );
        assert_eq!(*delegate.emitted.lock(), 1);
    }

    #[test]
    fn window_change_mid_capture_applies_to_next_capture() {
        let xs = [
            0, 0, 0, 0, // calibration
            1, 2, 3, // pre-trigger history
            5000, // trigger with 20 ms after (2 samples)
            6, 7, // -t2 40 lands before the first of these
            8, // armed
            6000, // trigger with 40 ms after (4 samples)
            9, 10, 11, 12,
        ];
        let shutdown = ShutdownSignal::new();
        let cell = Arc::new(Mutex::new(None));
        let source = ReconfiguringSource {
            inner: ScriptedSource::new(stream(&xs), &shutdown),
            pulled: 0,
            at: 8,
            command: ConfigCommand::SetTimeAfter(40),
            settings: Arc::clone(&cell),
        };
        let sink = RecordingSink::default();
        let mut session = CaptureSession::new(source, sink.clone(), config())
            .unwrap()
            .with_shutdown_signal(shutdown);
        *cell.lock() = Some(session.settings());

        session.run().unwrap();

        let captures = sink.captures.lock();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[0].samples_after, 2);
        assert_eq!(captures[0].x, vec![1, 2, 3, 5000, 6, 7]);
        assert_eq!(captures[1].samples_after, 4);
        assert_eq!(captures[1].x, vec![6, 7, 8, 6000, 9, 10, 11, 12]);
        assert_eq!(session.settings().lock().window.samples_after(), 4);
    }

    #[test]
    fn sink_error_fails_the_session() {
        let shutdown = ShutdownSignal::new();
        let source = ScriptedSource::new(stream(&[0, 0, 0, 0, 1, 5000, 2, 3, 4]), &shutdown);
        let delegate = Arc::new(RecordingDelegate::default());
        let mut session = CaptureSession::new(source, FailingSink, config())
            .unwrap()
            .with_shutdown_signal(shutdown);
        session.set_delegate(delegate.clone());

        let err = session.run().unwrap_err();
        assert!(matches!(err, CaptureError::Transport(_)));
        assert_eq!(session.state(), CaptureState::Failed(err.clone()));
        assert_eq!(*delegate.errors.lock(), vec![err]);
        assert_eq!(*delegate.emitted.lock(), 0);
        assert_eq!(session.diagnostics().captures_emitted, 0);
    }

    #[test]
    fn streaming_forwards_every_sample_in_order() {
        let config = CaptureConfiguration {
            use_mode: UseMode::Streaming,
            ..config()
        };
        let xs = [5, 6, 7, 8];
        let (sink, _, result) = run_script(config, &xs);
        assert_eq!(result.unwrap().samples_streamed, 4);
        assert_eq!(*sink.samples.lock(), stream(&xs));
        assert!(sink.captures.lock().is_empty());
    }

    #[test]
    fn calibration_failure_aborts_startup() {
        let delegate = Arc::new(RecordingDelegate::default());
        let mut session =
            CaptureSession::new(FailingSource, RecordingSink::default(), config()).unwrap();
        session.set_delegate(delegate.clone());

        let err = session.run().unwrap_err();
        assert!(matches!(err, CaptureError::CalibrationFailed(_)));
        assert!(matches!(session.state(), CaptureState::Failed(_)));
        assert!(session.baseline().is_none());
        assert!(!delegate.states.lock().contains(&CaptureState::Armed));
    }

    #[test]
    fn calibrate_stores_baseline() {
        let shutdown = ShutdownSignal::new();
        let source = ScriptedSource::new(
            vec![
                Sample::new(10, 20, 4000),
                Sample::new(12, 22, 4002),
                Sample::new(14, 24, 4004),
                Sample::new(16, 26, 4006),
            ],
            &shutdown,
        );
        let mut session = CaptureSession::new(source, RecordingSink::default(), config())
            .unwrap()
            .with_shutdown_signal(shutdown);

        let baseline = session.calibrate().unwrap();
        assert_eq!(baseline, Baseline::new(13, 23, 4003));
        assert_eq!(session.baseline(), Some(baseline));
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[test]
    fn live_reconfiguration_from_command_thread() {
        let sink = RecordingSink::default();
        let session = CaptureSession::new(
            ConstantSource(Sample::new(500, 0, 0)),
            sink.clone(),
            CaptureConfiguration {
                read_mode: ReadMode::Async,
                ..config()
            },
        )
        .unwrap();

        let (tx, rx) = mpsc::channel();
        let monitor = session.monitor();
        let commands = session.command_processor(ChannelCommands(rx)).spawn().unwrap();
        let acquisition = session.spawn().unwrap();

        // Baseline is 500 and the fixed threshold 1000 is never reached.
        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.baseline().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(monitor.baseline(), Some(Baseline::new(500, 0, 0)));
        assert_eq!(monitor.diagnostics().triggers, 0);

        // Offset 0 puts the positive bound on the baseline itself.
        tx.send("-trig offset -xO 0 -t1 0 -t2 0".into()).unwrap();
        while monitor.diagnostics().captures_emitted == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        tx.send("exit".into()).unwrap();

        commands.join().unwrap().unwrap();
        let diagnostics = acquisition.join().unwrap().unwrap();
        assert!(diagnostics.captures_emitted > 0);
        assert_eq!(diagnostics.commands_applied, 4);
        assert_eq!(monitor.state(), CaptureState::Stopped);

        let captures = sink.captures.lock();
        assert_eq!(captures[0].x, vec![500]);
        assert_eq!(captures[0].trigger_offset(), 1);
    }
}
