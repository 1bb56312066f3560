//! The analysis pipeline shared by the CLI and any other front end.
//!
//! Workflow of one run:
//! load -> validate -> per phase window: segment -> fit -> Monte-Carlo -> classify
//! -> hand the aggregated result to a [`ResultWriter`]
//!
//! The pipeline talks to its caller only through [`PipelineEvent`]s sent over
//! an mpsc channel: progress, log lines and exactly one completion. Nothing
//! escapes [`AnalysisPipeline::run`] as an error.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use chrono::Local;
use log::{debug, error, info, warn};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::data::SeriesSegmenter;
use crate::domain::{AnalysisConfig, AnalysisResult, Event, FitFailure, MinimaEstimate, ObservationTable, Status};
use crate::error::AppError;
use crate::fit::{UncertaintyEstimator, fit_parabola, kvw_minimum};
use crate::io::ResultWriter;
use crate::io::ingest::load_observations;
use crate::report;

/// Progress after the input is loaded; the windows share the rest up to 90.
const PROGRESS_LOADED: u8 = 10;
const PROGRESS_WINDOWS: usize = 80;
const PROGRESS_DONE: u8 = 100;

/// Tag attached to every log notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Session,
    Info,
    Scan,
    Ok,
    Check,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Session => "session",
            Severity::Info => "info",
            Severity::Scan => "scan",
            Severity::Ok => "ok",
            Severity::Check => "check",
            Severity::Error => "error",
        }
    }
}

impl From<Status> for Severity {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => Severity::Ok,
            Status::Check => Severity::Check,
        }
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Where the results were written.
    Output(String),
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Progress(u8),
    Log { message: String, severity: Severity },
    Completed(Completion),
}

/// Where observations come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    File(PathBuf),
    Table(ObservationTable),
}

impl DataSource {
    /// Name used in the session line and the report title.
    pub fn label(&self) -> String {
        match self {
            DataSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            DataSource::Table(table) => table.source.clone(),
        }
    }

    fn load(&self) -> Result<ObservationTable, AppError> {
        match self {
            DataSource::File(path) => load_observations(path),
            DataSource::Table(table) => Ok(table.clone()),
        }
    }
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    source: DataSource,
    writer: Box<dyn ResultWriter>,
    rng: StdRng,
    events: Sender<PipelineEvent>,
}

impl AnalysisPipeline {
    /// The Monte-Carlo RNG is seeded from `config.seed`, or from OS entropy when unset.
    pub fn new(
        config: AnalysisConfig,
        source: DataSource,
        writer: Box<dyn ResultWriter>,
        events: Sender<PipelineEvent>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            source,
            writer,
            rng,
            events,
        }
    }

    /// Replace the Monte-Carlo random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Run on a dedicated thread. The handle yields the same value as [`Self::run`].
    pub fn spawn(self) -> JoinHandle<Option<AnalysisResult>> {
        thread::spawn(move || self.run())
    }

    /// Run to completion on the current thread.
    ///
    /// Emits exactly one [`PipelineEvent::Completed`]. Returns the aggregated
    /// result unless the run failed.
    pub fn run(mut self) -> Option<AnalysisResult> {
        match self.analyze() {
            Ok(result) => {
                if let Err(err) = self.writer.write(&result) {
                    self.log(Severity::Error, format!("OUTPUT ERROR: {err}"));
                }
                self.progress(PROGRESS_DONE);
                self.log(Severity::Info, report::format_summary(&report::summarize(&result)));
                self.log(Severity::Info, report::COMPLETED_LINE.to_string());
                self.complete(Completion::Output(self.writer.destination()));
                Some(result)
            }
            Err(err) => {
                self.log(Severity::Error, report::critical_line(err.message()));
                self.complete(Completion::Error);
                None
            }
        }
    }

    fn analyze(&mut self) -> Result<AnalysisResult, AppError> {
        let label = self.source.label();
        self.log(Severity::Session, report::session_line(&label));

        self.config.validate()?;
        let table = self.source.load()?;
        self.log(Severity::Info, report::loaded_line(table.len()));
        self.progress(PROGRESS_LOADED);

        let segmenter = SeriesSegmenter::new(self.config.min_points);
        let estimator = UncertaintyEstimator::new(self.config.mc_iterations);
        let windows = [self.config.primary.clone(), self.config.secondary.clone()];

        let mut estimates = Vec::new();
        let mut dropped = Vec::new();
        for (step, window) in windows.iter().enumerate() {
            self.log(Severity::Scan, report::scanning_line(&window.label));

            for event in segmenter.segment(&table, window) {
                match analyze_event(&event, &estimator, self.config.threshold, &mut self.rng) {
                    Ok(estimate) => {
                        self.log(
                            estimate.status.into(),
                            report::event_line(&estimate.id, estimate.status),
                        );
                        estimates.push(estimate);
                    }
                    Err(reason) => {
                        debug!("dropping {} ({} samples): {reason}", event.id(), event.len());
                        dropped.push((event.id(), reason));
                    }
                }
            }

            let share = (step + 1) * PROGRESS_WINDOWS / windows.len();
            self.progress(PROGRESS_LOADED + share as u8);
        }

        Ok(AnalysisResult {
            source: label,
            created: Local::now(),
            config: self.config.clone(),
            rows: table.len(),
            estimates,
            dropped,
        })
    }

    fn log(&self, severity: Severity, message: String) {
        match severity {
            Severity::Error => error!("{message}"),
            Severity::Check => warn!("{message}"),
            _ => info!("{message}"),
        }
        self.send(PipelineEvent::Log { message, severity });
    }

    fn progress(&self, percent: u8) {
        debug!("progress {percent}%");
        self.send(PipelineEvent::Progress(percent));
    }

    fn complete(&self, completion: Completion) {
        self.send(PipelineEvent::Completed(completion));
    }

    fn send(&self, event: PipelineEvent) {
        // Nobody listening is fine; the run still finishes.
        let _ = self.events.send(event);
    }
}

/// Fit, refine and classify one event.
///
/// Fails (and the event is dropped) only when the parabolic fit fails; a KvW
/// failure is carried in the estimate and classifies it `CHECK`.
pub fn analyze_event<R: Rng + ?Sized>(
    event: &Event,
    estimator: &UncertaintyEstimator,
    threshold: f64,
    rng: &mut R,
) -> Result<MinimaEstimate, FitFailure> {
    let times = event.times();
    let mags = event.magnitudes();

    let parabola = fit_parabola(&times, &mags)?;
    let kvw = kvw_minimum(&times, &mags);
    let refined = estimator.refine(&times, &mags, &parabola, &kvw, rng);
    let status = Status::classify(refined.kvw.time(), refined.parabolic.time, threshold);

    Ok(MinimaEstimate {
        id: event.id(),
        window: event.label.clone(),
        index: event.index,
        parabolic: refined.parabolic,
        kvw: refined.kvw,
        status,
        samples: event.samples.clone(),
        curve: parabola.curve(&times),
        residuals: refined.residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    use crate::data::{SyntheticConfig, generate_light_curve};
    use crate::domain::{PhaseWindow, Sample, Timing};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Keeps every written result for inspection.
    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<AnalysisResult>>>);

    impl ResultWriter for Collect {
        fn destination(&self) -> String {
            "memory".to_string()
        }

        fn write(&mut self, result: &AnalysisResult) -> Result<(), AppError> {
            self.0
                .lock()
                .map_err(|_| AppError::internal("poisoned"))?
                .push(result.clone());
            Ok(())
        }
    }

    struct Broken;

    impl ResultWriter for Broken {
        fn destination(&self) -> String {
            "nowhere".to_string()
        }

        fn write(&mut self, _result: &AnalysisResult) -> Result<(), AppError> {
            Err(AppError::input("disk full"))
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            mc_iterations: 20,
            seed: Some(11),
            ..AnalysisConfig::default()
        }
    }

    fn run_collecting(
        config: AnalysisConfig,
        source: DataSource,
        writer: Box<dyn ResultWriter>,
    ) -> (Option<AnalysisResult>, Vec<PipelineEvent>) {
        let (tx, rx) = mpsc::channel();
        let result = AnalysisPipeline::new(config, source, writer, tx).run();
        (result, rx.try_iter().collect())
    }

    fn progress_of(events: &[PipelineEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn completions(events: &[PipelineEvent]) -> Vec<&Completion> {
        events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Completed(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn messages(events: &[PipelineEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Log { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn synthetic_curve_end_to_end() {
        init_logging();
        let curve = generate_light_curve(&SyntheticConfig::default()).unwrap();
        let sink = Collect::default();
        let (result, events) = run_collecting(
            config(),
            DataSource::Table(curve.table.clone()),
            Box::new(sink.clone()),
        );
        let result = result.unwrap();

        assert_eq!(progress_of(&events), vec![10, 50, 90, 100]);
        assert_eq!(completions(&events), vec![&Completion::Output("memory".to_string())]);
        assert!(matches!(events.last(), Some(PipelineEvent::Completed(_))));

        let ids: Vec<&str> = result.estimates.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "Primary_1",
                "Primary_2",
                "Primary_3",
                "Primary_4",
                "Secondary_1",
                "Secondary_2",
                "Secondary_3",
                "Secondary_4"
            ]
        );
        let truth = curve.primary_minima.iter().chain(&curve.secondary_minima);
        for (estimate, expected) in result.estimates.iter().zip(truth) {
            assert!(
                (estimate.parabolic.time - expected).abs() < 2e-3,
                "{}: {} vs {expected}",
                estimate.id,
                estimate.parabolic.time
            );
            assert!(estimate.parabolic.sigma >= 0.0);
            assert_eq!(estimate.status, Status::Ok, "{}", estimate.id);
            assert_eq!(estimate.residuals.len(), estimate.samples.len());
        }

        let msgs = messages(&events);
        assert_eq!(msgs[0], "SESSION START: synthetic");
        assert!(msgs.contains(&"SCANNING PRIMARY..."));
        assert!(msgs.contains(&"-> Secondary_4 (OK)"));
        assert!(msgs.contains(&report::COMPLETED_LINE));

        let written = sink.0.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].estimates.len(), 8);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let curve = generate_light_curve(&SyntheticConfig::default()).unwrap();
        let run = || {
            run_collecting(config(), DataSource::Table(curve.table.clone()), Box::new(Collect::default()))
                .0
                .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.estimates, b.estimates);
    }

    #[test]
    fn invalid_config_completes_with_error() {
        let curve = generate_light_curve(&SyntheticConfig::default()).unwrap();
        let bad = AnalysisConfig {
            primary: PhaseWindow::new("Primary", 1.05, 0.95),
            ..config()
        };
        let (result, events) = run_collecting(bad, DataSource::Table(curve.table), Box::new(Collect::default()));
        assert!(result.is_none());
        assert_eq!(completions(&events), vec![&Completion::Error]);
        assert!(messages(&events).iter().any(|m| m.starts_with("CRITICAL ERROR: ")));
        assert!(progress_of(&events).is_empty());
    }

    #[test]
    fn missing_file_completes_with_error() {
        let (result, events) = run_collecting(
            config(),
            DataSource::File(PathBuf::from("/no/such/dir/star.dat")),
            Box::new(Collect::default()),
        );
        assert!(result.is_none());
        assert_eq!(messages(&events)[0], "SESSION START: star");
        assert_eq!(completions(&events), vec![&Completion::Error]);
    }

    #[test]
    fn writer_failure_still_reports_output() {
        let curve = generate_light_curve(&SyntheticConfig::default()).unwrap();
        let (result, events) = run_collecting(config(), DataSource::Table(curve.table), Box::new(Broken));
        assert!(result.is_some());
        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::Log { severity: Severity::Error, message } if message.contains("disk full")
        )));
        assert_eq!(completions(&events), vec![&Completion::Output("nowhere".to_string())]);
    }

    #[test]
    fn window_without_samples_is_not_an_error() {
        let curve = generate_light_curve(&SyntheticConfig::default()).unwrap();
        let config = AnalysisConfig {
            secondary: PhaseWindow::new("Secondary", 0.70, 0.71),
            min_points: 100,
            ..config()
        };
        let (result, events) = run_collecting(config, DataSource::Table(curve.table), Box::new(Collect::default()));
        let result = result.unwrap();
        assert!(result.estimates.is_empty());
        assert_eq!(progress_of(&events), vec![10, 50, 90, 100]);
    }

    #[test]
    fn failed_parabola_drops_event() {
        // Three points: enough for an event, too few for a covariance.
        let samples: Vec<Sample> = [0.0, 0.01, 0.02]
            .iter()
            .map(|&t| Sample {
                time: t,
                magnitude: 10.0 + (t - 0.01) * (t - 0.01),
                phase: 1.0,
            })
            .collect();
        let event = Event {
            label: "Primary".to_string(),
            index: 1,
            samples,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = analyze_event(&event, &UncertaintyEstimator::new(5), 0.005, &mut rng).unwrap_err();
        assert_eq!(err, FitFailure::TooFewPoints { n: 3, required: 4 });
    }

    #[test]
    fn failed_kvw_is_kept_as_check() {
        // Two samples at each end: no trial centre mirrors three of them into
        // range, yet four points are plenty for the parabola.
        let times = [10.0, 10.001, 10.999, 11.0];
        let samples: Vec<Sample> = times
            .iter()
            .map(|&t| Sample {
                time: t,
                magnitude: 10.0 + (t - 10.5) * (t - 10.5),
                phase: 1.0,
            })
            .collect();
        let event = Event {
            label: "Primary".to_string(),
            index: 2,
            samples,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let estimate = analyze_event(&event, &UncertaintyEstimator::new(5), 0.005, &mut rng).unwrap();
        assert!(matches!(estimate.kvw, Timing::Failed(_)), "{:?}", estimate.kvw);
        assert_eq!(estimate.status, Status::Check);
    }

    #[test]
    fn spawned_pipeline_streams_to_receiver() {
        let curve = generate_light_curve(&SyntheticConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel();
        let handle = AnalysisPipeline::new(
            config(),
            DataSource::Table(curve.table),
            Box::new(Collect::default()),
            tx,
        )
        .spawn();

        let mut completed = 0;
        for event in rx.iter() {
            if let PipelineEvent::Completed(c) = event {
                assert_eq!(c, Completion::Output("memory".to_string()));
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
        assert!(handle.join().unwrap().is_some());
    }
}
