//! The resumable generate-or-skip loop over a prompt list.
//!
//! Completion state lives only in the artifact store: an ordinal whose file
//! exists is skipped, everything else is attempted once per run. Failed
//! ordinals leave no file behind and are picked up again by the next run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::BatchConfig;
use crate::error::ImageError;
use crate::output::{artifact_filename, artifact_path, encode_jpeg};
use crate::ports::{ArtifactStore, ImageGenerator, ImageRequest, Pacer};

/// How many prompt characters the progress line shows.
const PROMPT_PREVIEW_CHARS: usize = 50;

/// Result of one call to the image service, after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// JPEG bytes ready to persist.
    Success(Vec<u8>),
    /// The service answered without an image.
    EmptyResponse {
        /// Block or finish reason reported by the service, if any.
        reason: Option<String>,
    },
    /// Transport, API or decode failure.
    TransientError {
        /// Display text of the underlying error.
        message: String,
    },
}

/// Final state of one ordinal within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStatus {
    /// Artifact already existed; nothing was requested.
    Skipped,
    /// Artifact was generated and stored.
    Completed,
    /// The service returned no image.
    FailedEmpty,
    /// The attempt failed.
    FailedError {
        /// Error text as logged.
        message: String,
        /// Whether the error looked like an HTTP 429.
        rate_limited: bool,
    },
}

/// One row of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptResult {
    /// 1-based position in the prompt list.
    pub ordinal: usize,
    /// Artifact path for this ordinal.
    pub path: PathBuf,
    /// What happened.
    pub status: PromptStatus,
}

/// Per-ordinal outcomes of a run, in ordinal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per prompt.
    pub results: Vec<PromptResult>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&PromptStatus) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.status)).count()
    }

    /// Ordinals skipped because their artifact existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PromptStatus::Skipped))
    }

    /// Ordinals generated in this run.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(|s| matches!(s, PromptStatus::Completed))
    }

    /// Ordinals still pending after this run.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PromptStatus::FailedEmpty | PromptStatus::FailedError { .. }))
    }
}

/// Whether an error message signals rate limiting.
#[must_use]
pub fn is_rate_limited(message: &str) -> bool {
    message.contains("429")
}

/// Drives a prompt list through the image service, one ordinal at a time.
pub struct BatchGenerator<'a> {
    config: &'a BatchConfig,
    generator: &'a dyn ImageGenerator,
    store: &'a dyn ArtifactStore,
    pacer: &'a dyn Pacer,
}

impl<'a> BatchGenerator<'a> {
    /// Assemble a batch over the given ports.
    #[must_use]
    pub fn new(
        config: &'a BatchConfig,
        generator: &'a dyn ImageGenerator,
        store: &'a dyn ArtifactStore,
        pacer: &'a dyn Pacer,
    ) -> Self {
        Self { config, generator, store, pacer }
    }

    /// Attempt every prompt that has no artifact yet.
    ///
    /// Per-prompt failures are logged and recorded in the report; they never
    /// abort the run. The pause owed by an attempt is taken right before the
    /// next service call, so skips cost nothing and the last attempt is not
    /// followed by a pause.
    ///
    /// # Errors
    ///
    /// Returns an error only if the output directory cannot be created.
    pub async fn run(&self, prompts: &[String]) -> Result<BatchReport, ImageError> {
        self.store.ensure_dir(&self.config.output_dir)?;
        tracing::info!("Starting image generation...");

        let total = prompts.len();
        let mut owed: Option<Duration> = None;
        let mut report = BatchReport { results: Vec::with_capacity(total) };

        for (index, prompt) in prompts.iter().enumerate() {
            let ordinal = index + 1;
            let filename = artifact_filename(ordinal);
            let path = artifact_path(&self.config.output_dir, ordinal);

            if self.store.exists(&path) {
                tracing::info!("   [SKIP] {filename} already exists.");
                report.results.push(PromptResult { ordinal, path, status: PromptStatus::Skipped });
                continue;
            }

            if let Some(pause) = owed.take() {
                tracing::debug!("Pausing {}s before {filename}", pause.as_secs_f64());
                self.pacer.pause(pause).await;
            }

            tracing::info!("[{ordinal}/{total}] Generating: {}...", preview(prompt));
            let status = self.attempt(prompt, &path, &filename).await;
            owed = Some(self.pause_after(&status));
            report.results.push(PromptResult { ordinal, path, status });
        }

        tracing::info!(
            "All prompts processed! ({} generated, {} skipped, {} pending)",
            report.completed(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Request one image for `prompt` and decode it into JPEG bytes.
    pub async fn generate(&self, prompt: &str) -> GenerationOutcome {
        let request = ImageRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            candidate_count: 1,
            safety_settings: self.config.safety.settings(),
        };

        let response = match self.generator.generate(&request).await {
            Ok(response) => response,
            Err(e) => return GenerationOutcome::TransientError { message: e.to_string() },
        };

        let Some(image) = response.first_image() else {
            return GenerationOutcome::EmptyResponse { reason: response.block_reason.clone() };
        };
        tracing::debug!("Received {} bytes of {}", image.data.len(), image.mime_type);

        match encode_jpeg(&image.data) {
            Ok(jpeg) => GenerationOutcome::Success(jpeg),
            Err(e) => GenerationOutcome::TransientError { message: e.to_string() },
        }
    }

    async fn attempt(&self, prompt: &str, path: &Path, filename: &str) -> PromptStatus {
        match self.generate(prompt).await {
            GenerationOutcome::Success(jpeg) => match self.store.write(path, &jpeg) {
                Ok(()) => {
                    tracing::info!("   Saved {filename}");
                    PromptStatus::Completed
                }
                Err(e) => failed(filename, e.to_string()),
            },
            GenerationOutcome::EmptyResponse { reason } => {
                match reason {
                    Some(reason) => {
                        tracing::warn!("   API returned no image for {filename} ({reason})");
                    }
                    None => tracing::warn!("   API returned no image for {filename}"),
                }
                PromptStatus::FailedEmpty
            }
            GenerationOutcome::TransientError { message } => failed(filename, message),
        }
    }

    fn pause_after(&self, status: &PromptStatus) -> Duration {
        match status {
            PromptStatus::FailedError { rate_limited: true, .. } => self.config.rate_limit_delay,
            _ => self.config.delay,
        }
    }
}

fn failed(filename: &str, message: String) -> PromptStatus {
    tracing::error!("   Error on {filename}: {message}");
    let rate_limited = is_rate_limited(&message);
    if rate_limited {
        tracing::warn!("   Rate limit hit.");
    }
    PromptStatus::FailedError { message, rate_limited }
}

fn preview(prompt: &str) -> String {
    prompt.chars().take(PROMPT_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use image::{ColorType, DynamicImage, ImageFormat, Rgba, RgbaImage};

    use super::*;
    use crate::ports::image_generator::{GenerateFuture, GeneratedImage, ImageResponse};
    use crate::ports::pacer::PauseFuture;
    use crate::safety::{HarmBlockThreshold, SafetyPolicy};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Call(String),
        Pause(Duration),
    }

    type Journal = Arc<Mutex<Vec<Event>>>;

    /// Answers by prompt text: `empty`, `rate-limited`, `boom` and `corrupt`
    /// are failures, anything else gets a translucent PNG.
    struct ScriptedGenerator {
        journal: Journal,
        requests: Mutex<Vec<ImageRequest>>,
        fail_once: Mutex<HashSet<String>>,
    }

    impl ScriptedGenerator {
        fn new(journal: &Journal) -> Self {
            Self {
                journal: Arc::clone(journal),
                requests: Mutex::new(Vec::new()),
                fail_once: Mutex::new(HashSet::new()),
            }
        }

        fn failing_once(journal: &Journal, prompt: &str) -> Self {
            let generator = Self::new(journal);
            generator.fail_once.lock().unwrap().insert(prompt.to_string());
            generator
        }
    }

    fn png() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([200, 100, 0, 90])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn image(data: Vec<u8>) -> ImageResponse {
        ImageResponse {
            images: vec![GeneratedImage { data, mime_type: "image/png".into() }],
            block_reason: None,
        }
    }

    impl ImageGenerator for ScriptedGenerator {
        fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
            self.journal.lock().unwrap().push(Event::Call(request.prompt.clone()));
            self.requests.lock().unwrap().push(request.clone());
            let once = self.fail_once.lock().unwrap().remove(&request.prompt);
            let result = match request.prompt.as_str() {
                _ if once => Err(ImageError::Api { status: 503, message: "overloaded".into() }),
                "empty" => Ok(ImageResponse {
                    images: vec![],
                    block_reason: Some("IMAGE_SAFETY".into()),
                }),
                "rate-limited" => Err(ImageError::Api {
                    status: 429,
                    message: "RESOURCE_EXHAUSTED".into(),
                }),
                "boom" => Err(ImageError::Api { status: 500, message: "internal".into() }),
                "corrupt" => Ok(image(b"not an image".to_vec())),
                _ => Ok(image(png())),
            };
            Box::pin(async move { result })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
        dirs: Mutex<Vec<PathBuf>>,
        reject_writes: bool,
    }

    impl MemoryStore {
        fn with_file(path: &str, data: &[u8]) -> Self {
            let store = Self::default();
            store.files.lock().unwrap().insert(PathBuf::from(path), data.to_vec());
            store
        }

        fn file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }

        fn names(&self) -> Vec<PathBuf> {
            let mut names: Vec<_> = self.files.lock().unwrap().keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl ArtifactStore for MemoryStore {
        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn ensure_dir(&self, dir: &Path) -> Result<(), ImageError> {
            self.dirs.lock().unwrap().push(dir.to_path_buf());
            Ok(())
        }

        fn write(&self, path: &Path, data: &[u8]) -> Result<(), ImageError> {
            if self.reject_writes {
                return Err(ImageError::Io(std::io::Error::other("disk full")));
            }
            self.files.lock().unwrap().insert(path.to_path_buf(), data.to_vec());
            Ok(())
        }
    }

    struct JournalPacer(Journal);

    impl Pacer for JournalPacer {
        fn pause(&self, duration: Duration) -> PauseFuture<'_> {
            self.0.lock().unwrap().push(Event::Pause(duration));
            Box::pin(async {})
        }
    }

    const DELAY: Duration = Duration::from_secs(10);
    const BACKOFF: Duration = Duration::from_secs(30);

    fn config() -> BatchConfig {
        BatchConfig {
            model: "gemini-2.5-flash-image".into(),
            prompts_path: PathBuf::from("prompts.txt"),
            output_dir: PathBuf::from("fakes"),
            safety: SafetyPolicy::default(),
            delay: DELAY,
            rate_limit_delay: BACKOFF,
        }
    }

    fn prompts(lines: &[&str]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    fn call(prompt: &str) -> Event {
        Event::Call(prompt.to_string())
    }

    async fn run(
        generator: &ScriptedGenerator,
        store: &MemoryStore,
        journal: &Journal,
        lines: &[&str],
    ) -> BatchReport {
        let config = config();
        let pacer = JournalPacer(Arc::clone(journal));
        BatchGenerator::new(&config, generator, store, &pacer).run(&prompts(lines)).await.unwrap()
    }

    #[tokio::test]
    async fn fresh_run_creates_files_in_order_with_pauses_between() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        let report = run(&generator, &store, &journal, &["a", "b", "c"]).await;

        assert_eq!(
            store.names(),
            vec![
                PathBuf::from("fakes/fake001.jpg"),
                PathBuf::from("fakes/fake002.jpg"),
                PathBuf::from("fakes/fake003.jpg"),
            ]
        );
        assert_eq!(
            *journal.lock().unwrap(),
            vec![call("a"), Event::Pause(DELAY), call("b"), Event::Pause(DELAY), call("c")]
        );
        assert_eq!(report.completed(), 3);
        assert_eq!(*store.dirs.lock().unwrap(), vec![PathBuf::from("fakes")]);
    }

    #[tokio::test]
    async fn existing_artifact_is_skipped_without_delay_and_untouched() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::with_file("fakes/fake002.jpg", b"handmade");

        let report = run(&generator, &store, &journal, &["a", "b", "c"]).await;

        assert_eq!(*journal.lock().unwrap(), vec![call("a"), Event::Pause(DELAY), call("c")]);
        assert_eq!(store.file("fakes/fake002.jpg").unwrap(), b"handmade");
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.results[1].status, PromptStatus::Skipped);
        assert_eq!(report.completed(), 2);
    }

    #[tokio::test]
    async fn leading_skips_cost_no_pause() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::with_file("fakes/fake001.jpg", b"x");

        run(&generator, &store, &journal, &["a", "b"]).await;

        assert_eq!(*journal.lock().unwrap(), vec![call("b")]);
    }

    #[tokio::test]
    async fn second_run_makes_no_calls() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();
        run(&generator, &store, &journal, &["a", "b", "c"]).await;
        journal.lock().unwrap().clear();

        let report = run(&generator, &store, &journal, &["a", "b", "c"]).await;

        assert!(journal.lock().unwrap().is_empty());
        assert_eq!(report.skipped(), 3);
        assert_eq!(generator.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rate_limit_leaves_no_file_and_backs_off_longer() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        let report = run(&generator, &store, &journal, &["rate-limited", "b"]).await;

        assert!(!store.exists(Path::new("fakes/fake001.jpg")));
        assert!(store.exists(Path::new("fakes/fake002.jpg")));
        assert_eq!(
            *journal.lock().unwrap(),
            vec![call("rate-limited"), Event::Pause(BACKOFF), call("b")]
        );
        assert!(BACKOFF > DELAY);
        match &report.results[0].status {
            PromptStatus::FailedError { message, rate_limited } => {
                assert!(rate_limited);
                assert!(message.contains("429"));
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_errors_use_standard_delay() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        let report = run(&generator, &store, &journal, &["boom", "b"]).await;

        assert_eq!(*journal.lock().unwrap(), vec![call("boom"), Event::Pause(DELAY), call("b")]);
        assert!(matches!(
            report.results[0].status,
            PromptStatus::FailedError { rate_limited: false, .. }
        ));
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn empty_response_leaves_ordinal_pending() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        let report = run(&generator, &store, &journal, &["empty", "b"]).await;

        assert!(!store.exists(Path::new("fakes/fake001.jpg")));
        assert_eq!(report.results[0].status, PromptStatus::FailedEmpty);
        assert_eq!(*journal.lock().unwrap(), vec![call("empty"), Event::Pause(DELAY), call("b")]);
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_failure() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        let report = run(&generator, &store, &journal, &["corrupt"]).await;

        assert!(store.names().is_empty());
        match &report.results[0].status {
            PromptStatus::FailedError { message, rate_limited: false } => {
                assert!(message.contains("Failed to decode image"));
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_failure_is_a_failure() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore { reject_writes: true, ..MemoryStore::default() };

        let report = run(&generator, &store, &journal, &["a"]).await;

        assert!(store.names().is_empty());
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn failed_ordinal_is_retried_on_next_run() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::failing_once(&journal, "b");
        let store = MemoryStore::default();

        let first = run(&generator, &store, &journal, &["a", "b", "c"]).await;
        assert_eq!(first.failed(), 1);
        assert!(!store.exists(Path::new("fakes/fake002.jpg")));
        journal.lock().unwrap().clear();

        let second = run(&generator, &store, &journal, &["a", "b", "c"]).await;

        assert_eq!(*journal.lock().unwrap(), vec![call("b")]);
        assert_eq!(second.results[1].status, PromptStatus::Completed);
        assert_eq!(store.names().len(), 3);
    }

    #[tokio::test]
    async fn saved_artifact_is_rgb_jpeg() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        run(&generator, &store, &journal, &["a"]).await;

        let bytes = store.file("fakes/fake001.jpg").unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&bytes).unwrap().color(), ColorType::Rgb8);
    }

    #[tokio::test]
    async fn request_asks_for_one_candidate_with_permissive_safety() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        run(&generator, &store, &journal, &["a lighthouse"]).await;

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-2.5-flash-image");
        assert_eq!(requests[0].prompt, "a lighthouse");
        assert_eq!(requests[0].candidate_count, 1);
        assert_eq!(requests[0].safety_settings.len(), 4);
        assert!(requests[0]
            .safety_settings
            .iter()
            .all(|s| s.threshold == HarmBlockThreshold::BlockNone));
    }

    #[tokio::test]
    async fn empty_prompt_list_still_finishes() {
        let journal = Journal::default();
        let generator = ScriptedGenerator::new(&journal);
        let store = MemoryStore::default();

        let report = run(&generator, &store, &journal, &[]).await;

        assert!(report.results.is_empty());
        assert!(journal.lock().unwrap().is_empty());
    }

    #[test]
    fn rate_limit_detection_is_substring_match() {
        assert!(is_rate_limited("API error (429): RESOURCE_EXHAUSTED"));
        assert!(is_rate_limited("status 429"));
        assert!(!is_rate_limited("API error (503): overloaded"));
        assert!(!is_rate_limited("Too Many Requests"));
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let long = "é".repeat(80);
        assert_eq!(preview(&long).chars().count(), PROMPT_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
