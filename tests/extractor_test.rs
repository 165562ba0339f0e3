use async_trait::async_trait;
use image::DynamicImage;
use image_text_reader::{
    ImageSource, OcrError, OcrProvider, Recognition, RecognitionEngine, TextExtractor,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};
use tracing_subscriber::util::SubscriberInitExt;

/// Shared log of every call the extractor makes into the capability
#[derive(Default)]
struct CallLog {
    events: Mutex<Vec<String>>,
}

impl CallLog {
    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

#[derive(Default)]
struct ScriptedProvider {
    calls: Arc<CallLog>,
    fail_create: bool,
    fail_recognize: bool,
}

struct ScriptedEngine {
    calls: Arc<CallLog>,
    fail_recognize: bool,
}

#[async_trait]
impl OcrProvider for ScriptedProvider {
    type Engine = ScriptedEngine;

    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn create(&self, language: &str) -> Result<ScriptedEngine, OcrError> {
        self.calls.record(format!("create:{}", language));
        tokio::task::yield_now().await;

        if self.fail_create {
            return Err(OcrError::EngineInitialization(
                "injected create failure".to_string(),
            ));
        }

        Ok(ScriptedEngine {
            calls: self.calls.clone(),
            fail_recognize: self.fail_recognize,
        })
    }
}

#[async_trait]
impl RecognitionEngine for ScriptedEngine {
    async fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        self.calls.record("recognize");
        tokio::task::yield_now().await;

        if self.fail_recognize {
            return Err(OcrError::Recognition("injected recognize failure".to_string()));
        }

        // Untrimmed on purpose: the extractor must return it verbatim
        Ok(Recognition {
            text: format!("  HELLO {}x{}\n", image.width(), image.height()),
            confidence: Some(0.75),
            engine: "scripted",
        })
    }

    async fn terminate(&mut self) {
        self.calls.record("terminate");
    }
}

/// In-memory log sink for a test-local subscriber
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn test_fixture_path(filename: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{}/tests/fixtures/{}", manifest_dir, filename)
}

fn fixture(filename: &str) -> ImageSource {
    ImageSource::path(test_fixture_path(filename))
}

fn extractor(provider: ScriptedProvider) -> (TextExtractor<ScriptedProvider>, Arc<CallLog>) {
    let calls = provider.calls.clone();
    (TextExtractor::new(provider), calls)
}

#[tokio::test]
async fn test_returns_engine_text_unchanged() {
    let (extractor, _) = extractor(ScriptedProvider::default());

    let text = assert_ok!(extractor.extract_text(Some(&fixture("hello.png"))).await);

    assert_eq!(text, "  HELLO 320x136\n");
}

#[tokio::test]
async fn test_defaults_to_sample_image() {
    let (extractor, _) = extractor(ScriptedProvider::default());

    let text = assert_ok!(extractor.extract_text(None).await);

    assert!(!text.is_empty());
    assert_eq!(text, "  HELLO 608x136\n");
}

#[tokio::test]
async fn test_successful_call_runs_full_lifecycle() {
    let (extractor, calls) = extractor(ScriptedProvider::default());

    assert_ok!(extractor.extract_text(Some(&fixture("hello.png"))).await);

    assert_eq!(calls.events(), vec!["create:eng", "recognize", "terminate"]);
}

#[tokio::test]
async fn test_terminates_once_when_recognition_fails() {
    let (extractor, calls) = extractor(ScriptedProvider {
        fail_recognize: true,
        ..Default::default()
    });

    let err = assert_err!(extractor.extract_text(Some(&fixture("hello.png"))).await);

    assert!(matches!(err, OcrError::Recognition(_)));
    // Recorded before the error reached us
    assert_eq!(calls.events(), vec!["create:eng", "recognize", "terminate"]);
}

#[tokio::test]
async fn test_creation_failure_skips_recognize_and_terminate() {
    let (extractor, calls) = extractor(ScriptedProvider {
        fail_create: true,
        ..Default::default()
    });

    let err = assert_err!(extractor.extract_text(Some(&fixture("hello.png"))).await);

    assert!(matches!(err, OcrError::EngineInitialization(_)));
    assert_eq!(calls.events(), vec!["create:eng"]);
}

#[tokio::test]
async fn test_unloadable_image_creates_no_engine() {
    let (extractor, calls) = extractor(ScriptedProvider::default());

    let err = assert_err!(
        extractor
            .extract_text(Some(&fixture("does_not_exist.png")))
            .await
    );

    assert!(matches!(err, OcrError::ImageLoad(_)));
    assert!(calls.events().is_empty());
}

#[tokio::test]
async fn test_each_call_owns_its_engine() {
    let (extractor, calls) = extractor(ScriptedProvider::default());

    assert_ok!(extractor.extract_text(Some(&fixture("hello.png"))).await);
    assert_ok!(extractor.extract_text(Some(&fixture("rust_42.png"))).await);

    assert_eq!(calls.count("create:eng"), 2);
    assert_eq!(calls.count("terminate"), 2);
}

#[tokio::test]
async fn test_concurrent_calls_get_their_own_results() {
    let (extractor, calls) = extractor(ScriptedProvider::default());
    let hello = fixture("hello.png");
    let rust = fixture("rust_42.png");

    let (a, b) = tokio::join!(
        extractor.extract_text(Some(&hello)),
        extractor.extract_text(Some(&rust)),
    );

    assert_eq!(assert_ok!(a), "  HELLO 320x136\n");
    assert_eq!(assert_ok!(b), "  HELLO 416x136\n");
    assert_eq!(calls.count("terminate"), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_tasks_get_their_own_results() {
    let (extractor, calls) = extractor(ScriptedProvider::default());
    let extractor = Arc::new(extractor);

    let handles: Vec<_> = [("hello.png", 320), ("rust_42.png", 416), ("hello.png", 320)]
        .into_iter()
        .map(|(name, width)| {
            let extractor = extractor.clone();
            let image = fixture(name);
            tokio::spawn(async move {
                let text = extractor.extract_text(Some(&image)).await;
                (text, width)
            })
        })
        .collect();

    for handle in handles {
        let (text, width) = handle.await.unwrap();
        assert_eq!(assert_ok!(text), format!("  HELLO {}x136\n", width));
    }

    assert_eq!(calls.count("create:eng"), 3);
    assert_eq!(calls.count("terminate"), 3);
}

#[tokio::test]
async fn test_recognize_keeps_metadata() {
    let (extractor, _) = extractor(ScriptedProvider::default());

    let recognition = assert_ok!(extractor.recognize(Some(&fixture("hello.png"))).await);

    assert_eq!(recognition.engine, "scripted");
    assert_eq!(recognition.confidence, Some(0.75));
    assert_eq!(recognition.text, "  HELLO 320x136\n");
}

#[tokio::test]
async fn test_in_memory_image() {
    let (extractor, _) = extractor(ScriptedProvider::default());
    let bytes = std::fs::read(test_fixture_path("rust_42.png")).unwrap();

    let text = assert_ok!(extractor.extract_text(Some(&ImageSource::bytes(bytes))).await);

    assert_eq!(text, "  HELLO 416x136\n");
}

#[tokio::test]
async fn test_image_copied_to_temp_file() {
    let (extractor, _) = extractor(ScriptedProvider::default());
    let mut temp_file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    std::io::copy(
        &mut std::fs::File::open(test_fixture_path("hello.png")).unwrap(),
        &mut temp_file,
    )
    .unwrap();

    let text = assert_ok!(
        extractor
            .extract_text(Some(&ImageSource::path(temp_file.path())))
            .await
    );

    assert_eq!(text, "  HELLO 320x136\n");
}

#[tokio::test]
async fn test_language_is_passed_to_provider() {
    let (extractor, calls) = extractor(ScriptedProvider::default());
    let extractor = extractor.with_language("deu");

    assert_ok!(extractor.extract_text(None).await);

    assert_eq!(calls.events()[0], "create:deu");
}

#[tokio::test]
async fn test_recognized_text_is_logged() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let _guard = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish()
        .set_default();
    let (extractor, _) = extractor(ScriptedProvider::default());

    assert_ok!(extractor.extract_text(Some(&fixture("hello.png"))).await);

    let logged = logs.contents();
    assert!(logged.contains("HELLO 320x136"), "Missing text in logs: {}", logged);
    assert!(logged.contains("scripted engine terminated"), "Logs: {}", logged);
}

#[tokio::test]
async fn test_failed_recognition_logs_no_text() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let _guard = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish()
        .set_default();
    let (extractor, _) = extractor(ScriptedProvider {
        fail_recognize: true,
        ..Default::default()
    });

    assert_err!(extractor.extract_text(Some(&fixture("hello.png"))).await);

    assert!(!logs.contents().contains("HELLO"));
}
